//! Market segment labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Market / persona classification selecting a scoring model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    TechHub,
    EnergySector,
    Military,
    Luxury,
    FirstTimeBuyer,
    InvestmentFocused,
    #[default]
    General,
}

impl Segment {
    pub const ALL: [Segment; 7] = [
        Segment::TechHub,
        Segment::EnergySector,
        Segment::Military,
        Segment::Luxury,
        Segment::FirstTimeBuyer,
        Segment::InvestmentFocused,
        Segment::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::TechHub => "tech_hub",
            Segment::EnergySector => "energy_sector",
            Segment::Military => "military",
            Segment::Luxury => "luxury",
            Segment::FirstTimeBuyer => "first_time_buyer",
            Segment::InvestmentFocused => "investment_focused",
            Segment::General => "general",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Segment::TechHub => "Tech Hub",
            Segment::EnergySector => "Energy Sector",
            Segment::Military => "Military",
            Segment::Luxury => "Luxury",
            Segment::FirstTimeBuyer => "First-Time Buyer",
            Segment::InvestmentFocused => "Investment Focused",
            Segment::General => "General",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Segment::ALL
            .iter()
            .copied()
            .find(|seg| seg.as_str() == s)
            .ok_or_else(|| format!("unknown segment '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_roundtrip_names() {
        for seg in Segment::ALL {
            assert_eq!(seg.as_str().parse::<Segment>().unwrap(), seg);
        }
        assert!("mars_colony".parse::<Segment>().is_err());
    }
}
