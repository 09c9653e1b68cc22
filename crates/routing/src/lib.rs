//! Agent routing
//!
//! Picks the agent best placed to handle a scored lead. Four strategies
//! share the same three sub-scores (performance, specialization fit and
//! spare capacity, each on a 0-100 scale):
//!
//! - `RoundRobin`: least relatively loaded agent
//! - `PerformanceBased`: best track record
//! - `SpecializationMatch`: best fit for this lead
//! - `Hybrid`: priority-weighted blend of all three
//!
//! Routing never fails towards the caller: with no eligible agent the
//! explicit `unassigned-queue` sentinel is returned.

pub mod criteria;
pub mod priority;
pub mod router;

pub use criteria::{capacity_score, performance_score, specialization_score, Specialization};
pub use priority::{lead_priority, sla_minutes};
pub use router::AgentRouter;
