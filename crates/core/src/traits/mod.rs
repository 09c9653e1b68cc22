//! Collaborator interfaces
//!
//! The scoring core consumes these and never implements persistence or
//! transport itself. Implementations can be swapped without code changes
//! and mocked in tests.
//!
//! ```text
//! Stores:
//!   - LeadStore: LeadRecord by id
//!   - ConversationStore: ordered ConversationTurn history
//!
//! Agents:
//!   - AgentDirectory: AgentProfile snapshots + post-assignment callback
//!
//! Caching:
//!   - KvCache: byte-valued key/value substrate with TTL and prefix delete
//!
//! Time:
//!   - Clock: injectable "now" for deterministic extraction
//! ```

mod cache;
mod clock;
mod stores;

pub use cache::KvCache;
pub use clock::{Clock, FixedClock, SystemClock};
pub use stores::{AgentDirectory, ConversationStore, LeadStore};
