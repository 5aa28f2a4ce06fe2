//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by the HTTP adapter into the application
//! - Outbound: Called by application into infrastructure (store, classifier)

pub mod inbound;
pub mod outbound;

pub use inbound::InputPort;
pub use outbound::{ClassifierPort, EntryRepoPort, StatsRepoPort};
