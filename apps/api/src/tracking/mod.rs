//! Cross-context application tracking.
//!
//! Per tab: Idle (absent from the table) → PendingNavigation → AwaitingUserAnswer
//! → Resolved (removed from the table). Removal is the only resolution guard, so
//! a second answer for the same tab finds nothing and does nothing.

pub mod handlers;
pub mod table;
pub mod worker;
