//! Scheduling core: normalization, overlap rules and derived state.
//!
//! Everything here is pure. Persistence backends call into [`rules`] while
//! holding their own lock so that each check and the write that follows it
//! happen atomically.

pub mod clock;
pub mod inventory;
pub mod projection;
pub mod rules;
pub mod time;

pub use clock::{Clock, FixedClock, SystemClock};
pub use time::{normalize, TimeRange};
