//! Time sources and timers for the engagement engine
//!
//! Everything in the engine runs on a single cooperative event loop. Delayed
//! and recurring work is expressed as timers in a [`TimerQueue`], which the
//! owner drains against a [`Clock`] reading. Nothing here sleeps or blocks;
//! a driver (the demo binary, or a test advancing a [`ManualClock`]) decides
//! when time moves.
//!
//! # Architecture
//!
//! - [`Clock`] abstracts "milliseconds since mount" so tests run on virtual time
//! - [`TimerQueue`] keeps single-fire and recurring timers sorted by deadline
//! - [`CancellableSchedule`] owns at most one outstanding timer of a class and
//!   always cancels the previous one before issuing a new one

pub mod clock;
pub mod events;
pub mod schedule;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{FiredTimer, TimerId, TimerQueue};
pub use schedule::CancellableSchedule;
