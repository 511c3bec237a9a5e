//! Assistant lifecycle
//!
//! The imp moves between six engagement phases. Inactivity drives it from
//! `Idle` into `Mischief` and eventually through `Departing` into `Dormant`;
//! tips pull it into `Active`; dismissing or hiding sends it through a
//! farewell into a minimized `Idle`.
//!
//! # Design Notes
//!
//! Every delay that waits for an animation uses the catalog's computed
//! duration of that animation, so an edited animation can never be cut off
//! by its own transition. Timers are plain messages posted to the machine's
//! own queue; the handler decides at fire time whether the message still
//! applies.


pub mod machine;
pub mod state;

pub use machine::{LifecycleEffect, LifecycleStateMachine, LifecycleTimings};
pub use state::{LifecycleState, SeenTips, Tip};
