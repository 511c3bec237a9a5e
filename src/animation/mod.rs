//! Sprite animation
//!
//! Static animation catalogs and a generic, frame-accurate scheduler that
//! plays them. The scheduler knows nothing about the assistant; any
//! iconography with a catalog can use it.
//!
//! # Architecture
//!
//! - [`AnimationCatalog`]: named [`AnimationDefinition`]s of one sprite, with
//!   duration queries and lookup-with-fallback
//! - [`AnimationLibrary`]: sprite name to catalog
//! - [`Timeline`]: lazy stream of timed frames for one playback
//! - [`AnimationScheduler`]: paces a timeline against the clock, with
//!   pause/resume and reduced motion
//! - [`imp`]: the built-in assistant sprite data

pub mod catalog;
pub mod imp;
pub mod scheduler;
pub mod timeline;
pub mod types;

pub use catalog::{AnimationCatalog, AnimationLibrary, CatalogBuilder};
pub use scheduler::{AnimState, AnimationScheduler, FrameChange, PlayOptions};
pub use timeline::{TimedFrame, Timeline};
pub use types::{AnimationDefinition, AnimationError, AnimationResult, Frame};
