// Animated assistant engagement engine
// Lifecycle state machine, sprite animation scheduler and sound engine,
// driven by a single cooperative clock

pub mod animation;
pub mod assets;
pub mod assistant;
pub mod cli;
pub mod command;
pub mod config;
pub mod lifecycle;
pub mod logging;
pub mod prefs;
pub mod propfile;
pub mod sound;
pub mod time;

pub use assistant::{Assistant, AssistantError, PresentationState};
pub use cli::Cli;
pub use config::Options;
pub use lifecycle::{LifecycleState, Tip};
pub use logging::LogLevel;
