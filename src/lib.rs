pub mod ci;
pub mod config;
pub mod errors;
pub mod logging;

pub use ci::models::{BuildState, ProjectSpec, TriggerOutcome};
pub use config::{Settings, SharedSecret};
