pub mod acquisition;
pub mod messages;
pub mod orchestrator;
