pub mod executor;
pub mod interfaces;
pub mod models;
pub mod orchestrator;
pub mod rules;
