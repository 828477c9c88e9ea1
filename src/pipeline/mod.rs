pub mod job_runner;
pub mod orchestrator;
pub mod registry;
