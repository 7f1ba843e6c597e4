//! Run coordination

pub mod runner;

pub use runner::{DeployRunner, RunReport, DEPLOYED_REACTION};
