//! Core library for the Jobtrail job-application tracker: the application
//! lifecycle state machine, interview-round scheduling, and derived-activity
//! recomputation, plus the configuration and telemetry shell the service
//! binary runs on.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod telemetry;
