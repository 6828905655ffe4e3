//! src/lib.rs
// make public to other binaries (main, test)
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod otp_cache;
pub mod routes;
pub mod startup;
pub mod sweeper;
pub mod telemetry;
