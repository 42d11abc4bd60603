//! Scenario tests for the calibration chain

#[path = "../helpers.rs"]
mod helpers;

mod failure_handling;
#[cfg(unix)]
mod full_chain;
mod success_chain;
