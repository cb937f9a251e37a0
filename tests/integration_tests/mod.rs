//! Integration tests module
//!
//! End-to-end tests for the eventline system, including:
//! - Queue → consumer → pipeline → nutrition store
//! - Breaking topic and volume burst detection over synthetic timelines
//! - Error handling and shutdown scenarios

pub mod consumer_test;
pub mod detection_test;
pub mod error_scenarios;
