//! Integration test entry point.
//!
//! One binary for the whole suite so the mock hardware module is shared.

mod command_surface_tests;
mod mock_hw;
mod property_tests;
mod station_tests;
