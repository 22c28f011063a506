//! Application layer: port traits and the station service.

pub mod ports;
pub mod service;
