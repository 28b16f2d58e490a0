// Main library entry point for Locust Lens.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
