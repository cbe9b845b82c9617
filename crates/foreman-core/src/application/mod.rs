//! Application services - core application logic

/// The flow engine service
pub mod flow_engine_service;

/// Deterministic progress rendering
pub mod progress;

/// Pure step validation registry
pub mod step_validator;
