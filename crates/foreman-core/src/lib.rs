//!
//! Foreman Core - Conversational flow engine for the Foreman assistant
//!
//! This crate defines the per-user wizard state machine, domain models, and
//! persistence interfaces that drive every multi-turn chat interaction
//! (work-order creation, facility registration, reminder creation). It is
//! the foundation for the state-store crates in this workspace.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - core business models, entities, and rules
pub mod domain;

/// Application services - core application logic
pub mod application;

/// Core types and traits
pub mod types;

/// Error types
pub mod error;

// Re-export key types
pub use error::FlowError;
pub use types::{flow_data, DataPacket, FlowData};

// Re-export main API types for easy use
pub use application::flow_engine_service::{
    DomainEventHandler, FlowEngine, FlowEngineConfig, LoggingEventHandler, NoopEventHandler,
};
pub use application::progress::{render_progress, ProgressReport};
pub use application::step_validator::{StepValidator, StepValidatorRegistry, ValidationOutcome};
pub use domain::events::DomainEvent;
pub use domain::flow_config::{FlowConfig, FlowType};
pub use domain::flow_session::{FlowSession, FlowSessionStatus, FlowStep, HistoryEntry, OwnerId};
pub use domain::repository::{Clock, FlowSessionRepository, SystemClock};
