//! In-memory session store implementation for the Foreman assistant
//!
//! This crate provides an in-memory implementation of the session
//! repository interface defined in the foreman-core crate. It is primarily
//! useful for development, testing, and single-process deployments where
//! persistence across restarts is not required.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub mod repositories;
pub use repositories::InMemoryFlowSessionRepository;

use foreman_core::{domain::repository::FlowSessionRepository, FlowSession};

/// Provider for in-memory session store repositories
///
/// Owns the shared session map so multiple repository handles observe the
/// same state, matching how a process-wide store behaves.
pub struct InMemoryStateStoreProvider {
    // Shared storage for flow sessions, keyed by owner
    sessions: Arc<RwLock<HashMap<String, FlowSession>>>,
}

impl InMemoryStateStoreProvider {
    /// Create a new in-memory state store provider
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a repository handle backed by this provider's shared map
    pub fn create_repository(&self) -> Arc<dyn FlowSessionRepository> {
        Arc::new(InMemoryFlowSessionRepository::new(self.sessions.clone()))
    }
}

impl Default for InMemoryStateStoreProvider {
    fn default() -> Self {
        Self::new()
    }
}
