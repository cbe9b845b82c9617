use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use async_trait::async_trait;
use foreman_core::{
    domain::flow_session::{FlowSession, OwnerId},
    domain::repository::FlowSessionRepository,
    FlowError,
};

/// In-memory implementation of the FlowSessionRepository
///
/// One record per owner; the compare-and-swap branch of `upsert` holds the
/// write lock for the whole check-then-store so racing writers for the same
/// owner cannot both win.
pub struct InMemoryFlowSessionRepository {
    sessions: Arc<RwLock<HashMap<String, FlowSession>>>,
}

impl InMemoryFlowSessionRepository {
    /// Create a new in-memory flow session repository over a shared map
    pub fn new(sessions: Arc<RwLock<HashMap<String, FlowSession>>>) -> Self {
        Self { sessions }
    }

    /// Create a repository with its own private map
    pub fn new_private() -> Self {
        Self::new(Arc::new(RwLock::new(HashMap::new())))
    }
}

#[async_trait]
impl FlowSessionRepository for InMemoryFlowSessionRepository {
    async fn find_by_owner(&self, owner: &OwnerId) -> Result<Option<FlowSession>, FlowError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&owner.0).cloned())
    }

    async fn upsert(
        &self,
        session: &FlowSession,
        expected_version: Option<u64>,
    ) -> Result<(), FlowError> {
        let mut sessions = self.sessions.write().await;

        if let Some(expected) = expected_version {
            match sessions.get(&session.owner_id.0) {
                Some(stored) if stored.version == expected => {}
                Some(stored) => {
                    debug!(
                        owner = %session.owner_id,
                        stored_version = stored.version,
                        expected,
                        "rejecting stale session write"
                    );
                    return Err(FlowError::SessionConflict(session.owner_id.0.clone()));
                }
                None => {
                    return Err(FlowError::SessionConflict(session.owner_id.0.clone()));
                }
            }
        }

        sessions.insert(session.owner_id.0.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, owner: &OwnerId) -> Result<(), FlowError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&owner.0);
        Ok(())
    }
}
