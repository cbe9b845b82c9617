//! Repository traits for the Foreman flow engine
//!
//! This module defines the persistence and clock abstractions the engine
//! depends on. External crates can implement these traits to provide
//! different persistence mechanisms.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::flow_session::{FlowSession, OwnerId};
use crate::FlowError;

/// Wall-clock source used for timestamps and TTL comparison
///
/// Injected so tests can move time forward without sleeping.
pub trait Clock: Send + Sync {
    /// The current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Keyed persistence for flow sessions, one record per owner
#[async_trait]
pub trait FlowSessionRepository: Send + Sync {
    /// Find the session for an owner
    async fn find_by_owner(&self, owner: &OwnerId) -> Result<Option<FlowSession>, FlowError>;

    /// Save a session
    ///
    /// With `expected_version: None` the write replaces whatever is stored
    /// (used when a flow starts). With `Some(v)` the write only applies if
    /// the stored record's version is exactly `v`; otherwise the call fails
    /// with [`FlowError::SessionConflict`] and the stored record is left
    /// unchanged.
    async fn upsert(
        &self,
        session: &FlowSession,
        expected_version: Option<u64>,
    ) -> Result<(), FlowError>;

    /// Delete the session for an owner; succeeds even if absent
    async fn delete(&self, owner: &OwnerId) -> Result<(), FlowError>;
}

/// Memory implementations for testing
#[cfg(feature = "testing")]
pub mod memory {
    use super::*;
    use chrono::Duration;
    use dashmap::DashMap;
    use std::sync::Arc;
    use std::sync::RwLock;

    /// In-memory implementation of the flow session repository using a
    /// concurrent map to reduce lock contention
    pub struct MemoryFlowSessionRepository {
        sessions: Arc<DashMap<String, FlowSession>>,
    }

    impl MemoryFlowSessionRepository {
        /// Create a new memory flow session repository
        pub fn new() -> Self {
            Self {
                sessions: Arc::new(DashMap::with_capacity(16)),
            }
        }

        /// Number of stored sessions, regardless of status
        pub fn len(&self) -> usize {
            self.sessions.len()
        }

        /// Whether the store is empty
        pub fn is_empty(&self) -> bool {
            self.sessions.is_empty()
        }
    }

    impl Default for MemoryFlowSessionRepository {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl FlowSessionRepository for MemoryFlowSessionRepository {
        async fn find_by_owner(&self, owner: &OwnerId) -> Result<Option<FlowSession>, FlowError> {
            Ok(self.sessions.get(&owner.0).map(|session| session.clone()))
        }

        async fn upsert(
            &self,
            session: &FlowSession,
            expected_version: Option<u64>,
        ) -> Result<(), FlowError> {
            match expected_version {
                None => {
                    self.sessions
                        .insert(session.owner_id.0.clone(), session.clone());
                    Ok(())
                }
                Some(expected) => {
                    // Entry API keeps the compare-and-swap atomic per key
                    match self.sessions.entry(session.owner_id.0.clone()) {
                        dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                            if occupied.get().version != expected {
                                return Err(FlowError::SessionConflict(
                                    session.owner_id.0.clone(),
                                ));
                            }
                            occupied.insert(session.clone());
                            Ok(())
                        }
                        dashmap::mapref::entry::Entry::Vacant(_) => {
                            Err(FlowError::SessionConflict(session.owner_id.0.clone()))
                        }
                    }
                }
            }
        }

        async fn delete(&self, owner: &OwnerId) -> Result<(), FlowError> {
            self.sessions.remove(&owner.0);
            Ok(())
        }
    }

    /// A clock whose time only moves when the test advances it
    pub struct ManualClock {
        now: RwLock<DateTime<Utc>>,
    }

    impl ManualClock {
        /// Create a clock frozen at the given instant
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                now: RwLock::new(start),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, delta: Duration) {
            let mut now = self.now.write().expect("clock lock poisoned");
            *now = *now + delta;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.read().expect("clock lock poisoned")
        }
    }
}

#[cfg(all(test, feature = "testing"))]
mod tests {
    use super::memory::{ManualClock, MemoryFlowSessionRepository};
    use super::*;
    use crate::domain::flow_config::{FlowConfig, FlowType};
    use crate::FlowData;
    use chrono::Duration;

    fn session_for(owner: &str) -> FlowSession {
        FlowSession::new(
            OwnerId(owner.to_string()),
            FlowType::ReminderCreation,
            FlowData::new(),
            FlowConfig::for_type(FlowType::ReminderCreation),
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_repository_round_trip() -> Result<(), FlowError> {
        let repo = MemoryFlowSessionRepository::new();
        let owner = OwnerId("user-1".to_string());
        let session = session_for("user-1");

        repo.upsert(&session, None).await?;
        let found = repo.find_by_owner(&owner).await?;
        assert!(found.is_some());
        assert_eq!(found.unwrap().owner_id, owner);

        repo.delete(&owner).await?;
        assert!(repo.find_by_owner(&owner).await?.is_none());
        assert!(repo.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_memory_repository_version_check() -> Result<(), FlowError> {
        let repo = MemoryFlowSessionRepository::new();
        let mut session = session_for("user-1");
        repo.upsert(&session, None).await?;

        // Matching expectation succeeds
        session.bump_version();
        repo.upsert(&session, Some(1)).await?;

        // Stale expectation is rejected and the stored record is untouched
        let mut stale = session.clone();
        stale.version = 2;
        stale.bump_version();
        let result = repo.upsert(&stale, Some(1)).await;
        assert!(matches!(result, Err(FlowError::SessionConflict(_))));
        let stored = repo
            .find_by_owner(&OwnerId("user-1".to_string()))
            .await?
            .unwrap();
        assert_eq!(stored.version, 2);

        // CAS against a missing record is also a conflict
        repo.delete(&OwnerId("user-1".to_string())).await?;
        let result = repo.upsert(&session, Some(2)).await;
        assert!(matches!(result, Err(FlowError::SessionConflict(_))));

        Ok(())
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(31));
        assert_eq!(clock.now(), start + Duration::minutes(31));
    }

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
