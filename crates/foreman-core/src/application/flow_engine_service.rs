use crate::{
    domain::events::{DomainEvent, FlowSessionExpired},
    domain::flow_config::{FlowConfig, FlowType},
    domain::flow_session::{FlowSession, FlowStep, OwnerId},
    domain::repository::{Clock, FlowSessionRepository},
    FlowData, FlowError,
};
use async_trait::async_trait;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handler invoked with every domain event the engine drains
#[async_trait]
pub trait DomainEventHandler: Send + Sync {
    /// Handle a single domain event
    async fn handle_event(&self, event: Box<dyn DomainEvent>) -> Result<(), FlowError>;
}

/// Default event handler that emits each event as a tracing record
pub struct LoggingEventHandler;

#[async_trait]
impl DomainEventHandler for LoggingEventHandler {
    async fn handle_event(&self, event: Box<dyn DomainEvent>) -> Result<(), FlowError> {
        info!(
            event_type = event.event_type(),
            owner = %event.owner_id(),
            "flow event"
        );
        Ok(())
    }
}

/// Event handler that discards everything
pub struct NoopEventHandler;

#[async_trait]
impl DomainEventHandler for NoopEventHandler {
    async fn handle_event(&self, _event: Box<dyn DomainEvent>) -> Result<(), FlowError> {
        Ok(())
    }
}

/// Engine-level tunables
#[derive(Debug, Clone)]
pub struct FlowEngineConfig {
    /// Inactivity window after which a session is treated as expired on read
    pub session_ttl: Duration,
}

impl Default for FlowEngineConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::minutes(30),
        }
    }
}

/// The conversational flow engine
///
/// Stateless itself: every operation is one read-mutate-write round trip
/// against the injected session repository, keyed by owner. Session
/// isolation between owners is the concurrency model; for a single owner a
/// compare-and-swap on the session version turns a lost race into a
/// [`FlowError::SessionConflict`] instead of a silent lost update.
pub struct FlowEngine {
    /// Repository for flow sessions
    session_repo: Arc<dyn FlowSessionRepository>,

    /// Wall-clock source
    clock: Arc<dyn Clock>,

    /// Event handler
    event_handler: Arc<dyn DomainEventHandler>,

    /// Engine tunables
    config: FlowEngineConfig,
}

impl FlowEngine {
    /// Create a new flow engine with default TTL and logging event handler
    pub fn new(session_repo: Arc<dyn FlowSessionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            session_repo,
            clock,
            event_handler: Arc::new(LoggingEventHandler),
            config: FlowEngineConfig::default(),
        }
    }

    /// Replace the engine configuration
    pub fn with_config(mut self, config: FlowEngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the domain event handler
    pub fn with_event_handler(mut self, event_handler: Arc<dyn DomainEventHandler>) -> Self {
        self.event_handler = event_handler;
        self
    }

    /// Start a flow for an owner, unconditionally replacing any prior session
    ///
    /// Always succeeds regardless of what was stored before, which makes
    /// restarting a wizard idempotent from the user's point of view.
    pub async fn start_flow(
        &self,
        owner: &OwnerId,
        flow_type: FlowType,
        initial_data: FlowData,
        config: FlowConfig,
    ) -> Result<FlowSession, FlowError> {
        let now = self.clock.now();
        let mut session = FlowSession::new(owner.clone(), flow_type, initial_data, config, now)?;

        self.session_repo.upsert(&session, None).await?;
        self.handle_events(&mut session).await?;

        debug!(owner = %owner, flow_type = %flow_type, "flow started");
        Ok(session)
    }

    /// Fetch the owner's active session, expiring it lazily if stale
    ///
    /// Returns `None` when no record exists, when the record is terminal,
    /// or when the record sat untouched past the TTL (in which case it is
    /// deleted as a side effect).
    pub async fn get_active_flow(&self, owner: &OwnerId) -> Result<Option<FlowSession>, FlowError> {
        let Some(session) = self.session_repo.find_by_owner(owner).await? else {
            return Ok(None);
        };

        if !session.is_active() {
            return Ok(None);
        }

        let now = self.clock.now();
        if session.is_expired(now, self.config.session_ttl) {
            self.session_repo.delete(owner).await?;
            let expired = Box::new(FlowSessionExpired {
                owner_id: owner.clone(),
                last_updated_at: session.updated_at,
                timestamp: now,
            });
            if let Err(e) = self.event_handler.handle_event(expired).await {
                warn!(owner = %owner, error = %e, "event handler failed");
            }
            debug!(owner = %owner, "flow expired on read");
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Whether the owner currently has an active, unexpired session
    pub async fn has_active_flow(&self, owner: &OwnerId) -> Result<bool, FlowError> {
        Ok(self.get_active_flow(owner).await?.is_some())
    }

    /// Advance the owner's flow to `next_step`, merging the step's data
    pub async fn advance_step(
        &self,
        owner: &OwnerId,
        next_step: FlowStep,
        patch: FlowData,
    ) -> Result<FlowSession, FlowError> {
        let mut session = self.require_active(owner).await?;
        let expected = session.version;

        session.advance(next_step, patch, self.clock.now())?;
        session.bump_version();

        self.session_repo.upsert(&session, Some(expected)).await?;
        self.handle_events(&mut session).await?;
        Ok(session)
    }

    /// Roll the owner's flow back to the previous step
    ///
    /// The absence-of-session check takes precedence: an owner with no
    /// session gets `NoActiveFlow`, never `NoPreviousStep`.
    pub async fn go_back(&self, owner: &OwnerId) -> Result<FlowSession, FlowError> {
        let mut session = self.require_active(owner).await?;
        let expected = session.version;

        session.step_back(self.clock.now())?;
        session.bump_version();

        self.session_repo.upsert(&session, Some(expected)).await?;
        self.handle_events(&mut session).await?;
        Ok(session)
    }

    /// Merge an in-step correction without touching step or history
    pub async fn update_data(
        &self,
        owner: &OwnerId,
        patch: FlowData,
    ) -> Result<FlowSession, FlowError> {
        let mut session = self.require_active(owner).await?;
        let expected = session.version;

        session.merge_data(patch, self.clock.now())?;
        session.bump_version();

        self.session_repo.upsert(&session, Some(expected)).await?;
        self.handle_events(&mut session).await?;
        Ok(session)
    }

    /// Complete the owner's flow, merging a final data patch
    ///
    /// The record remains in the store until explicitly cleared but is no
    /// longer active.
    pub async fn complete_flow(
        &self,
        owner: &OwnerId,
        final_patch: FlowData,
    ) -> Result<FlowSession, FlowError> {
        let mut session = self.require_active(owner).await?;
        let expected = session.version;

        session.complete(final_patch, self.clock.now())?;
        session.bump_version();

        self.session_repo.upsert(&session, Some(expected)).await?;
        self.handle_events(&mut session).await?;

        info!(owner = %owner, flow_type = %session.flow_type, "flow completed");
        Ok(session)
    }

    /// Cancel the owner's flow; a no-op when no active session exists
    pub async fn cancel_flow(
        &self,
        owner: &OwnerId,
        reason: Option<String>,
    ) -> Result<(), FlowError> {
        let Some(mut session) = self.get_active_flow(owner).await? else {
            debug!(owner = %owner, "cancel requested with no active flow");
            return Ok(());
        };
        let expected = session.version;

        session.cancel(reason, self.clock.now())?;
        session.bump_version();

        self.session_repo.upsert(&session, Some(expected)).await?;
        self.handle_events(&mut session).await?;

        info!(owner = %owner, flow_type = %session.flow_type, "flow cancelled");
        Ok(())
    }

    /// Remove whatever session the owner has, active or terminal
    pub async fn clear_flow(&self, owner: &OwnerId) -> Result<(), FlowError> {
        self.session_repo.delete(owner).await?;
        debug!(owner = %owner, "flow cleared");
        Ok(())
    }

    /// Load the owner's active session or fail with `NoActiveFlow`
    async fn require_active(&self, owner: &OwnerId) -> Result<FlowSession, FlowError> {
        self.get_active_flow(owner)
            .await?
            .ok_or_else(|| FlowError::NoActiveFlow(owner.0.clone()))
    }

    /// Drain recorded domain events to the configured handler
    async fn handle_events(&self, session: &mut FlowSession) -> Result<(), FlowError> {
        for event in session.take_events() {
            if let Err(e) = self.event_handler.handle_event(event).await {
                // Event delivery must not undo a persisted mutation
                warn!(owner = %session.owner_id, error = %e, "event handler failed");
            }
        }
        Ok(())
    }
}
