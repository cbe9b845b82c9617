use crate::{
    domain::events::{
        DomainEvent, FlowSessionCancelled, FlowSessionCompleted, FlowSessionStarted,
        FlowStepAdvanced, FlowSteppedBack,
    },
    domain::flow_config::{FlowConfig, FlowType},
    FlowData, FlowError,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Value object: identity of the chat user a session belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub String);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position within a flow's ordered prompt sequence
///
/// Either a numbered step in `[1, total_steps]` or the distinguished
/// terminal confirmation pseudo-step shown before the wizard finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    /// A numbered step, starting at 1
    Numbered(u32),

    /// The confirmation pseudo-step after the last numbered step
    Confirmation,
}

impl FlowStep {
    /// The step number, if this is a numbered step
    pub fn as_number(&self) -> Option<u32> {
        match self {
            FlowStep::Numbered(n) => Some(*n),
            FlowStep::Confirmation => None,
        }
    }

    /// Whether this is the confirmation pseudo-step
    pub fn is_confirmation(&self) -> bool {
        matches!(self, FlowStep::Confirmation)
    }
}

impl std::fmt::Display for FlowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowStep::Numbered(n) => write!(f, "{}", n),
            FlowStep::Confirmation => f.write_str("confirmation"),
        }
    }
}

// Stored sessions carry the step as a plain number, or the string
// "confirmation" for the pseudo-step.
impl Serialize for FlowStep {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            FlowStep::Numbered(n) => serializer.serialize_u32(*n),
            FlowStep::Confirmation => serializer.serialize_str("confirmation"),
        }
    }
}

impl<'de> Deserialize<'de> for FlowStep {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Number(n) => n
                .as_u64()
                .filter(|n| *n >= 1 && *n <= u32::MAX as u64)
                .map(|n| FlowStep::Numbered(n as u32))
                .ok_or_else(|| serde::de::Error::custom("step number out of range")),
            serde_json::Value::String(s) if s == "confirmation" => Ok(FlowStep::Confirmation),
            other => Err(serde::de::Error::custom(format!(
                "expected step number or \"confirmation\", got {}",
                other
            ))),
        }
    }
}

/// Flow session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowSessionStatus {
    /// Session is in progress and accepts mutations
    Active,

    /// Wizard finished successfully; record kept until cleared
    Completed,

    /// Wizard was cancelled; record kept until cleared
    Cancelled,
}

/// One snapshot pushed onto the history stack per successful advance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The step that was current when the advance happened
    pub step: FlowStep,

    /// The accumulated data exactly as it was before the advance's merge
    pub data: FlowData,

    /// When the advance happened
    pub timestamp: DateTime<Utc>,
}

/// Aggregate: one user's in-progress multi-step wizard instance
#[derive(Debug, Serialize, Deserialize)]
pub struct FlowSession {
    /// The owner this session belongs to (unique key)
    pub owner_id: OwnerId,

    /// Which wizard definition this session instantiates
    pub flow_type: FlowType,

    /// Current position in the prompt sequence
    pub current_step: FlowStep,

    /// Number of numbered steps, fixed at creation from the config
    pub total_steps: u32,

    /// Accumulated wizard data, shallow-merged across turns
    pub data: FlowData,

    /// Snapshot stack enabling exact rollback via go-back
    pub history: Vec<HistoryEntry>,

    /// Current status
    pub status: FlowSessionStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp; drives TTL expiry
    pub updated_at: DateTime<Utc>,

    /// Set when the session completes
    pub completed_at: Option<DateTime<Utc>>,

    /// Set when the session is cancelled
    pub cancelled_at: Option<DateTime<Utc>>,

    /// Caller-supplied cancellation reason
    pub cancel_reason: Option<String>,

    /// Navigation policy copied in at start; immutable thereafter
    pub config: FlowConfig,

    /// Optimistic-concurrency token, bumped before every upsert
    pub version: u64,

    /// Domain events
    #[serde(skip)]
    pub events: Vec<Box<dyn DomainEvent>>,
}

// Manually implement Clone for FlowSession
impl Clone for FlowSession {
    fn clone(&self) -> Self {
        Self {
            owner_id: self.owner_id.clone(),
            flow_type: self.flow_type,
            current_step: self.current_step,
            total_steps: self.total_steps,
            data: self.data.clone(),
            history: self.history.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
            cancelled_at: self.cancelled_at,
            cancel_reason: self.cancel_reason.clone(),
            config: self.config.clone(),
            version: self.version,
            events: Vec::new(), // We don't clone domain events
        }
    }
}

impl FlowSession {
    /// Create a fresh session at step 1 with an empty history
    pub fn new(
        owner_id: OwnerId,
        flow_type: FlowType,
        initial_data: FlowData,
        config: FlowConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, FlowError> {
        config.validate()?;

        let mut session = Self {
            owner_id: owner_id.clone(),
            flow_type,
            current_step: FlowStep::Numbered(1),
            total_steps: config.total_steps,
            data: initial_data,
            history: Vec::new(),
            status: FlowSessionStatus::Active,
            created_at: now,
            updated_at: now,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            config,
            version: 1,
            events: Vec::with_capacity(4),
        };

        session.record_event(Box::new(FlowSessionStarted {
            owner_id,
            flow_type,
            timestamp: now,
        }));

        Ok(session)
    }

    /// Whether the session still accepts mutations
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == FlowSessionStatus::Active
    }

    /// Whether the session has gone unused longer than the TTL
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.updated_at > ttl
    }

    fn ensure_active(&self) -> Result<(), FlowError> {
        if !self.is_active() {
            return Err(FlowError::FlowTransitionError(format!(
                "Cannot mutate flow in state: {:?}",
                self.status
            )));
        }
        Ok(())
    }

    fn ensure_step_in_bounds(&self, step: FlowStep) -> Result<(), FlowError> {
        if let FlowStep::Numbered(n) = step {
            if n < 1 || n > self.total_steps {
                return Err(FlowError::FlowTransitionError(format!(
                    "Step {} out of bounds [1, {}]",
                    n, self.total_steps
                )));
            }
        }
        Ok(())
    }

    /// Advance to `next_step`, merging the step's data contribution
    ///
    /// The pre-merge data is snapshotted onto the history stack so a later
    /// go-back restores exactly the state before this call.
    pub fn advance(
        &mut self,
        next_step: FlowStep,
        patch: FlowData,
        now: DateTime<Utc>,
    ) -> Result<(), FlowError> {
        self.ensure_active()?;
        self.ensure_step_in_bounds(next_step)?;

        self.history.push(HistoryEntry {
            step: self.current_step,
            data: self.data.clone(),
            timestamp: now,
        });

        self.data.extend(patch);

        self.record_event(Box::new(FlowStepAdvanced {
            owner_id: self.owner_id.clone(),
            from_step: self.current_step,
            to_step: next_step,
            timestamp: now,
        }));

        self.current_step = next_step;
        self.updated_at = now;
        Ok(())
    }

    /// Roll back to the previous snapshot, discarding the current step's data
    ///
    /// Full restore, not a merge: any keys added or overwritten since the
    /// snapshot was taken revert to their snapshotted state.
    pub fn step_back(&mut self, now: DateTime<Utc>) -> Result<(), FlowError> {
        self.ensure_active()?;

        let entry = self
            .history
            .pop()
            .ok_or_else(|| FlowError::NoPreviousStep(self.owner_id.0.clone()))?;

        self.record_event(Box::new(FlowSteppedBack {
            owner_id: self.owner_id.clone(),
            from_step: self.current_step,
            to_step: entry.step,
            timestamp: now,
        }));

        self.current_step = entry.step;
        self.data = entry.data;
        self.updated_at = now;
        Ok(())
    }

    /// Merge a correction into the data without touching step or history
    pub fn merge_data(&mut self, patch: FlowData, now: DateTime<Utc>) -> Result<(), FlowError> {
        self.ensure_active()?;
        self.data.extend(patch);
        self.updated_at = now;
        Ok(())
    }

    /// Complete the flow successfully
    pub fn complete(&mut self, final_patch: FlowData, now: DateTime<Utc>) -> Result<(), FlowError> {
        self.ensure_active()?;

        self.data.extend(final_patch);
        self.status = FlowSessionStatus::Completed;
        self.completed_at = Some(now);
        self.updated_at = now;

        self.record_event(Box::new(FlowSessionCompleted {
            owner_id: self.owner_id.clone(),
            flow_type: self.flow_type,
            timestamp: now,
        }));

        Ok(())
    }

    /// Cancel the flow
    pub fn cancel(&mut self, reason: Option<String>, now: DateTime<Utc>) -> Result<(), FlowError> {
        self.ensure_active()?;

        self.status = FlowSessionStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancel_reason = reason.clone();
        self.updated_at = now;

        self.record_event(Box::new(FlowSessionCancelled {
            owner_id: self.owner_id.clone(),
            reason,
            timestamp: now,
        }));

        Ok(())
    }

    /// Bump the optimistic-concurrency token before an upsert
    #[inline]
    pub fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Record a domain event
    pub fn record_event(&mut self, event: Box<dyn DomainEvent>) {
        self.events.push(event);
    }

    /// Get and clear all domain events
    pub fn take_events(&mut self) -> Vec<Box<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }
}
