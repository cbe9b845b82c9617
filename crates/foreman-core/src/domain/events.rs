use crate::domain::flow_config::FlowType;
use crate::domain::flow_session::{FlowStep, OwnerId};
use chrono::{DateTime, Utc};
use std::fmt::Debug;

/// Domain event trait for all events in the system
pub trait DomainEvent: Debug + Send + Sync {
    /// Returns the type of the event as a string
    fn event_type(&self) -> &'static str;

    /// Returns the owner whose session this event is associated with
    fn owner_id(&self) -> &OwnerId;

    /// Returns the timestamp when the event occurred
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Event: Flow session started
#[derive(Debug)]
pub struct FlowSessionStarted {
    /// The owner of the session
    pub owner_id: OwnerId,

    /// The wizard kind that was started
    pub flow_type: FlowType,

    /// The timestamp when the session was created
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowSessionStarted {
    fn event_type(&self) -> &'static str {
        "flow_session.started"
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Flow advanced to the next step
#[derive(Debug)]
pub struct FlowStepAdvanced {
    /// The owner of the session
    pub owner_id: OwnerId,

    /// The step the session advanced from
    pub from_step: FlowStep,

    /// The step the session advanced to
    pub to_step: FlowStep,

    /// The timestamp when the advance happened
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowStepAdvanced {
    fn event_type(&self) -> &'static str {
        "flow_session.step_advanced"
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Flow rolled back to the previous step
#[derive(Debug)]
pub struct FlowSteppedBack {
    /// The owner of the session
    pub owner_id: OwnerId,

    /// The step that was abandoned
    pub from_step: FlowStep,

    /// The step the session was restored to
    pub to_step: FlowStep,

    /// The timestamp when the rollback happened
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowSteppedBack {
    fn event_type(&self) -> &'static str {
        "flow_session.stepped_back"
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Flow session completed
#[derive(Debug)]
pub struct FlowSessionCompleted {
    /// The owner of the session
    pub owner_id: OwnerId,

    /// The wizard kind that completed
    pub flow_type: FlowType,

    /// The timestamp when the session completed
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowSessionCompleted {
    fn event_type(&self) -> &'static str {
        "flow_session.completed"
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Flow session cancelled
#[derive(Debug)]
pub struct FlowSessionCancelled {
    /// The owner of the session
    pub owner_id: OwnerId,

    /// The reason supplied by the caller
    pub reason: Option<String>,

    /// The timestamp when the session was cancelled
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowSessionCancelled {
    fn event_type(&self) -> &'static str {
        "flow_session.cancelled"
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Event: Flow session removed after exceeding its inactivity TTL
#[derive(Debug)]
pub struct FlowSessionExpired {
    /// The owner of the session
    pub owner_id: OwnerId,

    /// When the session was last touched before expiring
    pub last_updated_at: DateTime<Utc>,

    /// The timestamp when the expiry was observed
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent for FlowSessionExpired {
    fn event_type(&self) -> &'static str {
        "flow_session.expired"
    }

    fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
