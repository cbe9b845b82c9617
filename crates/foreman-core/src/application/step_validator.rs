use crate::{domain::flow_config::FlowType, FlowData};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Soft result of validating a step's data fragment
///
/// Not an error: a rejected fragment means the caller re-prompts the user
/// and does not advance the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the fragment may be accepted
    pub valid: bool,

    /// User-facing complaint when rejected
    pub message: Option<String>,
}

impl ValidationOutcome {
    /// An accepting outcome
    pub fn ok() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    /// A rejecting outcome with a user-facing message
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// A pure, side-effect-free predicate over a step's data fragment
pub type StepValidator = Arc<dyn Fn(&FlowData) -> ValidationOutcome + Send + Sync>;

/// Registry of validators keyed by `(flow type, numbered step)`
///
/// Pairs with no registered validator are vacuously valid; the registry can
/// enumerate those ungoverned steps so deployments lint their coverage
/// instead of silently accepting unvalidated data.
pub struct StepValidatorRegistry {
    validators: HashMap<(FlowType, u32), StepValidator>,
}

impl StepValidatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            validators: HashMap::new(),
        }
    }

    /// Create a registry preloaded with the facility-maintenance rule set
    pub fn with_default_rules() -> Self {
        let mut registry = Self::new();

        // Work-order creation wizard
        registry.register(FlowType::WorkOrderCreation, 1, |fragment| {
            require_text(fragment, "typeOfWork", "Tell me what kind of work this is")
        });
        registry.register(FlowType::WorkOrderCreation, 2, |fragment| {
            require_text(
                fragment,
                "typeOfService",
                "Tell me what kind of service is needed",
            )
        });
        registry.register(FlowType::WorkOrderCreation, 3, |fragment| {
            require_one_of(
                fragment,
                "priority",
                &["low", "medium", "high", "urgent"],
                "Priority must be low, medium, high or urgent",
            )
        });
        registry.register(FlowType::WorkOrderCreation, 4, |fragment| {
            require_text(fragment, "location", "Tell me where the problem is")
        });
        registry.register(FlowType::WorkOrderCreation, 5, |fragment| {
            require_text(fragment, "equipment", "Tell me which equipment is affected")
        });
        registry.register(FlowType::WorkOrderCreation, 6, |fragment| {
            match fragment.get("description").and_then(|v| v.as_str()) {
                Some(text) if text.trim().len() >= 3 => ValidationOutcome::ok(),
                _ => ValidationOutcome::rejected("Describe the problem in a few words"),
            }
        });

        // Facility registration wizard
        registry.register(FlowType::FacilityRegistration, 1, |fragment| {
            require_text(fragment, "name", "What is the facility called?")
        });
        registry.register(FlowType::FacilityRegistration, 2, |fragment| {
            require_text(fragment, "address", "What is the facility address?")
        });
        registry.register(FlowType::FacilityRegistration, 3, |fragment| {
            let has_contact = ["contactPhone", "contactEmail"].iter().any(|key| {
                fragment
                    .get(*key)
                    .and_then(|v| v.as_str())
                    .is_some_and(|s| !s.trim().is_empty())
            });
            if has_contact {
                ValidationOutcome::ok()
            } else {
                ValidationOutcome::rejected("I need a contact phone or email")
            }
        });

        // Reminder creation wizard. The optional-notes step carries no rule
        // on purpose; ungoverned_steps() reports it.
        registry.register(FlowType::ReminderCreation, 1, |fragment| {
            require_text(fragment, "title", "What should I remind you about?")
        });
        registry.register(FlowType::ReminderCreation, 2, |fragment| {
            match fragment.get("dueAt").and_then(|v| v.as_str()) {
                Some(raw) if chrono::DateTime::parse_from_rfc3339(raw).is_ok() => {
                    ValidationOutcome::ok()
                }
                _ => ValidationOutcome::rejected("I need a date and time, e.g. 2026-09-01T09:00:00Z"),
            }
        });

        registry
    }

    /// Register a validator for a `(flow type, step)` pair
    pub fn register<F>(&mut self, flow_type: FlowType, step: u32, validator: F)
    where
        F: Fn(&FlowData) -> ValidationOutcome + Send + Sync + 'static,
    {
        self.validators
            .insert((flow_type, step), Arc::new(validator));
    }

    /// Validate a candidate fragment for a `(flow type, step)` pair
    ///
    /// Unregistered pairs accept anything.
    pub fn validate(&self, flow_type: FlowType, step: u32, fragment: &FlowData) -> ValidationOutcome {
        match self.validators.get(&(flow_type, step)) {
            Some(validator) => validator(fragment),
            None => ValidationOutcome::ok(),
        }
    }

    /// Whether a validator is registered for the pair
    pub fn is_governed(&self, flow_type: FlowType, step: u32) -> bool {
        self.validators.contains_key(&(flow_type, step))
    }

    /// Numbered steps of a flow with no registered validator
    pub fn ungoverned_steps(&self, flow_type: FlowType, total_steps: u32) -> Vec<u32> {
        (1..=total_steps)
            .filter(|step| !self.is_governed(flow_type, *step))
            .collect()
    }

    /// Log every ungoverned step at warn level; returns how many were found
    pub fn warn_ungoverned(&self, flow_type: FlowType, total_steps: u32) -> usize {
        let ungoverned = self.ungoverned_steps(flow_type, total_steps);
        for step in &ungoverned {
            warn!(
                flow_type = %flow_type,
                step,
                "step has no registered validator; any data will be accepted"
            );
        }
        ungoverned.len()
    }
}

impl Default for StepValidatorRegistry {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

fn require_text(fragment: &FlowData, key: &str, message: &str) -> ValidationOutcome {
    match fragment.get(key).and_then(|v| v.as_str()) {
        Some(text) if !text.trim().is_empty() => ValidationOutcome::ok(),
        _ => ValidationOutcome::rejected(message),
    }
}

fn require_one_of(
    fragment: &FlowData,
    key: &str,
    allowed: &[&str],
    message: &str,
) -> ValidationOutcome {
    match fragment.get(key).and_then(|v| v.as_str()) {
        Some(text) if allowed.contains(&text) => ValidationOutcome::ok(),
        _ => ValidationOutcome::rejected(message),
    }
}
