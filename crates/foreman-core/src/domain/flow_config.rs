use crate::FlowError;
use serde::{Deserialize, Serialize};

/// The closed set of wizard kinds the assistant can run
///
/// Each variant carries a stable wire tag so stored sessions remain readable
/// across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowType {
    /// Multi-step work-order creation wizard
    #[serde(rename = "wo_new")]
    WorkOrderCreation,

    /// Facility registration wizard
    #[serde(rename = "facility_new")]
    FacilityRegistration,

    /// Reminder creation wizard
    #[serde(rename = "reminder_new")]
    ReminderCreation,
}

impl FlowType {
    /// The stable wire tag for this flow type
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::WorkOrderCreation => "wo_new",
            FlowType::FacilityRegistration => "facility_new",
            FlowType::ReminderCreation => "reminder_new",
        }
    }

    /// All known flow types
    pub fn all() -> [FlowType; 3] {
        [
            FlowType::WorkOrderCreation,
            FlowType::FacilityRegistration,
            FlowType::ReminderCreation,
        ]
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlowType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wo_new" => Ok(FlowType::WorkOrderCreation),
            "facility_new" => Ok(FlowType::FacilityRegistration),
            "reminder_new" => Ok(FlowType::ReminderCreation),
            other => Err(FlowError::ConfigurationError(format!(
                "Unknown flow type: {}",
                other
            ))),
        }
    }
}

/// Static per-flow-type navigation policy and presentation metadata
///
/// The config gates what the presentation layer offers the user (whether a
/// "Back" control is shown, whether a progress bar is rendered). It does not
/// change the engine's willingness to execute `go_back` or `cancel_flow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Number of numbered steps before the confirmation pseudo-step
    pub total_steps: u32,

    /// Whether the transport offers a "Back" control
    pub allow_back: bool,

    /// Whether the transport offers a "Cancel" control
    pub allow_cancel: bool,

    /// Whether the transport renders a progress indicator
    pub show_progress: bool,

    /// Human-readable wizard title
    pub title: String,

    /// Description shown when the wizard starts
    pub description: Option<String>,
}

impl FlowConfig {
    /// Create a config with the given step count and all controls enabled
    pub fn new(total_steps: u32, title: impl Into<String>) -> Self {
        Self {
            total_steps,
            allow_back: true,
            allow_cancel: true,
            show_progress: true,
            title: title.into(),
            description: None,
        }
    }

    /// The built-in configuration for a flow type
    pub fn for_type(flow_type: FlowType) -> Self {
        match flow_type {
            FlowType::WorkOrderCreation => Self {
                total_steps: 6,
                allow_back: true,
                allow_cancel: true,
                show_progress: true,
                title: "New work order".to_string(),
                description: Some(
                    "Walks through work type, service type, priority, location, equipment and description".to_string(),
                ),
            },
            FlowType::FacilityRegistration => Self {
                total_steps: 4,
                allow_back: true,
                allow_cancel: true,
                show_progress: true,
                title: "Register facility".to_string(),
                description: Some("Collects facility name, address and contact details".to_string()),
            },
            FlowType::ReminderCreation => Self {
                total_steps: 3,
                allow_back: true,
                allow_cancel: true,
                show_progress: false,
                title: "New reminder".to_string(),
                description: None,
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), FlowError> {
        if self.total_steps == 0 {
            return Err(FlowError::ConfigurationError(
                "Flow must have at least one step".to_string(),
            ));
        }
        if self.title.is_empty() {
            return Err(FlowError::ConfigurationError(
                "Flow title must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
