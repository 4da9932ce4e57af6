use thiserror::Error;

use crate::flows::FlowTransitionError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "That request could not be processed. Check it and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "The car catalog is temporarily unavailable. Please retry shortly."
            }
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Domain(error) => Self::BadRequest {
                message: error.to_string(),
                correlation_id: "unassigned".to_owned(),
            },
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::criterion::Criterion;
    use crate::errors::{ApplicationError, DomainError, InterfaceError};
    use crate::flows::{DialogueEvent, DialoguePhase, FlowTransitionError};

    #[test]
    fn flow_errors_map_to_bad_request_interface_error() {
        let error = DomainError::from(FlowTransitionError::UnresolvedMandatory {
            phase: DialoguePhase::Mandatory,
            unresolved: vec![Criterion::BudgetCeiling],
        });
        let interface = ApplicationError::from(error).into_interface("conv-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref message, .. } if message.contains("BudgetCeiling")
        ));
        assert_eq!(interface.correlation_id(), "conv-1");
        assert_eq!(
            interface.user_message(),
            "That request could not be processed. Check it and try again."
        );
    }

    #[test]
    fn invalid_transitions_keep_their_phase_and_event() {
        let error = DomainError::from(FlowTransitionError::InvalidTransition {
            phase: DialoguePhase::Mandatory,
            event: DialogueEvent::ProceedRequested,
        });

        let interface = ApplicationError::from(error).into_interface("conv-2");
        assert!(matches!(
            interface,
            InterfaceError::BadRequest { ref message, .. }
                if message.contains("Mandatory") && message.contains("ProceedRequested")
        ));
    }

    #[test]
    fn integration_error_maps_to_service_unavailable() {
        let interface = ApplicationError::Integration("catalog search timed out".to_owned())
            .into_interface("conv-3");

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "conv-3");
        assert_eq!(
            interface.user_message(),
            "The car catalog is temporarily unavailable. Please retry shortly."
        );
    }

    #[test]
    fn persistence_error_maps_to_service_unavailable() {
        let interface =
            InterfaceError::from(ApplicationError::Persistence("bad price".to_owned()));

        assert!(matches!(interface, InterfaceError::ServiceUnavailable { .. }));
        assert_eq!(interface.correlation_id(), "unassigned");
    }
}
