pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod search;

pub use dialogue::{RelaxationLevel, RelaxationPlanner, RelaxedFilterView, SlotSequencer};
pub use domain::criterion::{
    Criterion, CriterionKind, FuelType, ALL_CRITERIA, MANDATORY_ORDER, OPTIONAL_CRITERIA,
};
pub use domain::filter::SearchFilter;
pub use domain::slots::{CriteriaUpdate, CriterionValue, SlotState, TriState};
pub use domain::vehicle::VehicleRecord;
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use flows::{CarSearchFlow, DialogueEvent, DialoguePhase, FlowEngine, FlowTransitionError};
pub use search::{SearchError, VehicleSearch};
