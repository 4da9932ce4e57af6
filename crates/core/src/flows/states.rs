use serde::{Deserialize, Serialize};

use crate::domain::criterion::{Criterion, MANDATORY_ORDER};
use crate::domain::slots::SlotState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowType {
    CarSearch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialoguePhase {
    Mandatory,
    Optional,
    Searching,
    Completed,
    Failed,
    Abandoned,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueEvent {
    MandatoryResolved,
    ProceedRequested,
    SearchFinished,
    SearchFailed,
    UserLeft,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowContext {
    pub unresolved_mandatory: Vec<Criterion>,
}

impl FlowContext {
    pub fn from_slots(state: &SlotState) -> Self {
        let unresolved_mandatory = MANDATORY_ORDER
            .iter()
            .copied()
            .filter(|criterion| state.get(*criterion).is_unset())
            .collect();
        Self { unresolved_mandatory }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialoguePhase,
    pub to: DialoguePhase,
    pub event: DialogueEvent,
}
