use thiserror::Error;

use crate::domain::criterion::Criterion;
use crate::flows::states::{DialogueEvent, DialoguePhase, FlowContext, FlowType, TransitionOutcome};

pub trait FlowDefinition {
    fn flow_type(&self) -> FlowType;
    fn initial_phase(&self) -> DialoguePhase;
    fn transition(
        &self,
        current: &DialoguePhase,
        event: &DialogueEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

#[derive(Clone, Debug, Default)]
pub struct CarSearchFlow;

impl FlowDefinition for CarSearchFlow {
    fn flow_type(&self) -> FlowType {
        FlowType::CarSearch
    }

    fn initial_phase(&self) -> DialoguePhase {
        DialoguePhase::Mandatory
    }

    fn transition(
        &self,
        current: &DialoguePhase,
        event: &DialogueEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_car_search(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn flow_type(&self) -> FlowType {
        self.flow.flow_type()
    }

    pub fn initial_phase(&self) -> DialoguePhase {
        self.flow.initial_phase()
    }

    pub fn apply(
        &self,
        current: &DialoguePhase,
        event: &DialogueEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.transition(current, event, context)
    }
}

impl Default for FlowEngine<CarSearchFlow> {
    fn default() -> Self {
        Self::new(CarSearchFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("mandatory criteria still unresolved in {phase:?}: {unresolved:?}")]
    UnresolvedMandatory { phase: DialoguePhase, unresolved: Vec<Criterion> },
    #[error("invalid transition from {phase:?} using event {event:?}")]
    InvalidTransition { phase: DialoguePhase, event: DialogueEvent },
}

fn transition_car_search(
    current: &DialoguePhase,
    event: &DialogueEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use DialogueEvent::{
        MandatoryResolved, ProceedRequested, SearchFailed, SearchFinished, UserLeft,
    };
    use DialoguePhase::{Abandoned, Completed, Failed, Mandatory, Optional, Searching};

    let to = match (current, event) {
        (Mandatory, MandatoryResolved) => {
            if !context.unresolved_mandatory.is_empty() {
                return Err(FlowTransitionError::UnresolvedMandatory {
                    phase: current.clone(),
                    unresolved: context.unresolved_mandatory.clone(),
                });
            }
            Optional
        }
        (Optional, ProceedRequested) => Searching,
        (Searching, SearchFinished) => Completed,
        (Searching, SearchFailed) => Failed,
        (Mandatory, UserLeft) | (Optional, UserLeft) => Abandoned,
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                phase: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone() })
}
