pub mod engine;
pub mod states;

pub use engine::{CarSearchFlow, FlowDefinition, FlowEngine, FlowTransitionError};
pub use states::{DialogueEvent, DialoguePhase, FlowContext, FlowType, TransitionOutcome};
