pub mod relax;
pub mod sequencer;

pub use relax::{
    RelaxationLevel, RelaxationPlanner, RelaxedFilterView, HARD_NOTICE, SOFT_NOTICE,
};
pub use sequencer::SlotSequencer;
