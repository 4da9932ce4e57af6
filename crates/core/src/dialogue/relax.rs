use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::criterion::Criterion;
use crate::domain::filter::SearchFilter;
use crate::domain::slots::{CriterionValue, SlotState};

pub const YEAR_FLOOR: i64 = 1980;
pub const YEAR_STEP_BACK: i64 = 3;

pub const SOFT_NOTICE: &str = "No exact match. Looking for similar results...";
pub const HARD_NOTICE: &str = "Querying additional similar cars...";

/// Widening steps applied when a search under-delivers.
///
/// The order is a product policy: model and numeric bounds loosen first,
/// the brand is dropped only at the last step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationLevel {
    /// Waive the model, step the minimum year back, raise the budget by 25%.
    Soft,
    /// Waive the brand.
    Hard,
}

impl RelaxationLevel {
    /// Message shown to the user right before a query at this level runs.
    pub fn notice(self) -> &'static str {
        match self {
            Self::Soft => SOFT_NOTICE,
            Self::Hard => HARD_NOTICE,
        }
    }
}

impl fmt::Display for RelaxationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soft => f.write_str("soft"),
            Self::Hard => f.write_str("hard"),
        }
    }
}

/// Widened copy of the criteria for one retry attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelaxedFilterView {
    pub levels: Vec<RelaxationLevel>,
    slots: SlotState,
}

impl RelaxedFilterView {
    pub fn slots(&self) -> &SlotState {
        &self.slots
    }

    pub fn filter(&self) -> SearchFilter {
        self.slots.to_filter()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RelaxationPlanner;

impl RelaxationPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Applies one widening step to a copy of `state`.
    pub fn relax(&self, state: &SlotState, level: RelaxationLevel) -> RelaxedFilterView {
        self.widen(state.clone(), Vec::new(), level)
    }

    /// Applies a further step on top of an already relaxed view.
    pub fn escalate(&self, view: &RelaxedFilterView, level: RelaxationLevel) -> RelaxedFilterView {
        self.widen(view.slots.clone(), view.levels.clone(), level)
    }

    fn widen(
        &self,
        mut slots: SlotState,
        mut levels: Vec<RelaxationLevel>,
        level: RelaxationLevel,
    ) -> RelaxedFilterView {
        match level {
            RelaxationLevel::Soft => {
                slots.waive(Criterion::Model);

                if let Some(year) = slots.integer(Criterion::MinimumYear) {
                    if year > YEAR_FLOOR {
                        let relaxed = (year - YEAR_STEP_BACK).max(YEAR_FLOOR);
                        slots.apply(Criterion::MinimumYear, CriterionValue::Integer(relaxed));
                    }
                }

                if let Some(budget) = slots.integer(Criterion::BudgetCeiling) {
                    let raised = CriterionValue::Integer(raise_budget(budget));
                    slots.apply(Criterion::BudgetCeiling, raised);
                }
            }
            RelaxationLevel::Hard => slots.waive(Criterion::Brand),
        }

        levels.push(level);
        RelaxedFilterView { levels, slots }
    }
}

fn raise_budget(budget: i64) -> i64 {
    let raised = Decimal::from(budget) * Decimal::new(125, 2);
    raised.trunc().to_i64().unwrap_or(i64::MAX)
}
