use crate::domain::criterion::{Criterion, MANDATORY_ORDER, OPTIONAL_CRITERIA};
use crate::domain::slots::SlotState;

const MANDATORY_PROMPTS: [(Criterion, &str); 5] = [
    (Criterion::BudgetCeiling, "Do you have a budget in USD? (e.g., 'under 20k')"),
    (Criterion::Brand, "Any preferred brand? (e.g., Toyota, Lexus; or 'any')"),
    (Criterion::Model, "Any specific model? (you can skip)"),
    (Criterion::MinimumYear, "Minimum fabrication year? (e.g., 'since 2018')"),
    (
        Criterion::FuelType,
        "Preferred fuel? (gasoline, flex, diesel, electric, hybrid; or 'any')",
    ),
];

const OPTIONAL_LABELS: [(Criterion, &str); 7] = [
    (Criterion::MileageCeiling, "mileage max"),
    (Criterion::IsNew, "new or used"),
    (Criterion::IsAutomatic, "automatic or manual"),
    (Criterion::HasAirConditioning, "air conditioning"),
    (Criterion::HasBluetoothRadio, "Bluetooth radio"),
    (Criterion::HasChargerPlug, "charger plug"),
    (Criterion::IsArmored, "armored"),
];

const OPTIONAL_MENU_HEADER: &str = "Any extra constraints before I search?";
const OPTIONAL_MENU_FOOTER: &str = "(If none, type 'search')";

/// Picks the next mandatory criterion to ask about, from static tables only.
#[derive(Clone, Copy, Debug)]
pub struct SlotSequencer {
    order: &'static [Criterion],
}

impl Default for SlotSequencer {
    fn default() -> Self {
        Self { order: &MANDATORY_ORDER }
    }
}

impl SlotSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// First mandatory criterion, in declared order, that is still unset.
    pub fn next_mandatory_gap(&self, state: &SlotState) -> Option<Criterion> {
        self.order.iter().copied().find(|criterion| state.get(*criterion).is_unset())
    }

    /// Interrogation text for a mandatory criterion.
    pub fn prompt_for(&self, criterion: Criterion) -> Option<&'static str> {
        MANDATORY_PROMPTS
            .iter()
            .find(|(candidate, _)| *candidate == criterion)
            .map(|(_, prompt)| *prompt)
    }

    pub fn optional_menu(&self) -> String {
        let mut menu = String::from(OPTIONAL_MENU_HEADER);
        for criterion in OPTIONAL_CRITERIA {
            if let Some((_, label)) = OPTIONAL_LABELS.iter().find(|(item, _)| *item == criterion) {
                menu.push_str("\n- ");
                menu.push_str(label);
            }
        }
        menu.push('\n');
        menu.push_str(OPTIONAL_MENU_FOOTER);
        menu
    }
}
