use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::domain::criterion::{Criterion, CriterionKind, FuelType, MANDATORY_ORDER};
use crate::domain::filter::SearchFilter;

/// Tri-state criterion value: never addressed, explicitly waived, or set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TriState<T> {
    #[default]
    Unset,
    Waived,
    Value(T),
}

impl<T> TriState<T> {
    pub fn as_ref(&self) -> TriState<&T> {
        match self {
            Self::Unset => TriState::Unset,
            Self::Waived => TriState::Waived,
            Self::Value(value) => TriState::Value(value),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }

    pub fn is_waived(&self) -> bool {
        matches!(self, Self::Waived)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Unset | Self::Waived => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CriterionValue {
    Text(String),
    Integer(i64),
    Fuel(FuelType),
    Flag(bool),
}

impl CriterionValue {
    /// Empty text and zero are the waive sentinels; flags never waive.
    pub fn is_waiver(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Integer(value) => *value == 0,
            Self::Fuel(_) | Self::Flag(_) => false,
        }
    }

    /// The sentinel an extractor uses to waive a criterion of this kind.
    pub fn waiver(kind: CriterionKind) -> Option<Self> {
        match kind {
            CriterionKind::Text | CriterionKind::Fuel => Some(Self::Text(String::new())),
            CriterionKind::Numeric => Some(Self::Integer(0)),
            CriterionKind::Flag => None,
        }
    }

    /// Decodes an extractor value for a criterion kind.
    ///
    /// `null` on a waivable kind means "waive"; anything that does not fit the
    /// declared type yields `None` so the caller can drop the key.
    pub fn from_json(kind: CriterionKind, value: &Value) -> Option<Self> {
        match (kind, value) {
            (CriterionKind::Flag, Value::Bool(flag)) => Some(Self::Flag(*flag)),
            (CriterionKind::Flag, _) => None,
            (_, Value::Null) => Self::waiver(kind),
            (CriterionKind::Text, Value::String(text)) => Some(Self::Text(text.trim().to_string())),
            (CriterionKind::Fuel, Value::String(text)) if text.trim().is_empty() => {
                Some(Self::Text(String::new()))
            }
            (CriterionKind::Fuel, Value::String(text)) => FuelType::parse(text).map(Self::Fuel),
            (CriterionKind::Numeric, Value::Number(number)) => {
                if let Some(integer) = number.as_i64() {
                    return (integer >= 0).then_some(Self::Integer(integer));
                }
                number
                    .as_f64()
                    .filter(|float| float.is_finite() && *float >= 0.0 && *float <= i64::MAX as f64)
                    .map(|float| Self::Integer(float.trunc() as i64))
            }
            _ => None,
        }
    }

    fn fits(&self, kind: CriterionKind) -> bool {
        match (self, kind) {
            (Self::Text(_), CriterionKind::Text) => true,
            (Self::Text(text), CriterionKind::Fuel) => text.trim().is_empty(),
            (Self::Fuel(_), CriterionKind::Fuel) => true,
            (Self::Integer(value), CriterionKind::Numeric) => *value >= 0,
            (Self::Flag(_), CriterionKind::Flag) => true,
            _ => false,
        }
    }
}

/// Partial criterion update produced by one extraction turn, in arrival order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CriteriaUpdate {
    entries: Vec<(Criterion, CriterionValue)>,
}

impl CriteriaUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only known keys whose values match the declared type.
    pub fn from_json_object(object: &Map<String, Value>) -> Self {
        let mut update = Self::new();
        for (key, raw) in object {
            let Some(criterion) = Criterion::from_key(key) else {
                continue;
            };
            if let Some(value) = CriterionValue::from_json(criterion.kind(), raw) {
                update.insert(criterion, value);
            }
        }
        update
    }

    pub fn waive(criterion: Criterion) -> Self {
        let mut update = Self::new();
        if let Some(value) = CriterionValue::waiver(criterion.kind()) {
            update.insert(criterion, value);
        }
        update
    }

    pub fn with(mut self, criterion: Criterion, value: CriterionValue) -> Self {
        self.insert(criterion, value);
        self
    }

    pub fn insert(&mut self, criterion: Criterion, value: CriterionValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(existing, _)| *existing == criterion) {
            entry.1 = value;
        } else {
            self.entries.push((criterion, value));
        }
    }

    pub fn get(&self, criterion: Criterion) -> Option<&CriterionValue> {
        self.entries.iter().find(|(existing, _)| *existing == criterion).map(|(_, value)| value)
    }

    pub fn criteria(&self) -> Vec<Criterion> {
        self.entries.iter().map(|(criterion, _)| *criterion).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Criterion, &CriterionValue)> {
        self.entries.iter().map(|(criterion, value)| (*criterion, value))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Everything known about the buyer's criteria so far.
///
/// Criteria that were never addressed stay [`TriState::Unset`]; there is no
/// operation that moves a criterion back to `Unset`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotState {
    slots: BTreeMap<Criterion, TriState<CriterionValue>>,
}

impl SlotState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, criterion: Criterion) -> TriState<&CriterionValue> {
        self.slots.get(&criterion).map(TriState::as_ref).unwrap_or(TriState::Unset)
    }

    /// Records a value, or a waiver when `value` is the kind's sentinel.
    ///
    /// Returns `false` and leaves the state untouched when the value does not
    /// fit the criterion's declared type.
    pub fn apply(&mut self, criterion: Criterion, value: CriterionValue) -> bool {
        let kind = criterion.kind();
        if !value.fits(kind) {
            return false;
        }

        let next = if kind.is_waivable() && value.is_waiver() {
            TriState::Waived
        } else {
            match value {
                CriterionValue::Text(text) => {
                    TriState::Value(CriterionValue::Text(text.trim().to_string()))
                }
                other => TriState::Value(other),
            }
        };
        self.slots.insert(criterion, next);
        true
    }

    /// Applies every entry of an update and returns how many criteria changed state.
    pub fn apply_update(&mut self, update: &CriteriaUpdate) -> usize {
        let mut changed = 0;
        for (criterion, value) in update.iter() {
            if self.apply(criterion, value.clone()) {
                changed += 1;
            }
        }
        changed
    }

    pub fn waive(&mut self, criterion: Criterion) {
        if criterion.kind().is_waivable() {
            self.slots.insert(criterion, TriState::Waived);
        }
    }

    pub fn text(&self, criterion: Criterion) -> Option<&str> {
        match self.get(criterion) {
            TriState::Value(CriterionValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, criterion: Criterion) -> Option<i64> {
        match self.get(criterion) {
            TriState::Value(CriterionValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn fuel(&self) -> Option<FuelType> {
        match self.get(Criterion::FuelType) {
            TriState::Value(CriterionValue::Fuel(fuel)) => Some(*fuel),
            _ => None,
        }
    }

    pub fn flag(&self, criterion: Criterion) -> Option<bool> {
        match self.get(criterion) {
            TriState::Value(CriterionValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }

    pub fn mandatory_resolved(&self) -> bool {
        MANDATORY_ORDER.iter().all(|criterion| !self.get(*criterion).is_unset())
    }

    /// Positive search filter: only criteria holding a concrete value.
    pub fn to_filter(&self) -> SearchFilter {
        SearchFilter {
            make: self.text(Criterion::Brand).map(str::to_string),
            model: self.text(Criterion::Model).map(str::to_string),
            fuel: self.fuel(),
            year_min: self.integer(Criterion::MinimumYear),
            year_max: None,
            price_min: None,
            price_max: self.integer(Criterion::BudgetCeiling),
            mileage_max: self.integer(Criterion::MileageCeiling),
            is_new: self.flag(Criterion::IsNew),
            is_automatic: self.flag(Criterion::IsAutomatic),
            has_air_conditioning: self.flag(Criterion::HasAirConditioning),
            has_bt_radio: self.flag(Criterion::HasBluetoothRadio),
            has_charger_plug: self.flag(Criterion::HasChargerPlug),
            is_armored: self.flag(Criterion::IsArmored),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CriteriaUpdate, CriterionValue, SlotState, TriState};
    use crate::domain::criterion::{Criterion, FuelType, MANDATORY_ORDER};

    #[test]
    fn waive_sentinel_moves_mandatory_criteria_to_waived() {
        for criterion in MANDATORY_ORDER {
            let mut state = SlotState::new();
            let sentinel = CriterionValue::waiver(criterion.kind()).expect("waivable");
            assert!(state.apply(criterion, sentinel));
            assert_eq!(state.get(criterion), TriState::Waived, "{criterion}");
        }
    }

    #[test]
    fn concrete_values_are_stored_as_values() {
        let mut state = SlotState::new();
        state.apply(Criterion::Brand, CriterionValue::Text("  Honda ".to_string()));
        state.apply(Criterion::BudgetCeiling, CriterionValue::Integer(30_000));
        state.apply(Criterion::IsArmored, CriterionValue::Flag(false));

        assert_eq!(state.text(Criterion::Brand), Some("Honda"));
        assert_eq!(state.integer(Criterion::BudgetCeiling), Some(30_000));
        assert_eq!(state.flag(Criterion::IsArmored), Some(false));
        assert!(state.get(Criterion::Model).is_unset());
    }

    fn absorb(state: &mut SlotState, payload: serde_json::Value) -> usize {
        let update = CriteriaUpdate::from_json_object(payload.as_object().expect("object"));
        state.apply_update(&update)
    }

    #[test]
    fn whitespace_only_text_waives_the_criterion() {
        let mut state = SlotState::new();
        assert!(state.apply(Criterion::Brand, CriterionValue::Text("   ".into())));
        assert_eq!(state.get(Criterion::Brand), TriState::Waived);

        assert_eq!(absorb(&mut state, json!({ "model": " \t " })), 1);
        assert_eq!(state.get(Criterion::Model), TriState::Waived);
        assert_eq!(state.to_filter().make, None);
    }

    #[test]
    fn unknown_keys_and_mismatched_values_are_ignored() {
        let mut state = SlotState::new();
        let changed = absorb(
            &mut state,
            json!({ "color": "red", "price_max": "cheap", "fuel": "steam", "is_new": "yes" }),
        );
        assert_eq!(changed, 0);
        assert!(!state.apply(Criterion::Brand, CriterionValue::Integer(3)));
        assert_eq!(state, SlotState::new());
    }

    #[test]
    fn null_waives_text_and_numeric_but_not_flags() {
        let mut state = SlotState::new();
        let changed = absorb(&mut state, json!({ "make": null, "year_min": null, "is_new": null }));

        assert_eq!(changed, 2);
        assert!(state.get(Criterion::Brand).is_waived());
        assert!(state.get(Criterion::MinimumYear).is_waived());
        assert!(state.get(Criterion::IsNew).is_unset());
    }

    #[test]
    fn whole_floats_are_accepted_for_numeric_criteria() {
        let mut state = SlotState::new();
        let changed = absorb(&mut state, json!({ "price_max": 30000.0, "mileage_max": -5 }));

        assert_eq!(changed, 1);
        assert_eq!(state.integer(Criterion::BudgetCeiling), Some(30_000));
        assert!(state.get(Criterion::MileageCeiling).is_unset());
    }

    #[test]
    fn update_parsing_keeps_only_known_well_typed_keys() {
        let object = json!({
            "make": "Fiat",
            "year_min": 2017,
            "fuel": "Hybrid",
            "is_new": true,
            "color": "blue",
            "price_max": "lots"
        });
        let update = CriteriaUpdate::from_json_object(object.as_object().expect("object"));

        assert_eq!(update.len(), 4);
        assert_eq!(update.get(Criterion::FuelType), Some(&CriterionValue::Fuel(FuelType::Hybrid)));
        assert!(update.get(Criterion::BudgetCeiling).is_none());
    }

    #[test]
    fn filter_contains_only_value_state_criteria() {
        let mut state = SlotState::new();
        state.apply(Criterion::BudgetCeiling, CriterionValue::Integer(20_000));
        state.apply(Criterion::Brand, CriterionValue::Text(String::new()));
        state.apply(Criterion::FuelType, CriterionValue::Fuel(FuelType::Diesel));
        state.apply(Criterion::HasBluetoothRadio, CriterionValue::Flag(true));

        let filter = state.to_filter();
        assert_eq!(filter.price_max, Some(20_000));
        assert_eq!(filter.make, None);
        assert_eq!(filter.model, None);
        assert_eq!(filter.fuel, Some(FuelType::Diesel));
        assert_eq!(filter.has_bt_radio, Some(true));

        let wire = serde_json::to_value(&filter).expect("serialize");
        assert_eq!(wire, json!({ "price_max": 20000, "fuel": "diesel", "has_bt_radio": true }));
    }

    #[test]
    fn resolved_mandatory_criteria_never_revert_to_unset() {
        let mut state = SlotState::new();
        for criterion in MANDATORY_ORDER {
            state.waive(criterion);
        }
        assert!(state.mandatory_resolved());

        let flag = CriteriaUpdate::new().with(Criterion::IsNew, CriterionValue::Flag(true));
        state.apply_update(&flag);
        assert!(state.mandatory_resolved());
    }
}
