use std::fmt;

use serde::{Deserialize, Serialize};

/// One searchable vehicle attribute.
///
/// The five mandatory criteria are interrogated in [`MANDATORY_ORDER`]; the
/// optional ones are gathered free-form once the mandatory phase is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    BudgetCeiling,
    Brand,
    Model,
    MinimumYear,
    FuelType,
    MileageCeiling,
    IsNew,
    IsAutomatic,
    HasAirConditioning,
    HasBluetoothRadio,
    HasChargerPlug,
    IsArmored,
}

/// Declared value type of a criterion, as exposed to the extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    Text,
    Numeric,
    Fuel,
    Flag,
}

impl CriterionKind {
    /// Type name handed to the extractor alongside the current-criterion hint.
    pub fn declared_type(self) -> &'static str {
        match self {
            Self::Text | Self::Fuel => "string",
            Self::Numeric => "numeric",
            Self::Flag => "boolean",
        }
    }

    pub fn is_waivable(self) -> bool {
        !matches!(self, Self::Flag)
    }
}

pub const MANDATORY_ORDER: [Criterion; 5] = [
    Criterion::BudgetCeiling,
    Criterion::Brand,
    Criterion::Model,
    Criterion::MinimumYear,
    Criterion::FuelType,
];

pub const OPTIONAL_CRITERIA: [Criterion; 7] = [
    Criterion::MileageCeiling,
    Criterion::IsNew,
    Criterion::IsAutomatic,
    Criterion::HasAirConditioning,
    Criterion::HasBluetoothRadio,
    Criterion::HasChargerPlug,
    Criterion::IsArmored,
];

pub const ALL_CRITERIA: [Criterion; 12] = [
    Criterion::BudgetCeiling,
    Criterion::Brand,
    Criterion::Model,
    Criterion::MinimumYear,
    Criterion::FuelType,
    Criterion::MileageCeiling,
    Criterion::IsNew,
    Criterion::IsAutomatic,
    Criterion::HasAirConditioning,
    Criterion::HasBluetoothRadio,
    Criterion::HasChargerPlug,
    Criterion::IsArmored,
];

impl Criterion {
    /// Key used on the wire: extractor JSON, search filter and catalog column.
    pub fn key(self) -> &'static str {
        match self {
            Self::BudgetCeiling => "price_max",
            Self::Brand => "make",
            Self::Model => "model",
            Self::MinimumYear => "year_min",
            Self::FuelType => "fuel",
            Self::MileageCeiling => "mileage_max",
            Self::IsNew => "is_new",
            Self::IsAutomatic => "is_automatic",
            Self::HasAirConditioning => "has_air_conditioning",
            Self::HasBluetoothRadio => "has_bt_radio",
            Self::HasChargerPlug => "has_charger_plug",
            Self::IsArmored => "is_armored",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ALL_CRITERIA.into_iter().find(|criterion| criterion.key() == key)
    }

    pub fn kind(self) -> CriterionKind {
        match self {
            Self::Brand | Self::Model => CriterionKind::Text,
            Self::FuelType => CriterionKind::Fuel,
            Self::BudgetCeiling | Self::MinimumYear | Self::MileageCeiling => {
                CriterionKind::Numeric
            }
            Self::IsNew
            | Self::IsAutomatic
            | Self::HasAirConditioning
            | Self::HasBluetoothRadio
            | Self::HasChargerPlug
            | Self::IsArmored => CriterionKind::Flag,
        }
    }

    pub fn is_mandatory(self) -> bool {
        MANDATORY_ORDER.contains(&self)
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    Gasoline,
    Flex,
    Diesel,
    Electric,
    Hybrid,
}

pub const FUEL_TYPES: [FuelType; 5] =
    [FuelType::Gasoline, FuelType::Flex, FuelType::Diesel, FuelType::Electric, FuelType::Hybrid];

impl FuelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gasoline => "gasoline",
            Self::Flex => "flex",
            Self::Diesel => "diesel",
            Self::Electric => "electric",
            Self::Hybrid => "hybrid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        FUEL_TYPES.into_iter().find(|fuel| fuel.as_str() == normalized)
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{Criterion, CriterionKind, FuelType, ALL_CRITERIA, MANDATORY_ORDER};

    #[test]
    fn every_criterion_round_trips_through_its_wire_key() {
        for criterion in ALL_CRITERIA {
            assert_eq!(Criterion::from_key(criterion.key()), Some(criterion));
        }
        assert_eq!(Criterion::from_key("color"), None);
    }

    #[test]
    fn mandatory_order_starts_with_budget_and_ends_with_fuel() {
        assert_eq!(MANDATORY_ORDER.first(), Some(&Criterion::BudgetCeiling));
        assert_eq!(MANDATORY_ORDER.last(), Some(&Criterion::FuelType));
        assert!(MANDATORY_ORDER.iter().all(|criterion| criterion.is_mandatory()));
        assert!(!Criterion::MileageCeiling.is_mandatory());
    }

    #[test]
    fn flags_are_the_only_non_waivable_kind() {
        assert!(!Criterion::IsArmored.kind().is_waivable());
        assert!(Criterion::Brand.kind().is_waivable());
        assert_eq!(Criterion::MinimumYear.kind(), CriterionKind::Numeric);
        assert_eq!(Criterion::FuelType.kind().declared_type(), "string");
    }

    #[test]
    fn fuel_parsing_is_case_insensitive() {
        assert_eq!(FuelType::parse(" Hybrid "), Some(FuelType::Hybrid));
        assert_eq!(FuelType::parse("steam"), None);
    }
}
