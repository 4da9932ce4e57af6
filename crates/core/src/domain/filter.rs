use serde::{Deserialize, Serialize};

use crate::domain::criterion::FuelType;

/// Positive catalog filter. Absent fields do not constrain the search and are
/// omitted from the wire form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel: Option<FuelType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_automatic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_air_conditioning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_bt_radio: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_charger_plug: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_armored: Option<bool>,
}

impl SearchFilter {
    pub fn is_unconstrained(&self) -> bool {
        self == &Self::default()
    }
}
