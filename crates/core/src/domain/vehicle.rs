use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::criterion::FuelType;

/// One catalog row as returned by the search endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub color: String,
    pub fuel: FuelType,
    pub mileage: i64,
    pub dollar_price: Decimal,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_automatic: bool,
    #[serde(default)]
    pub has_air_conditioning: bool,
    #[serde(default)]
    pub has_charger_plug: bool,
    #[serde(default)]
    pub is_armored: bool,
    #[serde(default)]
    pub has_bt_radio: bool,
}
