use async_trait::async_trait;
use carfinder_core::domain::filter::SearchFilter;
use carfinder_core::domain::vehicle::VehicleRecord;
use carfinder_core::search::{SearchError, VehicleSearch};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::{effective_limit, RepositoryError, VehicleRepository};

/// Catalog kept in a vector, matching exactly like the sqlite repository.
#[derive(Default)]
pub struct InMemoryVehicleRepository {
    vehicles: RwLock<Vec<VehicleRecord>>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog with ids assigned in insertion order, starting at 1.
    pub fn with_vehicles(vehicles: impl IntoIterator<Item = VehicleRecord>) -> Self {
        let vehicles = vehicles
            .into_iter()
            .zip(1_i64..)
            .map(|(vehicle, id)| VehicleRecord { id: Some(id), ..vehicle })
            .collect();
        Self { vehicles: RwLock::new(vehicles) }
    }
}

#[async_trait]
impl VehicleSearch for InMemoryVehicleRepository {
    async fn search(
        &self,
        filter: &SearchFilter,
        limit: u32,
    ) -> Result<Vec<VehicleRecord>, SearchError> {
        let vehicles = self.vehicles.read().await;
        let page = effective_limit(limit) as usize;
        Ok(vehicles
            .iter()
            .filter(|vehicle| satisfies(filter, vehicle))
            .take(page)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn insert(&self, vehicle: &VehicleRecord) -> Result<i64, RepositoryError> {
        let mut vehicles = self.vehicles.write().await;
        let id = vehicles.iter().filter_map(|existing| existing.id).max().unwrap_or(0) + 1;
        vehicles.push(VehicleRecord { id: Some(id), ..vehicle.clone() });
        Ok(id)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(self.vehicles.read().await.len() as i64)
    }
}

fn satisfies(filter: &SearchFilter, vehicle: &VehicleRecord) -> bool {
    let text_ok = |wanted: &Option<String>, actual: &str| {
        wanted.as_deref().map_or(true, |wanted| wanted.eq_ignore_ascii_case(actual))
    };
    let at_least = |bound: Option<i64>, actual: i64| bound.map_or(true, |bound| actual >= bound);
    let at_most = |bound: Option<i64>, actual: i64| bound.map_or(true, |bound| actual <= bound);
    let price_ok = |bound: Option<i64>, keep: fn(&Decimal, &Decimal) -> bool| {
        bound.map_or(true, |bound| keep(&vehicle.dollar_price, &Decimal::from(bound)))
    };
    let flag_ok = |wanted: Option<bool>, actual: bool| wanted.map_or(true, |want| want == actual);

    text_ok(&filter.make, &vehicle.make)
        && text_ok(&filter.model, &vehicle.model)
        && filter.fuel.map_or(true, |fuel| fuel == vehicle.fuel)
        && at_least(filter.year_min, vehicle.year)
        && at_most(filter.year_max, vehicle.year)
        && price_ok(filter.price_min, Decimal::ge)
        && price_ok(filter.price_max, Decimal::le)
        && at_most(filter.mileage_max, vehicle.mileage)
        && flag_ok(filter.is_new, vehicle.is_new)
        && flag_ok(filter.is_automatic, vehicle.is_automatic)
        && flag_ok(filter.has_air_conditioning, vehicle.has_air_conditioning)
        && flag_ok(filter.has_bt_radio, vehicle.has_bt_radio)
        && flag_ok(filter.has_charger_plug, vehicle.has_charger_plug)
        && flag_ok(filter.is_armored, vehicle.is_armored)
}
