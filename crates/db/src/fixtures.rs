use chrono::Datelike;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use carfinder_core::domain::criterion::FUEL_TYPES;
use carfinder_core::domain::vehicle::VehicleRecord;

use crate::connection::DbPool;
use crate::repositories::vehicle::insert_vehicle;
use crate::repositories::RepositoryError;

pub const DEFAULT_SEED_COUNT: usize = 100;
pub const OLDEST_YEAR: i64 = 1980;

const MAKES_AND_MODELS: &[(&str, &[&str])] = &[
    ("Toyota", &["Corolla", "Camry", "Etios", "Hilux", "RAV4", "Yaris"]),
    ("Honda", &["Civic", "City", "Fit", "HR-V", "CR-V", "Accord"]),
    ("Volkswagen", &["Gol", "Polo", "Virtus", "T-Cross", "Jetta", "Amarok"]),
    ("Chevrolet", &["Onix", "Cruze", "Tracker", "S10", "Spin", "Celta"]),
    ("Fiat", &["Uno", "Palio", "Argo", "Mobi", "Toro", "Strada"]),
    ("Ford", &["Ka", "Fiesta", "Focus", "EcoSport", "Ranger", "Fusion"]),
    ("Hyundai", &["HB20", "Creta", "Tucson", "Elantra", "Santa Fe"]),
    ("Nissan", &["March", "Versa", "Sentra", "Kicks", "Frontier"]),
    ("Renault", &["Kwid", "Sandero", "Logan", "Duster", "Captur"]),
    ("Jeep", &["Renegade", "Compass", "Commander", "Wrangler"]),
    ("Kia", &["Picanto", "Rio", "Cerato", "Sportage", "Sorento"]),
    ("Lexus", &["UX", "NX", "RX", "ES", "IS"]),
    ("BMW", &["320i", "X1", "X3", "X5", "M3"]),
    ("Tesla", &["Model 3", "Model S", "Model X", "Model Y"]),
];

const COLORS: &[&str] =
    &["black", "white", "silver", "gray", "red", "blue", "green", "yellow", "orange", "brown"];

/// Fills `car_market` with random but plausible vehicles.
///
/// Mileage grows with age (12 000 to 15 000 km per year); prices are uniform
/// between 4 000 and 120 000 dollars.
#[derive(Clone, Copy, Debug)]
pub struct CatalogSeeder {
    count: usize,
}

impl Default for CatalogSeeder {
    fn default() -> Self {
        Self { count: DEFAULT_SEED_COUNT }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub inserted: usize,
    pub catalog_size: i64,
}

impl CatalogSeeder {
    pub fn with_count(count: usize) -> Self {
        Self { count }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn generate<R>(&self, rng: &mut R, current_year: i64) -> Vec<VehicleRecord>
    where
        R: Rng,
    {
        let current_year = current_year.max(OLDEST_YEAR);
        (0..self.count).map(|_| random_vehicle(&mut *rng, current_year)).collect()
    }

    /// Inserts the generated vehicles in a single transaction.
    pub async fn load(&self, pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
        let current_year = i64::from(chrono::Utc::now().year());
        let vehicles = self.generate(&mut rand::thread_rng(), current_year);

        let mut tx = pool.begin().await?;
        for vehicle in &vehicles {
            insert_vehicle(&mut *tx, vehicle).await?;
        }
        tx.commit().await?;

        let catalog_size: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM car_market").fetch_one(pool).await?;
        info!(event_name = "catalog.seeded", inserted = vehicles.len(), catalog_size);
        Ok(SeedSummary { inserted: vehicles.len(), catalog_size })
    }
}

fn random_vehicle<R>(rng: &mut R, current_year: i64) -> VehicleRecord
where
    R: Rng,
{
    let (make, models) = MAKES_AND_MODELS[rng.gen_range(0..MAKES_AND_MODELS.len())];
    let model = models[rng.gen_range(0..models.len())];
    let year = rng.gen_range(OLDEST_YEAR..=current_year);
    let age = current_year - year;

    VehicleRecord {
        id: None,
        make: make.to_string(),
        model: model.to_string(),
        year,
        color: COLORS.choose(rng).copied().unwrap_or("white").to_string(),
        fuel: FUEL_TYPES[rng.gen_range(0..FUEL_TYPES.len())],
        mileage: rng.gen_range(12_000 * age..=15_000 * age),
        dollar_price: Decimal::from(rng.gen_range(4_000_i64..=120_000)),
        is_new: age == 0 && rng.gen_bool(0.5),
        is_automatic: rng.gen_bool(0.5),
        has_air_conditioning: rng.gen_bool(0.5),
        has_charger_plug: rng.gen_bool(0.5),
        is_armored: rng.gen_bool(0.5),
        has_bt_radio: rng.gen_bool(0.5),
    }
}

#[cfg(test)]
mod tests {
    use carfinder_core::domain::filter::SearchFilter;
    use carfinder_core::search::VehicleSearch;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rust_decimal::Decimal;

    use super::{CatalogSeeder, MAKES_AND_MODELS, OLDEST_YEAR};
    use crate::migrations::run_pending;
    use crate::{connect_with_settings, SqlVehicleRepository};

    #[test]
    fn generated_vehicles_stay_within_catalog_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        let vehicles = CatalogSeeder::with_count(500).generate(&mut rng, 2026);

        assert_eq!(vehicles.len(), 500);
        for vehicle in &vehicles {
            assert!((OLDEST_YEAR..=2026).contains(&vehicle.year));
            let age = 2026 - vehicle.year;
            assert!((12_000 * age..=15_000 * age).contains(&vehicle.mileage));
            assert!(vehicle.dollar_price >= Decimal::from(4_000));
            assert!(vehicle.dollar_price <= Decimal::from(120_000));
            assert!(!vehicle.is_new || age == 0);
            let (_, models) = MAKES_AND_MODELS
                .iter()
                .find(|(make, _)| *make == vehicle.make)
                .expect("known make");
            assert!(models.contains(&vehicle.model.as_str()));
        }
    }

    #[test]
    fn same_seed_same_catalog() {
        let seeder = CatalogSeeder::with_count(10);
        let first = seeder.generate(&mut StdRng::seed_from_u64(42), 2026);
        let second = seeder.generate(&mut StdRng::seed_from_u64(42), 2026);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn load_inserts_rows_that_read_back_through_search() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");

        let summary = CatalogSeeder::with_count(30).load(&pool).await.expect("seed");
        assert_eq!(summary.inserted, 30);
        assert_eq!(summary.catalog_size, 30);

        let repository = SqlVehicleRepository::new(pool);
        let page = repository.search(&SearchFilter::default(), 100).await.expect("search");
        assert_eq!(page.len(), 30);
        assert!(page.iter().all(|vehicle| vehicle.id.is_some()));
    }
}
