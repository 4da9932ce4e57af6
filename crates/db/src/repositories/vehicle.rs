use std::str::FromStr;

use async_trait::async_trait;
use carfinder_core::domain::criterion::FuelType;
use carfinder_core::domain::filter::SearchFilter;
use carfinder_core::domain::vehicle::VehicleRecord;
use carfinder_core::search::{SearchError, VehicleSearch};
use rust_decimal::Decimal;
use sqlx::{Executor, QueryBuilder, Sqlite};
use tracing::debug;

use super::{effective_limit, RepositoryError, VehicleRepository};
use crate::DbPool;

const SELECT_VEHICLES: &str = "SELECT id, make, model, year, color, fuel, mileage, \
     CAST(dollar_price AS TEXT) AS dollar_price, is_new, is_automatic, has_air_conditioning, \
     has_charger_plug, is_armored, has_bt_radio FROM car_market WHERE 1 = 1";

pub struct SqlVehicleRepository {
    pool: DbPool,
}

impl SqlVehicleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn find(
        &self,
        filter: &SearchFilter,
        limit: u32,
    ) -> Result<Vec<VehicleRecord>, RepositoryError> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_VEHICLES);
        push_conditions(&mut query, filter);
        query.push(" ORDER BY id LIMIT ").push_bind(i64::from(effective_limit(limit)));

        let rows = query.build_query_as::<VehicleRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(VehicleRow::into_record).collect()
    }
}

#[async_trait]
impl VehicleSearch for SqlVehicleRepository {
    async fn search(
        &self,
        filter: &SearchFilter,
        limit: u32,
    ) -> Result<Vec<VehicleRecord>, SearchError> {
        let records = self.find(filter, limit).await?;
        debug!(
            event_name = "catalog.search",
            returned = records.len(),
            limit,
            "sqlite catalog queried"
        );
        Ok(records)
    }
}

#[async_trait]
impl VehicleRepository for SqlVehicleRepository {
    async fn insert(&self, vehicle: &VehicleRecord) -> Result<i64, RepositoryError> {
        Ok(insert_vehicle(&self.pool, vehicle).await?)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM car_market").fetch_one(&self.pool).await?)
    }
}

/// Inserts one row through any sqlite executor, including an open transaction.
pub(crate) async fn insert_vehicle<'e, E>(
    executor: E,
    vehicle: &VehicleRecord,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO car_market (
            make, model, year, color, fuel, mileage, dollar_price, is_new, is_automatic,
            has_air_conditioning, has_charger_plug, is_armored, has_bt_radio
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&vehicle.make)
    .bind(&vehicle.model)
    .bind(vehicle.year)
    .bind(&vehicle.color)
    .bind(vehicle.fuel.as_str())
    .bind(vehicle.mileage)
    .bind(vehicle.dollar_price.to_string())
    .bind(vehicle.is_new)
    .bind(vehicle.is_automatic)
    .bind(vehicle.has_air_conditioning)
    .bind(vehicle.has_charger_plug)
    .bind(vehicle.is_armored)
    .bind(vehicle.has_bt_radio)
    .execute(executor)
    .await?;
    Ok(result.last_insert_rowid())
}

fn push_conditions(query: &mut QueryBuilder<'_, Sqlite>, filter: &SearchFilter) {
    if let Some(make) = &filter.make {
        query.push(" AND make = ").push_bind(make.clone()).push(" COLLATE NOCASE");
    }
    if let Some(model) = &filter.model {
        query.push(" AND model = ").push_bind(model.clone()).push(" COLLATE NOCASE");
    }
    if let Some(fuel) = filter.fuel {
        query.push(" AND fuel = ").push_bind(fuel.as_str());
    }

    let bounds = [
        ("year >= ", filter.year_min),
        ("year <= ", filter.year_max),
        ("dollar_price >= ", filter.price_min),
        ("dollar_price <= ", filter.price_max),
        ("mileage <= ", filter.mileage_max),
    ];
    for (condition, bound) in bounds {
        if let Some(bound) = bound {
            query.push(" AND ").push(condition).push_bind(bound);
        }
    }

    let flags = [
        ("is_new", filter.is_new),
        ("is_automatic", filter.is_automatic),
        ("has_air_conditioning", filter.has_air_conditioning),
        ("has_bt_radio", filter.has_bt_radio),
        ("has_charger_plug", filter.has_charger_plug),
        ("is_armored", filter.is_armored),
    ];
    for (column, flag) in flags {
        if let Some(flag) = flag {
            query.push(" AND ").push(column).push(" = ").push_bind(flag);
        }
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: i64,
    make: String,
    model: String,
    year: i64,
    color: String,
    fuel: String,
    mileage: i64,
    dollar_price: String,
    is_new: bool,
    is_automatic: bool,
    has_air_conditioning: bool,
    has_charger_plug: bool,
    is_armored: bool,
    has_bt_radio: bool,
}

impl VehicleRow {
    fn into_record(self) -> Result<VehicleRecord, RepositoryError> {
        let fuel = FuelType::parse(&self.fuel).ok_or_else(|| {
            RepositoryError::Decode(format!(
                "car_market row {} has unknown fuel `{}`",
                self.id, self.fuel
            ))
        })?;
        let dollar_price = Decimal::from_str(&self.dollar_price).map_err(|error| {
            RepositoryError::Decode(format!(
                "car_market row {} has invalid price `{}`: {error}",
                self.id, self.dollar_price
            ))
        })?;

        Ok(VehicleRecord {
            id: Some(self.id),
            make: self.make,
            model: self.model,
            year: self.year,
            color: self.color,
            fuel,
            mileage: self.mileage,
            dollar_price,
            is_new: self.is_new,
            is_automatic: self.is_automatic,
            has_air_conditioning: self.has_air_conditioning,
            has_charger_plug: self.has_charger_plug,
            is_armored: self.is_armored,
            has_bt_radio: self.has_bt_radio,
        })
    }
}

#[cfg(test)]
mod tests {
    use carfinder_core::domain::criterion::FuelType;
    use carfinder_core::domain::filter::SearchFilter;
    use carfinder_core::domain::vehicle::VehicleRecord;
    use carfinder_core::search::{SearchError, VehicleSearch};
    use rust_decimal::Decimal;

    use super::SqlVehicleRepository;
    use crate::migrations::run_pending;
    use crate::repositories::VehicleRepository;
    use crate::{connect_with_settings, DbPool};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        pool
    }

    fn car(make: &str, model: &str, year: i64, price: Decimal, fuel: FuelType) -> VehicleRecord {
        VehicleRecord {
            id: None,
            make: make.to_string(),
            model: model.to_string(),
            year,
            color: "white".to_string(),
            fuel,
            mileage: 12_000 * (2026 - year),
            dollar_price: price,
            is_new: false,
            is_automatic: true,
            has_air_conditioning: true,
            has_charger_plug: false,
            is_armored: false,
            has_bt_radio: false,
        }
    }

    async fn stocked() -> SqlVehicleRepository {
        let repository = SqlVehicleRepository::new(migrated_pool().await);
        let stock = [
            car("Honda", "Civic", 2016, Decimal::new(1_990_050, 2), FuelType::Flex),
            car("Honda", "Fit", 2019, Decimal::new(20_000, 0), FuelType::Gasoline),
            car("Toyota", "Corolla", 2021, Decimal::new(31_500, 0), FuelType::Hybrid),
            car("Fiat", "Uno", 2008, Decimal::new(6_000, 0), FuelType::Flex),
        ];
        for car in &stock {
            repository.insert(car).await.expect("insert");
        }
        repository
    }

    #[tokio::test]
    async fn text_criteria_match_case_insensitively() {
        let repository = stocked().await;
        let filter = SearchFilter {
            make: Some("HONDA".to_string()),
            model: Some("civic".to_string()),
            ..SearchFilter::default()
        };

        let records = repository.search(&filter, 20).await.expect("search");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].model, "Civic");
        assert_eq!(records[0].dollar_price, Decimal::new(1_990_050, 2));
        assert_eq!(records[0].fuel, FuelType::Flex);
    }

    #[tokio::test]
    async fn bounds_are_inclusive_and_results_ordered_by_id() {
        let repository = stocked().await;
        let filter = SearchFilter {
            price_max: Some(20_000),
            year_min: Some(2008),
            ..SearchFilter::default()
        };

        let records = repository.search(&filter, 20).await.expect("search");

        let models: Vec<_> = records.iter().map(|record| record.model.as_str()).collect();
        assert_eq!(models, ["Civic", "Fit", "Uno"]);
        let ids: Vec<_> = records.iter().map(|record| record.id.expect("id")).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn fuel_flags_and_limit_narrow_the_page() {
        let repository = stocked().await;

        let hybrid = SearchFilter { fuel: Some(FuelType::Hybrid), ..SearchFilter::default() };
        assert_eq!(repository.search(&hybrid, 20).await.expect("search").len(), 1);

        let manual = SearchFilter { is_automatic: Some(false), ..SearchFilter::default() };
        assert!(repository.search(&manual, 20).await.expect("search").is_empty());

        let everything = SearchFilter::default();
        assert_eq!(repository.search(&everything, 2).await.expect("search").len(), 2);
        assert_eq!(repository.search(&everything, 0).await.expect("search").len(), 4);
        assert_eq!(repository.count().await.expect("count"), 4);
    }

    #[tokio::test]
    async fn closed_pool_is_a_failure_not_an_empty_page() {
        let repository = stocked().await;
        repository.pool().close().await;

        let error = repository.search(&SearchFilter::default(), 20).await.expect_err("closed");
        assert!(matches!(error, SearchError::Unavailable(_)));
    }
}
