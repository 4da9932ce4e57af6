use carfinder_core::domain::criterion::FuelType;
use carfinder_core::domain::filter::SearchFilter;
use carfinder_core::search::VehicleSearch;
use carfinder_db::{connect_with_config, migrations, SqlVehicleRepository};
use clap::Args;

use crate::commands::{prepare, CommandResult, StepFailure};
use crate::presentation::{render_listing, NO_MATCH};

/// Catalog filters for a one-shot query. Unset flags leave the field open.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    #[arg(long)]
    pub make: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long, value_parser = parse_fuel)]
    pub fuel: Option<FuelType>,
    #[arg(long)]
    pub year_min: Option<i64>,
    #[arg(long)]
    pub year_max: Option<i64>,
    #[arg(long)]
    pub price_min: Option<i64>,
    #[arg(long)]
    pub price_max: Option<i64>,
    #[arg(long, help = "Maximum mileage in km")]
    pub mileage_max: Option<i64>,
    #[arg(long)]
    pub is_new: Option<bool>,
    #[arg(long)]
    pub automatic: Option<bool>,
    #[arg(long)]
    pub air_conditioning: Option<bool>,
    #[arg(long)]
    pub bt_radio: Option<bool>,
    #[arg(long)]
    pub charger_plug: Option<bool>,
    #[arg(long)]
    pub armored: Option<bool>,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

impl SearchArgs {
    pub fn to_filter(&self) -> SearchFilter {
        let text = |value: &Option<String>| {
            value.as_deref().map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
        };

        SearchFilter {
            make: text(&self.make),
            model: text(&self.model),
            fuel: self.fuel,
            year_min: self.year_min,
            year_max: self.year_max,
            price_min: self.price_min,
            price_max: self.price_max,
            mileage_max: self.mileage_max,
            is_new: self.is_new,
            is_automatic: self.automatic,
            has_air_conditioning: self.air_conditioning,
            has_bt_radio: self.bt_radio,
            has_charger_plug: self.charger_plug,
            is_armored: self.armored,
        }
    }
}

fn parse_fuel(value: &str) -> Result<FuelType, String> {
    FuelType::parse(value).ok_or_else(|| {
        format!("unknown fuel `{value}` (expected gasoline|flex|diesel|electric|hybrid)")
    })
}

pub fn run(args: SearchArgs) -> CommandResult {
    let (config, runtime) = match prepare("search") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };
    let filter = args.to_filter();

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlVehicleRepository::new(pool.clone());
        let records = repository
            .search(&filter, args.limit)
            .await
            .map_err(|error| ("search_unavailable", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<_, StepFailure>(records)
    });

    match result {
        Ok(records) if records.is_empty() => CommandResult::text(NO_MATCH),
        Ok(records) => CommandResult::text(render_listing(&records)),
        Err(failure) => CommandResult::from_step("search", failure),
    }
}
