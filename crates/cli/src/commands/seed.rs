use carfinder_db::{connect_with_config, migrations, CatalogSeeder, SeedSummary};

use crate::commands::{prepare, CommandResult, StepFailure};

pub fn run(count: usize) -> CommandResult {
    if count == 0 {
        return CommandResult::failure(
            "seed",
            "invalid_argument",
            "--count must be at least 1",
            2,
        );
    }

    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let summary = CatalogSeeder::with_count(count)
            .load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<SeedSummary, StepFailure>(summary)
    });

    match result {
        Ok(summary) => CommandResult::success("seed", summary_message(&summary)),
        Err(failure) => CommandResult::from_step("seed", failure),
    }
}

fn summary_message(summary: &SeedSummary) -> String {
    format!(
        "inserted {} vehicles; catalog now holds {}",
        summary.inserted, summary.catalog_size
    )
}

#[cfg(test)]
mod tests {
    use carfinder_db::SeedSummary;

    use super::{run, summary_message};

    #[test]
    fn summary_names_both_counts() {
        let message = summary_message(&SeedSummary { inserted: 25, catalog_size: 125 });
        assert_eq!(message, "inserted 25 vehicles; catalog now holds 125");
    }

    #[test]
    fn zero_count_is_rejected_before_touching_the_database() {
        let result = run(0);
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("\"error_class\":\"invalid_argument\""));
    }
}
