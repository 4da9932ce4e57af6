use carfinder_db::{connect_with_config, migrations};

use crate::commands::{prepare, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("migrate") {
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
        let versions = migrations::applied_versions(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<Vec<i64>, StepFailure>(versions)
    });

    match result {
        Ok(versions) => {
            let listed =
                versions.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            CommandResult::success("migrate", format!("applied migrations: {listed}"))
        }
        Err(failure) => CommandResult::from_step("migrate", failure),
    }
}
