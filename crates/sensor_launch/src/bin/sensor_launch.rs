//! Sensor Launch CLI
//!
//! Usage:
//!   sensor_launch icm_20948
//!   sensor_launch icm_20948 port:=/dev/ttyUSB0 debug:=true
//!   sensor_launch launch/icm_20948.launch.yaml --dry-run
//!   sensor_launch icm_20948 --show-args

use anyhow::{bail, Context, Result};
use sensor_launch::cli::format_arguments;
use sensor_launch::config::AmentIndex;
use sensor_launch::descriptors;
use sensor_launch::{
    launch, LaunchArgs, LaunchDescription, LaunchFile, LaunchPlan, ProcessSpawner,
};
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    let args: LaunchArgs = argh::from_env();

    // Initialize logging
    let env = env_logger::Env::default().default_filter_or(args.log_filter());
    env_logger::init_from_env(env);

    if let Err(e) = run(args).await {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn load(args: &LaunchArgs, locator: &AmentIndex) -> Result<LaunchDescription> {
    if args.is_launch_file() {
        log::info!("Loading launch file: {}", args.descriptor);
        let launch_file = LaunchFile::from_file(&args.descriptor)
            .with_context(|| format!("Failed to load launch file '{}'", args.descriptor))?;
        return launch_file
            .to_description(locator)
            .with_context(|| format!("Failed to build launch file '{}'", args.descriptor));
    }

    match descriptors::builtin(&args.descriptor, locator) {
        Some(description) => description
            .with_context(|| format!("Failed to build description '{}'", args.descriptor)),
        None => bail!(
            "Unknown description '{}'. Built-in: {}; or pass a .launch.yaml path",
            args.descriptor,
            descriptors::BUILTIN.join(", ")
        ),
    }
}

async fn run(args: LaunchArgs) -> Result<()> {
    let locator =
        AmentIndex::from_env().with_prefixes_first(args.prefix_path.iter().cloned());
    let mut description = load(&args, &locator)?;

    // Show-args mode
    if args.show_args {
        print!("{}", format_arguments(description.arguments()));
        return Ok(());
    }

    let registry = description.arguments_mut();
    registry.set_policy(args.unknown_args);
    registry
        .set_overrides(args.overrides.iter().cloned())
        .context("Invalid launch argument override")?;

    // Dry run mode
    if args.is_dry_run() {
        let plan = LaunchPlan::build(&description).context("Failed to generate launch plan")?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            println!("{}", plan);
        }
        return Ok(());
    }

    let shutdown_timeout = Duration::from_secs(args.shutdown_timeout);
    let mut spawner = ProcessSpawner::new().with_locator(locator);

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // Set up Ctrl+C handler
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, initiating shutdown...");
        let _ = shutdown_tx.send(());
    })
    .context("Error setting Ctrl+C handler")?;

    let summary = match launch(&description, &mut spawner) {
        Ok(summary) => summary,
        Err(e) => {
            spawner.shutdown(shutdown_timeout).await;
            return Err(e).context("Launch failed");
        }
    };

    if let Err(e) = spawner.check() {
        spawner.shutdown(shutdown_timeout).await;
        return Err(e).context("Launch failed");
    }

    log::info!(
        "Launched {} processes ({} groups skipped)",
        summary.emitted,
        summary.groups_pruned
    );

    // Wait for shutdown signal or all processes to exit
    spawner.wait(shutdown_rx).await;
    spawner.shutdown(shutdown_timeout).await;

    log::info!("Sensor launcher exiting");
    Ok(())
}
