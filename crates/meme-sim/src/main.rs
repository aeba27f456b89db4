use anyhow::Context;
use clap::Parser;

use meme_sim::{run, Scenario, SimConfig};

#[derive(Parser, Debug)]
#[command(name = "meme-sim")]
#[command(about = "Run launch and settlement scenarios against the in-memory host")]
struct Args {
    /// Path to simulation configuration file
    #[arg(short, long, default_value = "meme-sim.toml")]
    config: String,

    /// Path to scenario file
    #[arg(short, long, default_value = "scenarios/lifecycle.toml")]
    scenario: String,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    init: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    if args.init {
        SimConfig::default()
            .save(&args.config)
            .with_context(|| format!("writing default configuration to {}", args.config))?;
        log::info!("Wrote default configuration to {}", args.config);
        return Ok(());
    }

    let config = SimConfig::load(&args.config)?;
    let scenario = Scenario::load(&args.scenario)?;
    log::info!(
        "Loaded {} steps, {} accounts, {:?} domain",
        scenario.steps.len(),
        config.environment.accounts.len(),
        config.environment.domain
    );

    let report = run(&config, &scenario).context("scenario aborted")?;

    log::info!(
        "Ran {} steps: {} failed, {} events, {} launches",
        report.steps_run,
        report.failures.len(),
        report.events.len(),
        report.launches
    );
    log::info!(
        "Scheduled for retirement: {}, pending bridge: {}",
        report.scheduled_for_retirement,
        report.pending_bridged_amount
    );
    for (index, action, error) in &report.failures {
        log::warn!("Step {} ({}) failed: {}", index, action, error);
    }

    Ok(())
}
