mod config; // brings `config.rs` in as `crate::config`

use anyhow::Context;
use arena_localization::{Controller, FixedVelocity, RunSummary, Simulation, SimulationConfig};
use spin_sleep::SpinSleeper;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

/// Wall-clock period between paced ticks.
const FRAME: Duration = Duration::from_millis(10);
/// Ticks between progress reports.
const REPORT_EVERY: u64 = 500;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Arena simulation starting.");

    let app = config::load_config().context("failed to load configuration")?;
    let settings = app.simulation.clone();
    let controller = FixedVelocity(settings.demo_velocities);

    let mut simulation = Simulation::new(app.robot, app.simulation, app.arena, controller)
        .context("failed to build simulation")?;

    let result = if settings.realtime {
        run_paced(&mut simulation, &settings)
    } else {
        info!(dt = settings.static_dt, ticks = settings.ticks, "Running in static time mode.");
        simulation
            .run_static(settings.static_dt, settings.ticks)
            .context("static run aborted")
    };

    match result {
        Ok(summary) => {
            report(&summary);
            Ok(())
        }
        Err(e) => {
            error!("Simulation failed: {:?}", e);
            report(&simulation.summary());
            Err(e)
        }
    }
}

/// Ticks against the wall clock until the timeout or tick budget runs out.
fn run_paced<C: Controller>(
    simulation: &mut Simulation<C>,
    settings: &SimulationConfig,
) -> anyhow::Result<RunSummary> {
    let timeout = (settings.timeout_secs > 0.0).then(|| Duration::from_secs_f64(settings.timeout_secs));
    info!(?timeout, dilation = settings.time_dilation, "Running in paced mode.");

    let sleeper = SpinSleeper::new(10_000);
    let started = Instant::now();
    let mut last = started;
    let mut ticks = 0u64;

    loop {
        match timeout {
            Some(limit) if started.elapsed() >= limit => break,
            None if ticks >= settings.ticks => break,
            _ => {}
        }

        sleeper.sleep(FRAME);
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64() * 1_000.0 * settings.time_dilation;
        last = now;

        simulation
            .tick(dt)
            .with_context(|| format!("paced tick {} (dt {:.1} ms) aborted", ticks + 1, dt))?;

        ticks += 1;
        if ticks % REPORT_EVERY == 0 {
            let summary = simulation.summary();
            info!(
                ticks,
                coverage = summary.coverage,
                collisions = summary.collisions,
                pose = %summary.pose,
                believed = %summary.believed,
                "progress"
            );
        }
    }

    Ok(simulation.summary())
}

fn report(summary: &RunSummary) {
    info!(
        ticks = summary.ticks,
        elapsed_ms = summary.elapsed,
        coverage = summary.coverage,
        covered_cells = summary.covered_cells,
        collisions = summary.collisions,
        mean_activation = summary.mean_activation,
        "Run finished"
    );
    info!(pose = %summary.pose, believed = %summary.believed, "Final poses");

    let estimators = [
        ("kalman", summary.errors.believed),
        ("odometry", summary.errors.odometry),
        ("beacon", summary.errors.beacon),
    ];
    for (name, error) in estimators {
        match error {
            Some(e) => info!(estimator = name, xy = e.xy(), theta = e.theta, "mean deviation"),
            None => info!(estimator = name, "no samples"),
        }
    }
}
