use std::{future::IntoFuture as _, io, sync::OnceLock};

use overseas_tracker::{Args, Command, Config, Service};
use service::{
    command::TransitionTrips,
    infra::{postgres, Postgres},
    query::DailySummary,
    Command as _,
};
use tracing as log;
use tracing_subscriber::{
    filter::filter_fn,
    layer::{Layer as _, SubscriberExt as _},
    util::SubscriberInitExt as _,
};

const STDERR_LEVELS: &[log::Level] = &[log::Level::WARN, log::Level::ERROR];

static LOG_LEVEL: OnceLock<log::Level> = OnceLock::new();

postgres::embed_migrations!("../migrations");

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stdout)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (!STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_ansi(true)
                .with_thread_names(true)
                .with_writer(io::stderr)
                .with_filter(filter_fn(|meta| {
                    meta.is_span()
                        || (STDERR_LEVELS.contains(meta.level()))
                            && LOG_LEVEL
                                .get()
                                .copied()
                                .unwrap_or(log::Level::INFO)
                                >= *meta.level()
                })),
        )
        .init();

    if start().await.is_err() {
        std::process::exit(1);
    }
}

async fn start() -> Result<(), ()> {
    let Args { config, command } = Args::parse().map_err(|e| {
        log::error!("failed to parse command line arguments: {e}");
    })?;

    let Config {
        postgres,
        service,
        log,
    } = Config::new(config).map_err(|e| {
        log::error!("failed to load `Config`: {e}");
    })?;

    LOG_LEVEL
        .set(log.level.into())
        .unwrap_or_else(|_| unreachable!("first initialization"));

    let timeout = postgres.timeout;
    let postgres_config = postgres.into();
    let mut postgres = Postgres::new(&postgres_config, timeout).map_err(|e| {
        log::error!("failed to initialize `Postgres` client: {e}");
    })?;

    migrations::runner()
        .run_async(&mut postgres)
        .await
        .map_err(|e| {
            log::error!("failed to run database migrations: {e}");
        })?;

    let config = service::Config::from(service);
    log::info!(time_zone = %config.clock.zone(), "service configured");

    match command.unwrap_or_default() {
        Command::Run => run(config, postgres).await,
        Command::Transition => transition(config, postgres).await,
        Command::Summary => summary(config, postgres).await,
    }
}

/// Runs the background [`Task`]s of the [`Service`] until any of them fails.
///
/// [`Task`]: service::Task
async fn run(config: service::Config, postgres: Postgres) -> Result<(), ()> {
    let (_service, background) = Service::new(config, postgres);

    log::info!("running {} background task(s)", background.len());

    background.into_future().await.map_err(|e| {
        log::error!("background task failed: {e}");
    })
}

/// Transitions trips along their lifecycle once.
async fn transition(
    config: service::Config,
    postgres: Postgres,
) -> Result<(), ()> {
    let service = Service::without_tasks(config, postgres);

    let transitioned =
        service.execute(TransitionTrips).await.map_err(|e| {
            log::error!("failed to transition trips: {e}");
        })?;

    log::info!("trips transitioned: {transitioned}");
    Ok(())
}

/// Logs trips starting today and completed yesterday.
async fn summary(config: service::Config, postgres: Postgres) -> Result<(), ()> {
    let service = Service::without_tasks(config, postgres);

    let summary = service.execute(DailySummary).await.map_err(|e| {
        log::error!("failed to summarize trips: {e}");
    })?;

    log::info!(
        today = %summary.today,
        starting = summary.starting.len(),
        completed = summary.completed.len(),
        "daily summary",
    );
    for view in &summary.starting {
        log::info!(
            trip_id = %view.trip.id,
            name = %view.trip.name,
            returns_on = %view.trip.dates.returns_on(),
            status = %view.status,
            "starting today",
        );
    }
    for view in &summary.completed {
        log::info!(
            trip_id = %view.trip.id,
            name = %view.trip.name,
            departed_on = %view.trip.dates.departs_on(),
            "completed yesterday",
        );
    }

    Ok(())
}
