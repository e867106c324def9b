use std::net::SocketAddr;
use std::time::Duration;

use mockhire_backend::{
    build_router,
    config::{get_config, init_config},
    database::pool::create_pool,
    AppState,
};
use tokio::net::TcpListener;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn spawn_email_worker(state: &AppState) {
    let notifications = state.notification_service.clone();
    tokio::spawn(async move {
        loop {
            match notifications.run_once().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::time::sleep(Duration::from_millis(1000)).await;
                }
                Err(e) => {
                    tracing::error!(error = ?e, "email worker error");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}

async fn start_maintenance(state: &AppState, cron: &str) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let maintenance = state.maintenance_service.clone();
    let job = Job::new_async(cron, move |_id, _lock| {
        let maintenance = maintenance.clone();
        Box::pin(async move {
            match maintenance.sweep().await {
                Ok(report) => tracing::debug!(?report, "maintenance sweep finished"),
                Err(e) => tracing::error!(error = ?e, "maintenance sweep failed"),
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(cron, "maintenance scheduler started");
    Ok(scheduler)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_config()?;
    let config = get_config();
    init_tracing(&config.log_format);

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    spawn_email_worker(&app_state);
    let _scheduler = start_maintenance(&app_state, &config.maintenance_cron).await?;

    info!("Serving uploads from: {}", config.uploads_dir);
    let app = build_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
