use std::error::Error;
use std::net::SocketAddr;

use axum::Router;

use climate_service::api::{self, AppState};
use climate_service::config::Settings;
use climate_service::db::{self, PgConnector};
use climate_service::logging::{self, Source};

fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let settings = Settings::load()?;
    logging::init_logger(
        settings.log_level()?,
        settings.logging.file.as_deref(),
        settings.logging.timestamps,
    )?;

    let database_url = settings.database_url()?.to_string();
    let addr = settings.bind_addr()?;

    // Synchronous check before the runtime exists; the postgres client
    // drives its own runtime and must not run on a tokio worker.
    drop(db::connect_and_verify(&database_url)?);
    logging::info(Source::Database, None, "schema verified");

    let app = api::router(AppState::new(PgConnector::new(database_url)));

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(serve(addr, app))?;

    logging::info(Source::System, None, "stopped");
    Ok(())
}

async fn serve(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    logging::info(Source::Http, None, &format!("listening on http://{}", addr));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        logging::error(Source::System, None, &format!("failed to listen for Ctrl-C: {}", e));
        std::future::pending::<()>().await;
    }
    logging::info(Source::System, None, "shutdown requested");
}
