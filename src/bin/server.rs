use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tortoise_docstore::{configure, AuditLog, Config, DocumentStore};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let config = Config::from_env()?;

    let audit = Arc::new(AuditLog::open(&config.log_file).await?);
    let store = DocumentStore::open(config.store_options(), Arc::clone(&audit)).await?;
    if config.discover {
        store.discover().await?;
    }
    info!(
        root = %config.root.display(),
        log = %config.log_file.display(),
        documents = store.documents().await.len(),
        "Starting server on {}",
        config.bind
    );

    let store = web::Data::new(store);
    let served = HttpServer::new(move || App::new().app_data(store.clone()).configure(configure))
        .bind(&config.bind)?
        .run()
        .await;

    if let Err(err) = audit.close().await {
        error!(error = %err, "failed to close audit log");
    }
    info!("server stopped");
    Ok(served?)
}
