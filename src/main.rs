mod config;
mod db;
mod error;
mod jobs;
mod mailer;
mod models;
mod routes;
mod state;

use std::str::FromStr;
use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::mailer::SmtpMailer;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = config::Config::from_env()?;
    db::ensure_sqlite_dir(&cfg.database_url)?;

    let connect_options = SqliteConnectOptions::from_str(&cfg.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;
    db::run_migrations(&pool).await?;

    let mailer = Arc::new(SmtpMailer::new(cfg.smtp.clone())?);
    let state = AppState {
        db: pool,
        mailer,
        http: reqwest::Client::new(),
        job: cfg.job.clone(),
        n8n: cfg.n8n.clone(),
    };

    // Resident-process mode runs the email job on a timer; with interval 0
    // the job only runs when /api/cron/process-emails is called.
    let worker = if cfg.job.interval_secs > 0 {
        Some(jobs::spawn_email_worker(state.clone()))
    } else {
        None
    };

    let address = format!("0.0.0.0:{}", cfg.port);
    log::info!("Starting citamed on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(address)?
    .run()
    .await?;

    if let Some(worker) = worker {
        worker.abort();
    }

    Ok(())
}
