mod app_state;
mod config;
mod db;
mod error;
mod handlers;
mod lti;
mod middlewares;
mod models;
mod queries;
mod routes;
mod services;
mod store;
mod tasks;
mod utils;
mod websocket;

use std::sync::Arc;

use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use crate::config::Config;
use crate::store::postgres::PgStore;
use crate::tasks::queue::{spawn_notify_schedule, spawn_worker, TaskContext, TaskQueue};
use crate::utils::email::{LogMailer, MailTransport, SmtpMailer};

fn init_tracing(cfg: &Config) {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match cfg.log_level.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: COURSELETS_LOG='{}' is not a valid tracing filter ({}); falling back to 'info'",
                    cfg.log_level, e
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if cfg.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "courselets backend starting");

    let pool = db::connect_to_db(&cfg.database_url).await?;
    info!("database ready");

    let session_store = PostgresStore::new(pool.clone());
    session_store.migrate().await?;

    let mailer: Arc<dyn MailTransport> = match &cfg.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp)?),
        None => {
            tracing::warn!("SMTP_SERVER not set, outgoing mail goes to the log");
            Arc::new(LogMailer)
        }
    };

    let store = Arc::new(PgStore::new(pool));
    let (queue, receiver) = TaskQueue::new();
    let ctx = TaskContext {
        store: store.clone(),
        mailer,
        http: reqwest::Client::new(),
        mail_from: cfg.mail_from.clone(),
    };
    spawn_worker(receiver, ctx, cfg.worker_count);
    spawn_notify_schedule(queue.clone(), cfg.notify_interval);
    info!(
        workers = cfg.worker_count,
        notify_every_secs = cfg.notify_interval.as_secs(),
        "background jobs running"
    );

    let state = app_state::AppState {
        store,
        tasks: queue,
        websocket_manager: websocket::manager::WebSocketManager::new(),
    };
    let app = routes::create_routes(session_store).with_state(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_address).await?;
    info!(addr = %cfg.bind_address, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
