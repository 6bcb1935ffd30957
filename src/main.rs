use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use chrono::Utc;
use clinic_backend::auth::hash_password;
use clinic_backend::config::Config;
use clinic_backend::logging::{init_tracing, LogConfig};
use clinic_backend::middleware::rate_limit::rate_limit_cleanup_loop;
use clinic_backend::routes::build_router;
use clinic_backend::state::AppState;
use clinic_backend::store::operations::users::{Role, User};
use clinic_backend::store::Store;
use clinic_backend::workers::WorkerManager;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();

    init_tracing(&LogConfig {
        log_level: config.log_level.clone(),
        enable_file_logs: config.enable_file_logs,
        log_dir: config.log_dir.clone(),
    });
    tracing::info!("Starting clinic-backend");

    let store = Arc::new(Store::open(&config.sled_path).expect("Failed to open sled database"));
    store.run_migrations().expect("Failed to run migrations");
    bootstrap_admin(&store, &config);

    let (shutdown_tx, _) = broadcast::channel::<()>(8);

    let state = AppState::new(store.clone(), &config, shutdown_tx.clone());

    tokio::spawn(rate_limit_cleanup_loop(
        state.rate_limit().clone(),
        shutdown_tx.subscribe(),
    ));

    let worker_handle = if config.worker.is_leader {
        let worker_manager = WorkerManager::new(
            store.clone(),
            shutdown_tx.subscribe(),
            &config.worker,
            &config.library,
        );
        Some(tokio::spawn(async move {
            if let Err(e) = worker_manager.start().await {
                tracing::error!(error = %e, "Worker manager failed");
            }
        }))
    } else {
        None
    };

    let cors_layer = build_cors_layer(&config);

    let app = build_router(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ));

    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");

    let server_future = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()));

    if let Some(handle) = worker_handle {
        // Worker 作为独立后台任务运行，panic 仅记录错误，不终止 HTTP 服务器
        tokio::spawn(async move {
            match handle.await {
                Err(e) => {
                    tracing::error!(error = %e, "Worker task panicked, HTTP server continues")
                }
                Ok(()) => tracing::info!("Worker manager exited normally"),
            }
        });
    }

    if let Err(e) = server_future.await {
        tracing::error!(error = %e, "HTTP server crashed");
    }

    tracing::info!("Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
}

/// 库中没有管理员时创建引导管理员账户，凭据来自环境变量
fn bootstrap_admin(store: &Store, config: &Config) {
    match store.any_admin_exists() {
        Ok(true) => return,
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, "Failed to check for existing admin");
            return;
        }
    }

    let password_hash = match hash_password(&config.bootstrap.admin_password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!(error = %e.message, "Failed to hash bootstrap admin password");
            return;
        }
    };

    let now = Utc::now();
    let admin = User {
        id: uuid::Uuid::new_v4().to_string(),
        username: config.bootstrap.admin_username.clone(),
        display_name: "管理员".to_string(),
        role: Role::Admin,
        training_center: String::new(),
        password_hash,
        created_at: now,
        updated_at: now,
        failed_login_count: 0,
        locked_until: None,
    };

    match store.create_user(&admin) {
        Ok(()) => tracing::info!(username = %admin.username, "Bootstrap admin account created"),
        Err(e) => tracing::error!(error = %e, "Failed to create bootstrap admin"),
    }
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origin.trim() == "*" {
        // 通配符模式仅用于开发环境，通配符与 credentials 互斥
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_credentials(false)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any);
    }

    match config.cors_origin.parse::<axum::http::HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_methods(Any),
        Err(e) => {
            panic!(
                "FATAL: Invalid CORS_ORIGIN '{}': {}. \
                 Fix the CORS_ORIGIN environment variable.",
                config.cors_origin, e
            );
        }
    }
}

async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = sigterm.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
