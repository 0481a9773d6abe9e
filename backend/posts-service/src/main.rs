use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use anyhow::{bail, Context};
use posts_service::auth::JwtKeys;
use posts_service::config::{Config, StoreBackend};
use posts_service::db::{
    create_pool, run_migrations, DbConfig, InMemoryPostStore, PgPostStore, PostStore,
};
use posts_service::handlers::{self, HealthState, PostHandlerState};
use posts_service::middleware;
use posts_service::models::NewGroup;
use posts_service::openapi::ApiDoc;
use posts_service::services::PostService;
use sqlx::PgPool;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&*doc).map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("application/json")
        .body(body))
}

async fn shutdown_signal() -> io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Open the configured store. The pool is returned for health probes.
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn PostStore>, Option<PgPool>)> {
    match config.database.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok((Arc::new(InMemoryPostStore::new()), None))
        }
        StoreBackend::Postgres => {
            let db_cfg = DbConfig::new(
                config.database.url.clone(),
                config.database.max_connections,
            );
            db_cfg.log_config();

            let pool = create_pool(db_cfg)
                .await
                .context("Failed to create database pool")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Connected to database, migrations applied");

            Ok((Arc::new(PgPostStore::new(pool.clone())), Some(pool)))
        }
    }
}

async fn run_healthcheck() -> anyhow::Result<()> {
    let port = std::env::var("POSTS_SERVICE_PORT").unwrap_or_else(|_| "8000".to_string());
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);

    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .context("healthcheck HTTP error")?;
    if !resp.status().is_success() {
        bail!("healthcheck HTTP status: {}", resp.status());
    }
    Ok(())
}

/// `create-group <slug> <title> [description]`
async fn run_create_group(config: &Config, args: &[String]) -> anyhow::Result<()> {
    let (slug, title) = match args {
        [slug, title, ..] => (slug.clone(), title.clone()),
        _ => bail!("usage: posts-service create-group <slug> <title> [description]"),
    };
    let description = args.get(2).cloned().unwrap_or_default();

    let (store, _) = open_store(config).await?;
    let group = PostService::new(store)
        .create_group(NewGroup {
            title,
            slug,
            description,
        })
        .await
        .context("Failed to create group")?;

    println!("created group {} ({})", group.slug, group.id);
    Ok(())
}

/// Posts Service
///
/// Serves the community blog: paginated listings (all posts, per group, per
/// author), post detail, and the create and edit post forms.
///
/// # Routes
///
/// - `/`, `/group/{slug}/`, `/profile/{username}/` - Listings, ten per page
/// - `/posts/{post_id}/` - Post detail
/// - `/create/`, `/posts/{post_id}/edit/` - Post forms (GET renders, POST submits)
/// - `/api/v1/health*`, `/metrics`, `/api/v1/openapi.json` - Operations
///
/// # Subcommands
///
/// - `healthcheck` - Probe the running server, for container healthchecks
/// - `create-group <slug> <title> [description]` - Add a group
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("healthcheck") {
        return run_healthcheck().await;
    }

    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            bail!("Failed to load configuration: {}", e);
        }
    };

    if args.first().map(String::as_str) == Some("create-group") {
        return run_create_group(&config, &args[1..]).await;
    }
    if let Some(cmd) = args.first() {
        bail!("unknown subcommand '{}'", cmd);
    }

    tracing::info!("Starting posts-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let (store, db_pool) = open_store(&config).await?;

    let post_state = web::Data::new(PostHandlerState {
        service: PostService::new(store),
        login_url: config.auth.login_url.clone(),
    });
    let health_state = web::Data::new(HealthState::new(db_pool));
    let jwt_keys = JwtKeys::from_secret(&config.auth.jwt_secret);
    let openapi_doc = web::Data::new(ApiDoc::openapi());

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(openapi_doc.clone())
            .app_data(post_state.clone())
            .app_data(health_state.clone())
            .wrap(middleware::IdentityMiddleware::new(jwt_keys.clone()))
            .wrap(middleware::HttpMetricsMiddleware)
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(ApiDoc::openapi_json_path(), web::get().to(openapi_json))
            .route("/metrics", web::get().to(posts_service::metrics::serve_metrics))
            .configure(handlers::configure)
    })
    .bind(&http_bind_address)
    .with_context(|| format!("Failed to bind {}", http_bind_address))?
    .workers(4)
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
        result = shutdown_signal() => {
            result.context("Failed to install signal handlers")?;
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            server_task
                .await
                .context("HTTP server task panicked")?
                .context("HTTP server failed")?;
        }
    }

    tracing::info!("Posts-service shutting down");
    Ok(())
}
