//! HTTP(S) server setup.
//!
//! # Responsibilities
//! - Build the Axum router with routes, middleware, and state
//! - Connect the cache and database collaborators at startup
//! - Serve plain HTTP, and TLS with plain-port redirects when forced
//! - Graceful shutdown on ctrl-c

use axum::{
    body::Body,
    extract::{ConnectInfo, Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, timeout::TimeoutLayer};

use crate::cache::Cache;
use crate::config::AppConfig;
use crate::domain;
use crate::http::response;
use crate::logging::Logger;
use crate::model::Db;

/// How long a cached demo pipeline result stays fresh.
const DEMO_CACHE_SECS: i64 = 60;

/// Error type for server startup.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TLS configuration: {0}")]
    Tls(String),
}

/// Bind a plain-HTTP listener with `SO_REUSEPORT` set, so every worker in
/// the cluster accepts on the same port and the kernel spreads incoming
/// connections across them.
pub fn bind_listener(port: u16) -> std::io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub log: Logger,
    pub cache: Option<Cache>,
    pub db: Option<Db>,
}

/// The worker's HTTP server.
pub struct ApiServer {
    config: AppConfig,
    state: AppState,
}

impl ApiServer {
    /// Build the server, connecting configured collaborators.
    ///
    /// A collaborator that fails to connect is logged and skipped; the
    /// routes that need it degrade instead of taking the worker down.
    pub async fn new(config: AppConfig, log: Logger) -> Self {
        let cache = match &config.redis {
            Some(redis) => match Cache::connect(redis, log.scoped("Cache")).await {
                Ok(cache) => Some(cache),
                Err(e) => {
                    log.error("Redis client error.", Some(json!({ "error": e.to_string() })));
                    None
                }
            },
            None => None,
        };
        let db = match &config.postgres {
            Some(postgres) => match Db::connect(postgres, &log.scoped("Model")).await {
                Ok(db) => Some(db),
                Err(e) => {
                    log.error(
                        "Postgres connection error.",
                        Some(json!({ "error": e.to_string() })),
                    );
                    None
                }
            },
            None => None,
        };
        let state = AppState { log, cache, db };
        Self { config, state }
    }

    /// Server without collaborators, for router tests.
    pub fn bare(config: AppConfig, log: Logger) -> Self {
        let state = AppState {
            log,
            cache: None,
            db: None,
        };
        Self { config, state }
    }

    /// The routing table with all middleware applied.
    pub fn router(&self) -> Router {
        let server = &self.config.server;
        Router::new()
            .route("/", get(hello))
            .route("/demo", get(demo))
            .route("/users/{id}", get(get_user))
            .nest_service("/static", ServeDir::new(&server.static_dir))
            .fallback(fallback_not_found)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                log_request,
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(server.keep_alive_secs)))
            .layer(RequestBodyLimitLayer::new(server.json_limit_bytes))
            .with_state(self.state.clone())
    }

    /// Serve on the given plain-HTTP listener until ctrl-c.
    ///
    /// With `force_https`, the app itself is served on the TLS port and
    /// the plain listener only answers with 301 redirects.
    pub async fn run(self, listener: TcpListener) -> Result<(), ServerError> {
        let app = self.router();
        let log = self.state.log.clone();
        let server = self.config.server.clone();

        if server.force_https {
            let cert = server
                .certificate_path
                .clone()
                .ok_or_else(|| ServerError::Tls("certificate_path not set".to_string()))?;
            let key = server
                .certificate_key_path
                .clone()
                .ok_or_else(|| ServerError::Tls("certificate_key_path not set".to_string()))?;
            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
                .await
                .map_err(|e| ServerError::Tls(e.to_string()))?;

            log.debug("Force HTTPS enabled.", None);
            let addr = SocketAddr::from(([0, 0, 0, 0], server.https_port));
            let https_app = app.clone();
            let https_log = log.clone();
            tokio::spawn(async move {
                if let Err(e) = axum_server::bind_rustls(addr, tls)
                    .serve(https_app.into_make_service_with_connect_info::<SocketAddr>())
                    .await
                {
                    https_log.error(
                        "HTTPS listener failed.",
                        Some(json!({ "port": addr.port(), "error": e.to_string() })),
                    );
                }
            });

            let redirect = Router::new()
                .fallback(redirect_to_https)
                .with_state(RedirectState {
                    https_port: server.https_port,
                });
            axum::serve(
                listener,
                redirect.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        } else {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        }

        log.info("Server stopped.", None);
        Ok(())
    }
}

/// Telemetry for every request, before routing.
async fn log_request(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string());
    state.log.telemetry(
        "Request received.",
        Some(json!({
            "path": request.uri().path(),
            "method": request.method().as_str(),
            "query": request.uri().query(),
            "ip": ip,
        })),
    );
    next.run(request).await
}

async fn hello() -> &'static str {
    "Hello World!"
}

/// Runs the demo domain pipeline, memoizing the result in the cache when
/// one is configured.
async fn demo(State(state): State<AppState>) -> Response {
    if let Some(cache) = &state.cache {
        if let Ok(Some(cached)) = cache.get_json::<String>("demo:pipeline").await {
            return cached.into_response();
        }
    }
    match domain::run_pipeline().await {
        Ok(result) => {
            if let Some(cache) = &state.cache {
                if let Err(e) = cache.set_json("demo:pipeline", &result, DEMO_CACHE_SECS).await {
                    state
                        .log
                        .error("Error caching demo result.", Some(json!({ "error": e.to_string() })));
                }
            }
            result.into_response()
        }
        Err(e) => {
            state
                .log
                .error("Demo pipeline failed.", Some(json!({ "error": e.to_string() })));
            response::server_error(&state.log, None)
        }
    }
}

/// Public projection of one user. 501 without a database, 404 for unknown
/// ids; lookup failures become a generic 500.
async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let Some(db) = &state.db else {
        return response::not_implemented(&state.log, None);
    };
    match db.find_user(id).await {
        Ok(Some(user)) => Json(user.public_json()).into_response(),
        Ok(None) => response::not_found(&state.log, None),
        Err(e) => {
            state
                .log
                .error("User lookup failed.", Some(json!({ "id": id, "error": e.to_string() })));
            response::server_error(&state.log, None)
        }
    }
}

async fn fallback_not_found(State(state): State<AppState>, request: Request) -> Response {
    state.log.warn(
        "Returned 404 Not Found.",
        Some(json!({ "path": request.uri().path() })),
    );
    (StatusCode::NOT_FOUND, "Not found.\n").into_response()
}

#[derive(Clone)]
struct RedirectState {
    https_port: u16,
}

/// 301 to the HTTPS origin, preserving host, path and query.
async fn redirect_to_https(State(state): State<RedirectState>, request: Request<Body>) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let host = host.split(':').next().unwrap_or(host);
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = if state.https_port == 443 {
        format!("https://{host}{path_and_query}")
    } else {
        format!("https://{host}:{}{path_and_query}", state.https_port)
    };
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, location)],
    )
        .into_response()
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
