#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
mod config;
mod pool;
mod structures;
#[cfg(test)]
mod test_support;

use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use arc_swap::ArcSwap;
use axum::{
    extract::{Path, Request, State},
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE},
        HeaderValue, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use slping::{AddressError, QueryError, ServerAddress};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{
    config::Config,
    pool::{Board, Pool},
    structures::{ErrorSerialization, PingResponse},
};

#[macro_use]
extern crate tracing;

#[derive(Clone)]
struct AppState {
    board: Arc<ArcSwap<Board>>,
    query_timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    start_tracing()?;
    let config = Config::from_env()?;
    info!(
        hosts = config.hosts.len(),
        refresh = ?config.refresh_interval,
        "starting server watcher"
    );

    let mut pool = Pool::new(config.hosts, config.query_timeout);
    pool.refresh().await;
    let state = AppState {
        board: pool.board(),
        query_timeout: config.query_timeout,
    };
    tokio::spawn(pool.run(config.refresh_interval));

    let socket_address = SocketAddr::from(([0, 0, 0, 0], config.port));
    let tcp = TcpListener::bind(socket_address).await?;
    info!(%socket_address, "listening");
    axum::serve(tcp, router(state))
        .with_graceful_shutdown(vss::shutdown_signal())
        .await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/servers", get(list_servers))
        .route("/api/servers/:address", get(server_report))
        .route("/api/ping/:address", get(handle_ping))
        .layer(axum::middleware::from_fn(no_cache))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

static NO_CACHE: HeaderValue = HeaderValue::from_static("no-cache");

async fn no_cache(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    resp.headers_mut().insert(CACHE_CONTROL, NO_CACHE.clone());
    resp
}

async fn list_servers(State(state): State<AppState>) -> Json<Board> {
    let board = state.board.load_full();
    Json(Board::clone(&board))
}

async fn server_report(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<slping::Report>, Failure> {
    let address: ServerAddress = address.parse()?;
    let board = state.board.load_full();
    board
        .get(&address.to_string())
        .cloned()
        .map(Json)
        .ok_or(Failure::NotWatched(address))
}

async fn handle_ping(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PingResponse>, Failure> {
    let address: ServerAddress = address.parse()?;
    let started = Instant::now();
    let response = slping::tokio::query(&address, state.query_timeout).await?;
    let latency = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(Json(PingResponse::new(latency, response)))
}

#[derive(thiserror::Error, Debug)]
pub enum Failure {
    #[error("Error connecting to the server")]
    ConnectionFailed(#[from] QueryError),
    #[error("Invalid server address: {0}")]
    InvalidAddress(#[from] AddressError),
    #[error("{0} is not a watched server")]
    NotWatched(ServerAddress),
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let status = match self {
            // an unreachable server is an answer, not a failure of this service
            Self::ConnectionFailed(_) => StatusCode::OK,
            Self::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            Self::NotWatched(_) => StatusCode::NOT_FOUND,
        };
        error!(error = ?self, "Error processing request");
        let ser = ErrorSerialization {
            error: self.to_string(),
        };
        (status, Json(ser)).into_response()
    }
}

pub struct Json<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        static JSON_CTYPE: HeaderValue = HeaderValue::from_static("application/json;charset=utf-8");

        let body = serde_json::to_vec_pretty(&self.0).unwrap_or_else(|_| {
            r#"{"error": "JSON serialization failed"}"#.as_bytes().to_vec()
        });
        ([(CONTENT_TYPE, JSON_CTYPE.clone())], body).into_response()
    }
}

/// `LOG` when set, otherwise `info` for this crate and `slping`.
fn log_filter(directives: Option<&str>) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    let builder = EnvFilter::builder()
        .with_default_directive(concat!(env!("CARGO_CRATE_NAME"), "=info").parse()?);
    let filter = match directives {
        Some(directives) => builder.parse(directives)?,
        None => builder.parse("")?.add_directive("slping=info".parse()?),
    };
    Ok(filter)
}

fn start_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = log_filter(std::env::var("LOG").ok().as_deref())?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();
    Ok(())
}
