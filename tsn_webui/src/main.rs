//! HTTP front-end for `tsnd`: a small JSON API bridged onto the unix
//! socket bus, plus the static browser UI. The daemon stays the single
//! owner of configuration state; this process holds none of its own.

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tsn_bus::{bus_request_at, BusRequest, BusResponse};

#[derive(Parser)]
#[command(name = "tsn_webui", about = "Web configuration API for tsnd")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Unix socket path the daemon is bound to
    #[arg(short, long, default_value = tsn_bus::BUS_SOCKET_PATH)]
    bind: PathBuf,

    /// Directory holding the static UI build
    #[arg(short, long, default_value = "static")]
    static_dir: PathBuf,
}

#[derive(Clone)]
struct AppState {
    socket_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let state = AppState {
        socket_path: args.bind,
    };
    let app = Router::new()
        .route("/api/info", get(get_info))
        .route("/api/config", get(get_config))
        .route("/api/config", put(put_config))
        .fallback_service(ServeDir::new(&args.static_dir))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Listening on {}", args.listen);
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// One bus request, one response; anything unexpected becomes a 502.
async fn single_request(state: &AppState, request: BusRequest) -> Result<BusResponse, Response> {
    let mut responses = bus_request_at(&state.socket_path, vec![request])
        .await
        .map_err(|e| {
            (StatusCode::BAD_GATEWAY, format!("daemon unreachable: {e}")).into_response()
        })?;
    if responses.len() != 1 {
        return Err((StatusCode::BAD_GATEWAY, "malformed daemon reply").into_response());
    }
    Ok(responses.remove(0))
}

async fn get_info(State(state): State<AppState>) -> Response {
    match single_request(&state, BusRequest::GetInterfaceInfo { ifname: None }).await {
        Ok(BusResponse::InterfaceInfo(descriptors)) => Json(descriptors).into_response(),
        Ok(BusResponse::Fail(message)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
        Ok(_) => (StatusCode::BAD_GATEWAY, "unexpected daemon reply").into_response(),
        Err(response) => response,
    }
}

async fn get_config(State(state): State<AppState>) -> Response {
    match single_request(&state, BusRequest::GetConfig).await {
        Ok(BusResponse::ConfigText(text)) => text.into_response(),
        Ok(BusResponse::Fail(message)) => {
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
        Ok(_) => (StatusCode::BAD_GATEWAY, "unexpected daemon reply").into_response(),
        Err(response) => response,
    }
}

/// Replace the configuration document. The daemon validates by
/// compiling before anything is written; rejections come back 422.
async fn put_config(State(state): State<AppState>, body: String) -> Response {
    match single_request(&state, BusRequest::UpdateConfig(body)).await {
        Ok(BusResponse::Ack) => StatusCode::NO_CONTENT.into_response(),
        Ok(BusResponse::Fail(message)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, message).into_response()
        }
        Ok(_) => (StatusCode::BAD_GATEWAY, "unexpected daemon reply").into_response(),
        Err(response) => response,
    }
}
