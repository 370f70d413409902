use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    http::Method,
    http::Request,
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenvy::dotenv;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use am_common::extract::HeuristicExtractor;
use am_common::logging::{init_tracing, install_panic_hook};
use am_common::matching::{ScoreEngine, ScoringConfig};
use am_common::review::ReviewConfig;
use am_geocoder::{Geocoder, MapboxClient};

pub mod auth;
pub mod error;
pub mod handlers;

use auth::AuthConfig;
use error::ApiError;
use handlers::{addresses, health};

const SHUTDOWN_DRAIN_GRACE: std::time::Duration = std::time::Duration::from_millis(200);

#[derive(Debug, Clone, Parser)]
#[command(name = "am-api", about = "HTTP API for address match confidence scoring")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Mapbox access token for forward geocoding
    #[arg(long, env = "MAPBOX_ACCESS_TOKEN")]
    mapbox_access_token: String,

    /// API key for X-API-Key authentication (unauthenticated when unset)
    #[arg(long, env = "AM_API_KEY")]
    api_key: Option<String>,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "AM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl AppConfig {
    fn from_cli(cli: &Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::BadRequest(
                "AM_CORS_ORIGINS must list explicit origins".into(),
            ));
        }

        Ok(Self {
            port: cli.port,
            cors_origins,
            auth: AuthConfig {
                api_key: cli.api_key.clone(),
            },
        })
    }
}

pub struct AppState {
    pub config: AppConfig,
    pub engine: ScoreEngine<HeuristicExtractor>,
    pub review: ReviewConfig,
    pub geocoder: Arc<dyn Geocoder>,
    pub readiness: Arc<std::sync::atomic::AtomicBool>,
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
        ])
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    });

    let api_routes = Router::new().route("/addresses", post(addresses::score_address));

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing(env!("CARGO_PKG_NAME"));
    install_panic_hook(env!("CARGO_PKG_NAME"));

    let cli = Cli::parse();
    let config = AppConfig::from_cli(&cli)?;

    // 重みテーブルが壊れていたら起動自体を拒否する
    let engine = ScoreEngine::new(ScoringConfig::from_env(), HeuristicExtractor)
        .map_err(|err| ApiError::Internal(format!("invalid scoring config: {err}")))?;

    let state: SharedState = Arc::new(AppState {
        config: config.clone(),
        engine,
        review: ReviewConfig::from_env(),
        geocoder: Arc::new(MapboxClient::new(cli.mapbox_access_token)),
        readiness: Arc::new(std::sync::atomic::AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, "am-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state
        .readiness
        .store(false, std::sync::atomic::Ordering::SeqCst);

    // Give load balancers a brief window to observe /readyz as not ready
    // before axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

pub fn test_state(api_key: Option<&str>, geocoder: Arc<dyn Geocoder>) -> SharedState {
    let config = AppConfig {
        port: 8000,
        cors_origins: vec!["http://localhost:3000".into()],
        auth: AuthConfig {
            api_key: api_key.map(str::to_string),
        },
    };

    let engine = ScoreEngine::new(ScoringConfig::default(), HeuristicExtractor)
        .expect("default scoring config is valid");

    Arc::new(AppState {
        config,
        engine,
        review: ReviewConfig::default(),
        geocoder,
        readiness: Arc::new(std::sync::atomic::AtomicBool::new(true)),
    })
}
