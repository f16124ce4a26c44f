//! 자산 대시보드 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다. 사용자 인증, KIS 자격증명
//! 관리, 계좌 조회, 자산 통계, 시세 조회 엔드포인트를 제공합니다.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::StatusCode;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use broker_api::config::AppConfig;
use broker_api::routes::create_api_router;
use broker_api::state::AppState;
use broker_core::crypto::CredentialEncryptor;
use broker_core::logging::init_logging_from_env;
use broker_data::{NaverAutocompleteClient, SymbolIndex};

/// CORS 미들웨어 구성.
///
/// CORS_ORIGINS 환경변수가 설정되어 있으면 해당 origin만 허용합니다.
/// 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
fn cors_layer() -> CorsLayer {
    let allow_origin = match std::env::var("CORS_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();

            if origins.is_empty() {
                warn!("CORS_ORIGINS is set but contains no valid origins, allowing any");
                AllowOrigin::any()
            } else {
                info!("CORS configured with {} allowed origins", origins.len());
                AllowOrigin::list(origins)
            }
        }
        _ => {
            warn!("CORS_ORIGINS not set, allowing any origin (development mode)");
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
        .max_age(Duration::from_secs(3600))
}

/// 전체 라우터 생성.
fn create_router(state: Arc<AppState>, request_timeout_secs: u64) -> Router {
    create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
        .layer(cors_layer())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    init_logging_from_env().map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting asset dashboard API server...");

    let config = AppConfig::from_env().context("설정 로드 실패")?;

    // DB 연결
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.database_url)
        .await
        .context("데이터베이스 연결 실패")?;

    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .context("데이터베이스 연결 검증 실패")?;
    info!("Connected to Postgres successfully");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .context("마이그레이션 실행 실패")?;
    info!("Database migrations applied");

    // 자격증명 암호화 관리자 (마스터 키가 유효하지 않으면 기동 실패)
    let encryptor = CredentialEncryptor::new(&config.encryption_master_key)
        .context("ENCRYPTION_MASTER_KEY가 유효하지 않습니다")?;
    info!("Credential encryptor initialized");

    // 심볼 인덱스 (시드 목록 + 네이버 자동완성 보완)
    let symbols = match NaverAutocompleteClient::new() {
        Ok(provider) => Arc::new(SymbolIndex::with_provider(Arc::new(provider))),
        Err(e) => {
            warn!("symbol lookup provider unavailable, using seed list only: {}", e);
            Arc::new(SymbolIndex::new())
        }
    };
    info!(
        environment = ?config.kis_environment,
        entries = symbols.len().await,
        "Symbol index initialized"
    );

    // 인기 종목 선조회 (best-effort, 기동을 막지 않는다)
    {
        let symbols = Arc::clone(&symbols);
        tokio::spawn(async move {
            let resolved = symbols.warm_up().await;
            let entries = symbols.len().await;
            info!(resolved, entries, "Symbol warm-up finished");
        });
    }

    let state = Arc::new(AppState::new(&config, pool, encryptor, symbols));

    let app = create_router(state, config.request_timeout_secs);

    let addr = config.bind_addr();
    info!(%addr, "API server listening");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{} 바인딩 실패", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기 (Ctrl+C 또는 SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
