//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/api/v1/auth` - 회원가입/로그인/내 정보
//! - `/api/v1/credentials` - KIS 자격증명 등록/조회 (마스킹)
//! - `/api/v1/dashboard` - 계좌 요약/보유 종목
//! - `/api/v1/stats` - 일별/월별/연별 자산 통계
//! - `/api/v1/quotes` - 종목 시세 조회
//!
//! auth의 signup/login을 제외한 모든 `/api/v1` 엔드포인트는 JWT
//! Bearer 토큰이 필요합니다.

pub mod auth;
pub mod credentials;
pub mod dashboard;
pub mod health;
pub mod quotes;
pub mod stats;

use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health::health_router())
        .nest("/api/v1/auth", auth::auth_router())
        .nest("/api/v1/credentials", credentials::credentials_router())
        .nest("/api/v1/dashboard", dashboard::dashboard_router())
        .nest("/api/v1/stats", stats::stats_router())
        .nest("/api/v1/quotes", quotes::quotes_router())
}
