//! 시세 조회 라우트.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::quote::{QuoteService, QuoteView};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

/// 키워드(코드/심볼/종목명)로 시세 조회.
///
/// GET /api/v1/quotes/{keyword}
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(keyword): Path<String>,
) -> Result<Json<QuoteView>, ApiError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::Validation("검색 키워드가 비어 있습니다".to_string()));
    }

    let quote = QuoteService::get_quote(&state, user.user_id, keyword).await?;
    Ok(Json(quote))
}

/// 시세 라우터 생성.
pub fn quotes_router() -> Router<Arc<AppState>> {
    Router::new().route("/{keyword}", get(get_quote))
}
