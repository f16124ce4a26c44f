//! 인증된 사용자 추출기.
//!
//! `Authorization: Bearer <token>` 헤더에서 JWT를 검증하고 사용자
//! 정보를 핸들러 인자로 주입합니다. 실패는 401 JSON 응답으로
//! 매핑됩니다.

use crate::auth::jwt::{decode_token, JwtError};
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;
use uuid::Uuid;

/// 인증된 사용자.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// 사용자 ID
    pub user_id: Uuid,
    /// 사용자 이메일
    pub email: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("인증 토큰이 없습니다".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Bearer 토큰 형식이 아닙니다".to_string()))?;

        let data = decode_token(token, &state.jwt_secret).map_err(|e| match e {
            JwtError::TokenExpired => {
                ApiError::Unauthorized("토큰이 만료되었습니다".to_string())
            }
            _ => ApiError::Unauthorized("유효하지 않은 토큰입니다".to_string()),
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ApiError::Unauthorized("유효하지 않은 토큰입니다".to_string()))?;

        Ok(AuthUser {
            user_id,
            email: data.claims.email,
        })
    }
}
