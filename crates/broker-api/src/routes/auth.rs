//! 인증 라우트.
//!
//! 회원가입, 로그인(JWT 발급), 내 정보 조회를 제공합니다.

use crate::auth::{
    create_token, hash_password, validate_password_strength, verify_password, AuthUser, Claims,
};
use crate::error::ApiError;
use crate::repository::UserRepository;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

/// 회원가입 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "이메일 형식이 유효하지 않습니다"))]
    pub email: String,
    pub password: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 사용자 정보 응답.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: i64,
}

/// 회원가입.
///
/// POST /api/v1/auth/signup
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    req.validate()
        .map_err(|_| ApiError::Validation("이메일 형식이 유효하지 않습니다".to_string()))?;
    validate_password_strength(&req.password)
        .map_err(|msg| ApiError::Validation(msg.to_string()))?;

    let password_hash =
        hash_password(&req.password).map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = UserRepository::create(&state.pool, &req.email, &password_hash)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ApiError::Conflict("이미 등록된 이메일입니다".to_string())
            }
            _ => ApiError::from(e),
        })?;

    info!("user registered: {}", user.id);

    Ok(Json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
        created_at: user.created_at.to_rfc3339(),
    }))
}

/// 로그인 (JWT 발급).
///
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = UserRepository::find_by_email(&state.pool, &req.email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("이메일 또는 비밀번호가 올바르지 않습니다".to_string()))?;

    verify_password(&req.password, &user.password_hash).map_err(|_| {
        ApiError::Unauthorized("이메일 또는 비밀번호가 올바르지 않습니다".to_string())
    })?;

    let claims = Claims::new(user.id.to_string(), &user.email, state.jwt_expires_minutes);
    let access_token =
        create_token(&claims, &state.jwt_secret).map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_expires_minutes * 60,
    }))
}

/// 내 정보 조회.
///
/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = UserRepository::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("사용자를 찾을 수 없습니다".to_string()))?;

    Ok(Json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
        created_at: user.created_at.to_rfc3339(),
    }))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/me", get(me))
}
