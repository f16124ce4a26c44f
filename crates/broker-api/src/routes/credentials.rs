//! KIS 자격증명 라우트.
//!
//! 자격증명 등록(upsert)과 마스킹된 조회를 제공합니다. 평문은 응답에
//! 절대 포함되지 않으며, app_key와 계좌번호는 마지막 4자만
//! 노출됩니다.

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::repository::CredentialRepository;
use crate::state::AppState;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use broker_core::mask::mask_value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// 자격증명 등록 요청.
#[derive(Debug, Deserialize)]
pub struct RegisterCredentialsRequest {
    pub app_key: String,
    pub app_secret: String,
    pub account_number: String,
    /// 계좌상품코드 (기본값 "01")
    #[serde(default)]
    pub product_code: Option<String>,
}

/// 마스킹된 자격증명 응답.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    /// 마스킹된 app_key (마지막 4자)
    pub app_key: String,
    /// 마스킹된 계좌번호 (마지막 4자)
    pub account_number: String,
    pub registered_at: String,
}

/// 자격증명 등록/갱신.
///
/// POST /api/v1/credentials
pub async fn register(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<RegisterCredentialsRequest>,
) -> Result<Json<CredentialResponse>, ApiError> {
    if req.app_key.trim().is_empty()
        || req.app_secret.trim().is_empty()
        || req.account_number.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "app_key, app_secret, account_number는 비어 있을 수 없습니다".to_string(),
        ));
    }

    if !is_valid_account_number(&req.account_number) {
        return Err(ApiError::Validation(
            "계좌번호 형식이 유효하지 않습니다 (하이픈 제외 숫자 8-12자리)".to_string(),
        ));
    }

    let product_code = req
        .product_code
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "01".to_string());

    let app_key_enc = state
        .encryptor
        .encrypt(&req.app_key)
        .map_err(|_| ApiError::Decryption)?;
    let app_secret_enc = state
        .encryptor
        .encrypt(&req.app_secret)
        .map_err(|_| ApiError::Decryption)?;
    let account_number_enc = state
        .encryptor
        .encrypt(&req.account_number)
        .map_err(|_| ApiError::Decryption)?;
    let product_code_enc = state
        .encryptor
        .encrypt(&product_code)
        .map_err(|_| ApiError::Decryption)?;

    let row = CredentialRepository::upsert(
        &state.pool,
        user.user_id,
        &app_key_enc,
        &app_secret_enc,
        &account_number_enc,
        &product_code_enc,
    )
    .await?;

    // 기존 토큰 상태는 새 자격증명과 무관하므로 버린다
    state.invalidate_oauth(user.user_id).await;

    info!(
        "credentials registered: user={} account={}",
        user.user_id,
        mask_value(&req.account_number)
    );

    Ok(Json(CredentialResponse {
        app_key: mask_value(&req.app_key),
        account_number: mask_value(&req.account_number),
        registered_at: row.registered_at.to_rfc3339(),
    }))
}

/// 등록된 자격증명 조회 (마스킹).
///
/// GET /api/v1/credentials
pub async fn show(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<CredentialResponse>, ApiError> {
    let row = CredentialRepository::find_by_user(&state.pool, user.user_id)
        .await?
        .ok_or(ApiError::CredentialsMissing)?;

    let app_key = state
        .encryptor
        .decrypt(&row.app_key_enc)
        .map_err(|_| ApiError::Decryption)?;
    let account_number = state
        .encryptor
        .decrypt(&row.account_number_enc)
        .map_err(|_| ApiError::Decryption)?;

    Ok(Json(CredentialResponse {
        app_key: mask_value(&app_key),
        account_number: mask_value(&account_number),
        registered_at: row.registered_at.to_rfc3339(),
    }))
}

/// 계좌번호 형식 검사.
///
/// 하이픈을 제외하면 8-12자리 숫자여야 합니다 ("12345678-01" 또는
/// "1234567890"). 숫자가 아닌 계좌번호는 업스트림 호출 전에
/// 걸러냅니다.
fn is_valid_account_number(value: &str) -> bool {
    let digits: Vec<char> = value.chars().filter(|c| *c != '-').collect();
    (8..=12).contains(&digits.len()) && digits.iter().all(|c| c.is_ascii_digit())
}

/// 자격증명 라우터 생성.
pub fn credentials_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(register).get(show))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_number_format() {
        assert!(is_valid_account_number("12345678-01"));
        assert!(is_valid_account_number("1234567890"));
        assert!(is_valid_account_number("12345678"));

        assert!(!is_valid_account_number("계좌번호입니다만"));
        assert!(!is_valid_account_number("12a45678-01"));
        assert!(!is_valid_account_number("1234"));
        assert!(!is_valid_account_number("1234567890123"));
    }
}
