//! 통합 API 에러 타입.
//!
//! 모든 핸들러는 `Result<Json<T>, ApiError>`를 반환하며, `ApiError`는
//! `{code, message, details, timestamp}` 형식의 JSON 에러 본문으로
//! 변환됩니다. 하위 레이어 에러는 `From` 변환으로 상태 코드에
//! 매핑됩니다.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use broker_core::CoreError;
use broker_data::DataError;
use broker_exchange::KisError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::error;

/// API 레이어 에러.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 입력 검증 실패 (400)
    #[error("{0}")]
    Validation(String),

    /// 인증 실패 (401)
    #[error("{0}")]
    Unauthorized(String),

    /// 리소스 없음 (404)
    #[error("{0}")]
    NotFound(String),

    /// 중복 리소스 (409)
    #[error("{0}")]
    Conflict(String),

    /// 자격증명 미등록 (400) - 인증 실패와 구분됨
    #[error("등록된 증권사 자격증명이 없습니다")]
    CredentialsMissing,

    /// 자격증명 복호화 실패 (500)
    #[error("자격증명 복호화 실패")]
    Decryption,

    /// 토큰 발급 실패 (502)
    #[error("접근 토큰 발급 실패: {0}")]
    TokenAcquisition(String),

    /// 업스트림 API 오류 (502)
    #[error("업스트림 API 오류 ({status})")]
    Upstream { status: u16, body: String },

    /// 데이터베이스 오류 (500)
    #[error("데이터베이스 오류")]
    Database(#[from] sqlx::Error),

    /// 내부 오류 (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::CredentialsMissing => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TokenAcquisition(_) | ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Decryption | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "INVALID_INPUT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::CredentialsMissing => "CREDENTIALS_MISSING",
            ApiError::Decryption => "DECRYPTION_ERROR",
            ApiError::TokenAcquisition(_) => "TOKEN_ACQUISITION_FAILED",
            ApiError::Upstream { .. } => "UPSTREAM_ERROR",
            ApiError::Database(_) => "DB_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Upstream { body, .. } => Some(Value::String(body.clone())),
            _ => None,
        }
    }
}

/// JSON 에러 응답 본문.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// 에러 코드 (예: "NOT_FOUND", "UPSTREAM_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    pub timestamp: i64,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("API error ({}): {}", status, self);
        }

        let body = ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
            timestamp: chrono::Utc::now().timestamp(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(msg) => ApiError::NotFound(msg),
            CoreError::CredentialsMissing => ApiError::CredentialsMissing,
            CoreError::Decryption(_) => ApiError::Decryption,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<KisError> for ApiError {
    fn from(err: KisError) -> Self {
        match err {
            KisError::TokenAcquisition(msg) => ApiError::TokenAcquisition(msg),
            KisError::Upstream { status, body } => ApiError::Upstream { status, body },
            KisError::Network(msg) => ApiError::Upstream {
                status: 502,
                body: msg,
            },
            KisError::Parse(msg) => ApiError::Upstream {
                status: 502,
                body: msg,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound { keyword } => {
                ApiError::NotFound(format!("종목을 찾을 수 없습니다: {}", keyword))
            }
            other => ApiError::Upstream {
                status: 502,
                body: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::CredentialsMissing.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::TokenAcquisition("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Decryption.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_kis_error_conversion() {
        let err: ApiError = KisError::Upstream {
            status: 500,
            body: "[EGW00123] 만료".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Upstream { .. }));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_is_distinct_from_failure() {
        let err: ApiError = DataError::NotFound {
            keyword: "XYZ".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = DataError::Http("timeout".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            code: "NOT_FOUND".to_string(),
            message: "없음".to_string(),
            details: None,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains(r#""code":"NOT_FOUND""#));
        assert!(!json.contains("details"));
    }
}
