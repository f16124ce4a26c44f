//! KIS 연동 에러 타입.

use thiserror::Error;

/// KIS API 연동 에러.
///
/// 이 계층에는 재시도 로직이 없습니다 — 일시적 장애도 그대로 호출자에게
/// 전파되며, 재시도 여부는 호출자가 결정합니다.
#[derive(Debug, Error)]
pub enum KisError {
    /// 네트워크/전송 에러
    #[error("Network error: {0}")]
    Network(String),

    /// OAuth 토큰 발급 실패 (업스트림 에러 상세 포함)
    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),

    /// 업스트림 API 호출 실패 (non-2xx 또는 rt_cd != "0")
    #[error("Upstream request failed ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// 응답 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 헤더 값에 유효하지 않은 문자 포함
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    /// 설정 에러 (클라이언트 생성 실패 등)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl KisError {
    /// 인증 관련 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, KisError::TokenAcquisition(_))
    }
}

impl From<reqwest::Error> for KisError {
    fn from(err: reqwest::Error) -> Self {
        KisError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for KisError {
    fn from(err: serde_json::Error) -> Self {
        KisError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_carries_body() {
        let err = KisError::Upstream {
            status: 500,
            body: r#"{"rt_cd":"1","msg1":"모의투자 장시작전"}"#.to_string(),
        };
        assert!(err.to_string().contains("모의투자"));
    }

    #[test]
    fn test_auth_error_detection() {
        assert!(KisError::TokenAcquisition("EGW00103".to_string()).is_auth_error());
        assert!(!KisError::Network("timeout".to_string()).is_auth_error());
    }
}
