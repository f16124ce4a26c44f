//! 데이터 레이어 에러 타입.

use thiserror::Error;

/// 심볼 해석 레이어 에러
#[derive(Debug, Error)]
pub enum DataError {
    #[error("HTTP 요청 실패: {0}")]
    Http(String),

    #[error("응답 파싱 실패: {0}")]
    Parse(String),

    #[error("종목을 찾을 수 없음: {keyword}")]
    NotFound { keyword: String },
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        DataError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Parse(err.to_string())
    }
}
