//! 자산 대시보드 시스템의 공통 에러 타입.

use thiserror::Error;

/// 핵심 에러.
///
/// "찾을 수 없음"과 "시스템 장애"를 변형(variant)으로 구분하여
/// 호출자가 메시지 문자열을 파싱하지 않고 분기할 수 있습니다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 설정 에러 (기동 시 치명적)
    #[error("설정 에러: {0}")]
    Configuration(String),

    /// 복호화 에러 (손상된 암호문 또는 키 불일치)
    #[error("복호화 에러: {0}")]
    Decryption(String),

    /// 찾을 수 없음 (서버 장애가 아님)
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 등록된 자격증명 없음 (인증 실패와 구분)
    #[error("등록된 KIS 자격증명이 없습니다")]
    CredentialsMissing,
}

/// 공통 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 기동을 중단해야 하는 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CoreError::Configuration(_))
    }
}

impl From<crate::crypto::CryptoError> for CoreError {
    fn from(err: crate::crypto::CryptoError) -> Self {
        match err {
            crate::crypto::CryptoError::MasterKeyNotConfigured
            | crate::crypto::CryptoError::InvalidKeyLength(_) => {
                CoreError::Configuration(err.to_string())
            }
            other => CoreError::Decryption(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_is_fatal() {
        let err = CoreError::Configuration("ENCRYPTION_MASTER_KEY 누락".to_string());
        assert!(err.is_fatal());

        let err = CoreError::NotFound("005930".to_string());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_crypto_error_mapping() {
        let err: CoreError = crate::crypto::CryptoError::MasterKeyNotConfigured.into();
        assert!(matches!(err, CoreError::Configuration(_)));

        let err: CoreError =
            crate::crypto::CryptoError::DecryptionFailed("aead".to_string()).into();
        assert!(matches!(err, CoreError::Decryption(_)));
    }
}
