//! # 자격증명 암호화 모듈
//!
//! AES-256-GCM을 사용한 사용자 비밀값 암호화/복호화 기능을 제공합니다.
//!
//! ## 보안 고려사항
//! - 마스터 키는 환경변수에서 로드 (Base64, 32바이트)
//! - 각 암호화마다 고유한 nonce (12바이트) 사용
//! - 암호문은 `base64(nonce || ciphertext)` 단일 문자열로 저장
//! - 빈 문자열은 항등 변환 (암호화/복호화 모두 "" → "")

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::Engine;
use rand::RngCore;
use thiserror::Error;

/// 암호화 에러
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid master key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Ciphertext too short: {0} bytes")]
    CiphertextTooShort(usize),

    #[error("Base64 decode error: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),

    #[error("UTF-8 decode error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),

    #[error("Master key not configured")]
    MasterKeyNotConfigured,
}

/// AES-256-GCM nonce 크기 (바이트)
pub const NONCE_SIZE: usize = 12;

/// AES-256 키 크기 (바이트)
pub const KEY_SIZE: usize = 32;

/// 자격증명 암호화 관리자.
///
/// 프로세스 전역 마스터 키 하나로 동작하는 무상태 변환기입니다.
/// 키가 바뀌면 기존 암호문은 모두 복호화 불가능해집니다 (마이그레이션 없음).
pub struct CredentialEncryptor {
    cipher: Aes256Gcm,
}

impl CredentialEncryptor {
    /// 마스터 키로 암호화 관리자 생성.
    ///
    /// # Arguments
    /// * `master_key` - Base64로 인코딩된 32바이트 마스터 키
    ///
    /// # Example
    /// ```ignore
    /// let key = std::env::var("ENCRYPTION_MASTER_KEY")?;
    /// let encryptor = CredentialEncryptor::new(&key)?;
    /// ```
    pub fn new(master_key: &str) -> Result<Self, CryptoError> {
        if master_key.is_empty() {
            return Err(CryptoError::MasterKeyNotConfigured);
        }

        let key_bytes = Self::decode_key(master_key)?;
        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        Ok(Self { cipher })
    }

    /// Base64로 인코딩된 마스터 키 디코드.
    fn decode_key(master_key: &str) -> Result<Vec<u8>, CryptoError> {
        let key_bytes = base64::engine::general_purpose::STANDARD.decode(master_key)?;

        if key_bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength(key_bytes.len()));
        }

        Ok(key_bytes)
    }

    /// 랜덤 nonce 생성.
    fn generate_nonce() -> [u8; NONCE_SIZE] {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }

    /// 문자열 암호화.
    ///
    /// 빈 문자열은 그대로 빈 문자열을 반환합니다.
    ///
    /// # Returns
    /// `base64(nonce || ciphertext)` 형식의 문자열
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let nonce_bytes = Self::generate_nonce();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(combined))
    }

    /// 암호화된 문자열 복호화.
    ///
    /// 빈 문자열은 그대로 빈 문자열을 반환합니다.
    /// 손상되었거나 다른 키로 암호화된 암호문은 `DecryptionFailed`로 실패합니다 —
    /// 절대 임의의 값을 반환하지 않습니다.
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        if encoded.is_empty() {
            return Ok(String::new());
        }

        let combined = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        if combined.len() <= NONCE_SIZE {
            return Err(CryptoError::CiphertextTooShort(combined.len()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext).map_err(CryptoError::from)
    }
}

/// 새로운 마스터 키 생성 (초기 설정용).
///
/// # Example
/// ```
/// let key = broker_core::crypto::generate_master_key();
/// println!("ENCRYPTION_MASTER_KEY={}", key);
/// ```
pub fn generate_master_key() -> String {
    let mut key = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut key);
    base64::engine::general_purpose::STANDARD.encode(key)
}
