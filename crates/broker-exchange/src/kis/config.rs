//! 한국투자증권 (KIS) API 설정.
//!
//! KIS API는 app_key와 app_secret을 사용한 OAuth 2.0 인증이 필요합니다.
//! 클라이언트 하나는 정확히 하나의 자격증명 세트와 하나의 환경
//! (실전/모의)에 바인딩됩니다.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// KIS API 환경 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KisEnvironment {
    /// 실전투자
    Real,
    /// 모의투자
    #[default]
    Paper,
}

impl KisEnvironment {
    /// 이 환경의 REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &str {
        match self {
            KisEnvironment::Real => "https://openapi.koreainvestment.com:9443",
            KisEnvironment::Paper => "https://openapivts.koreainvestment.com:29443",
        }
    }

    /// 문자열에서 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "real" | "production" | "prod" => Some(KisEnvironment::Real),
            "paper" | "simulation" | "vts" => Some(KisEnvironment::Paper),
            _ => None,
        }
    }
}

/// KIS API 설정.
///
/// app_secret은 `SecretString`으로 보관하여 Debug 출력/로그에
/// 노출되지 않도록 합니다.
#[derive(Debug, Clone)]
pub struct KisConfig {
    /// 앱키
    pub app_key: String,
    /// 앱시크릿
    pub app_secret: SecretString,
    /// 계좌번호 - 형식: "XXXXXXXX-XX" 또는 하이픈 없는 10자리
    pub account_no: String,
    /// 계좌상품코드 - 주식의 경우 일반적으로 "01"
    pub account_product_code: String,
    /// 환경 (실전/모의)
    pub environment: KisEnvironment,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 토큰 파일 저장 디렉터리
    pub token_dir: PathBuf,
    /// 기본 URL 재정의 (테스트용)
    base_url_override: Option<String>,
}

impl KisConfig {
    /// 새로운 KIS 설정 생성.
    pub fn new(
        app_key: String,
        app_secret: String,
        account_no: String,
        environment: KisEnvironment,
    ) -> Self {
        Self {
            app_key,
            app_secret: SecretString::new(app_secret.into()),
            account_no,
            account_product_code: "01".to_string(),
            environment,
            timeout_secs: 30,
            token_dir: PathBuf::from(".tokens"),
            base_url_override: None,
        }
    }

    /// 계좌상품코드 설정.
    pub fn with_product_code(mut self, code: String) -> Self {
        self.account_product_code = code;
        self
    }

    /// 토큰 파일 디렉터리 설정.
    pub fn with_token_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.token_dir = dir.into();
        self
    }

    /// 요청 타임아웃 설정.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 기본 URL 재정의 (mockito 테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &str {
        match &self.base_url_override {
            Some(url) => url,
            None => self.environment.rest_base_url(),
        }
    }

    /// 앱시크릿 평문 반환 (요청 헤더/본문 구성 시에만 사용).
    pub fn app_secret(&self) -> &str {
        self.app_secret.expose_secret()
    }

    /// 계좌번호 앞 8자리 반환 (CANO).
    ///
    /// 문자 단위로 자르므로 비정상 입력(비숫자 계좌번호)에도 패닉하지
    /// 않습니다.
    pub fn cano(&self) -> String {
        self.account_no
            .chars()
            .filter(|c| *c != '-')
            .take(8)
            .collect()
    }

    /// 계좌상품코드 반환 (ACNT_PRDT_CD).
    pub fn acnt_prdt_cd(&self) -> &str {
        &self.account_product_code
    }

    /// 토큰 파일 식별 키.
    ///
    /// app_key의 SHA-256 해시 앞 16자리를 사용합니다. 키 자체가 파일명에
    /// 노출되지 않으면서 자격증명 세트별로 고유한 파일이 만들어집니다.
    pub fn token_key(&self) -> String {
        let digest = Sha256::digest(self.app_key.as_bytes());
        hex::encode(digest)[..16].to_string()
    }

    /// 토큰 파일 경로.
    pub fn token_file_path(&self) -> PathBuf {
        self.token_dir
            .join(format!("kis_token_{}.json", self.token_key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> KisConfig {
        KisConfig::new(
            "test_app_key".to_string(),
            "test_app_secret".to_string(),
            "12345678-01".to_string(),
            KisEnvironment::Paper,
        )
    }

    #[test]
    fn test_environment_urls() {
        assert_eq!(
            KisEnvironment::Real.rest_base_url(),
            "https://openapi.koreainvestment.com:9443"
        );
        assert_eq!(
            KisEnvironment::Paper.rest_base_url(),
            "https://openapivts.koreainvestment.com:29443"
        );
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(KisEnvironment::parse("real"), Some(KisEnvironment::Real));
        assert_eq!(KisEnvironment::parse("PAPER"), Some(KisEnvironment::Paper));
        assert_eq!(
            KisEnvironment::parse("simulation"),
            Some(KisEnvironment::Paper)
        );
        assert_eq!(KisEnvironment::parse("unknown"), None);
    }

    #[test]
    fn test_account_parsing() {
        let config = test_config();
        assert_eq!(config.cano(), "12345678");
        assert_eq!(config.acnt_prdt_cd(), "01");
    }

    #[test]
    fn test_cano_multibyte_account_does_not_panic() {
        let config = KisConfig::new(
            "key".to_string(),
            "secret".to_string(),
            "계좌번호입니다만".to_string(),
            KisEnvironment::Paper,
        );
        assert_eq!(config.cano(), "계좌번호입니다만");

        let short = KisConfig::new(
            "key".to_string(),
            "secret".to_string(),
            "1234".to_string(),
            KisEnvironment::Paper,
        );
        assert_eq!(short.cano(), "1234");
    }

    #[test]
    fn test_base_url_override() {
        let config = test_config().with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.rest_base_url(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_token_key_stable_and_distinct() {
        let a = test_config();
        let b = KisConfig::new(
            "other_app_key".to_string(),
            "secret".to_string(),
            "12345678-01".to_string(),
            KisEnvironment::Paper,
        );

        assert_eq!(a.token_key(), test_config().token_key());
        assert_ne!(a.token_key(), b.token_key());
        assert_eq!(a.token_key().len(), 16);
    }

    #[test]
    fn test_secret_not_in_debug_output() {
        let config = test_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("test_app_secret"));
    }
}
