//! KIS OAuth 2.0 인증 모듈.
//!
//! 접근 토큰 발급 (POST /oauth2/tokenP)과 수명 주기 관리를 담당합니다.
//!
//! 자격증명 세트별 상태 기계: `NoToken → Valid → Expired → Valid → ...`
//! - 메모리 캐시가 유효하면 네트워크 호출 없이 반환 (공통 fast path)
//! - 프로세스당 한 번 토큰 파일을 읽어 재기동 시 토큰을 재사용
//! - 만료 임박(60초 안전 마진)이면 폐기 후 재발급
//! - `clear()`는 메모리와 파일 상태를 모두 삭제

use super::config::KisConfig;
use crate::KisError;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 토큰 안전 마진 (초). 만료까지 남은 시간이 이보다 적으면 재발급.
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 60;

/// 업스트림이 expires_in을 생략한 경우의 기본 토큰 수명 (초).
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// KIS OAuth 토큰 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// 토큰 만료 시간 (초) — 생략 시 86,400초로 간주
    #[serde(default)]
    pub expires_in: Option<i64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// KIS OAuth 오류 응답 (토큰 발급 실패 시).
#[derive(Debug, Clone, Deserialize)]
pub struct KisOAuthErrorResponse {
    /// 에러 코드 (예: "EGW00103")
    pub error_code: String,
    /// 에러 설명 (예: "유효하지 않은 AppKey입니다.")
    pub error_description: String,
}

/// 만료 추적이 포함된 토큰 상태.
///
/// 토큰 파일에 그대로 직렬화되어 프로세스 재기동 간에 유지됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenState {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입
    pub token_type: String,
    /// 발급 시각
    pub issued_at: DateTime<Utc>,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// 토큰이 아직 사용 가능한지 확인 (안전 마진 포함).
    pub fn is_usable(&self) -> bool {
        Utc::now() < self.expires_at - Duration::seconds(TOKEN_SAFETY_MARGIN_SECS)
    }

    /// 인증 헤더 값 반환.
    pub fn auth_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// KIS OAuth 인증 관리자.
///
/// 자격증명 세트 하나당 인스턴스 하나. 토큰 갱신은 토큰 슬롯의 원자적
/// 교체로 처리됩니다 — 동시에 갱신이 경합하면 중복 발급이 일어날 수
/// 있으나 마지막 쓰기가 이기며, 발급은 멱등이므로 정확성 문제는 없습니다.
pub struct KisOAuth {
    config: KisConfig,
    client: Client,
    token: RwLock<Option<TokenState>>,
    file_probed: AtomicBool,
}

impl KisOAuth {
    /// 새로운 OAuth 관리자 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `KisError::Configuration`을 반환합니다.
    pub fn new(config: KisConfig) -> Result<Self, KisError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KisError::Configuration(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self {
            config,
            client,
            token: RwLock::new(None),
            file_probed: AtomicBool::new(false),
        })
    }

    /// 유효한 접근 토큰 반환, 필요시 발급.
    ///
    /// 우선순위: 메모리 캐시 → 토큰 파일 (프로세스당 1회 읽기) → 신규 발급.
    pub async fn get_valid_token(&self) -> Result<TokenState, KisError> {
        {
            let token_guard = self.token.read().await;
            if let Some(ref token) = *token_guard {
                if token.is_usable() {
                    debug!("Using cached KIS token (expires at: {})", token.expires_at);
                    return Ok(token.clone());
                }
                warn!(
                    "KIS token expired or expiring soon (expires at: {}), re-acquiring",
                    token.expires_at
                );
            }
        }

        // 토큰 파일은 프로세스 수명 동안 한 번만 읽는다 (read-through)
        if !self.file_probed.swap(true, Ordering::SeqCst) {
            if let Some(token) = self.load_token_file().await {
                if token.is_usable() {
                    info!(
                        "Reusing persisted KIS token from file (expires at: {})",
                        token.expires_at
                    );
                    let mut token_guard = self.token.write().await;
                    *token_guard = Some(token.clone());
                    return Ok(token);
                }
                debug!("Persisted KIS token is stale, requesting a new one");
            }
        }

        self.request_token().await
    }

    /// 메모리와 토큰 파일 상태 모두 삭제 (로그아웃/리셋).
    pub async fn clear(&self) {
        {
            let mut token_guard = self.token.write().await;
            *token_guard = None;
        }

        let path = self.config.token_file_path();
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("KIS token file removed: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove token file {}: {}", path.display(), e),
        }
    }

    /// 유효한 토큰이 캐시되어 있는지 확인.
    pub async fn has_valid_token(&self) -> bool {
        let token_guard = self.token.read().await;
        token_guard.as_ref().map(|t| t.is_usable()).unwrap_or(false)
    }

    /// 현재 토큰 만료 시각 반환.
    pub async fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        let token_guard = self.token.read().await;
        token_guard.as_ref().map(|t| t.expires_at)
    }

    /// 업스트림 OAuth 엔드포인트에서 새 토큰 발급.
    async fn request_token(&self) -> Result<TokenState, KisError> {
        info!(
            "Requesting new KIS access token... (AppKey: {}...)",
            &self.config.app_key.chars().take(8).collect::<String>()
        );

        let url = format!("{}/oauth2/tokenP", self.config.rest_base_url());

        #[derive(Serialize)]
        struct TokenRequest<'a> {
            grant_type: &'a str,
            appkey: &'a str,
            appsecret: &'a str,
        }

        let request_body = TokenRequest {
            grant_type: "client_credentials",
            appkey: &self.config.app_key,
            appsecret: self.config.app_secret(),
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| KisError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KisError::Network(e.to_string()))?;

        if !status.is_success() {
            // OAuth 에러 응답 파싱 시도, 실패하면 원본 본문 그대로 전달
            let detail = match serde_json::from_str::<KisOAuthErrorResponse>(&body) {
                Ok(oauth_error) => format!(
                    "{} ({})",
                    oauth_error.error_description, oauth_error.error_code
                ),
                Err(_) => format!("{} - {}", status, body),
            };
            return Err(KisError::TokenAcquisition(detail));
        }

        let token_resp: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| KisError::Parse(format!("Failed to parse token response: {}", e)))?;

        let now = Utc::now();
        let lifetime = token_resp.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let token_state = TokenState {
            access_token: token_resp.access_token,
            token_type: token_resp.token_type,
            issued_at: now,
            expires_at: now + Duration::seconds(lifetime),
        };

        // 토큰 슬롯 원자적 교체
        {
            let mut token_guard = self.token.write().await;
            *token_guard = Some(token_state.clone());
        }

        // 파일 저장 실패는 치명적이지 않음 — 메모리 토큰은 계속 사용
        if let Err(e) = self.persist_token_file(&token_state).await {
            warn!("Failed to persist KIS token file: {}", e);
        }

        info!(
            "KIS access token obtained, expires at: {}",
            token_state.expires_at
        );

        Ok(token_state)
    }

    /// 토큰 파일 읽기. 없거나 손상된 경우 None.
    async fn load_token_file(&self) -> Option<TokenState> {
        let path = self.config.token_file_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read token file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<TokenState>(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Corrupt token file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// 토큰 파일 쓰기.
    async fn persist_token_file(&self, token: &TokenState) -> std::io::Result<()> {
        let path = self.config.token_file_path();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(token)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(&path, json).await?;

        debug!("KIS token persisted to {}", path.display());
        Ok(())
    }

    /// 인증된 요청을 위한 공통 헤더 생성.
    ///
    /// # Errors
    /// 헤더 값 파싱에 실패하면 `KisError::InvalidHeader`를 반환합니다.
    pub async fn build_headers(&self, tr_id: &str) -> Result<reqwest::header::HeaderMap, KisError> {
        let token = self.get_valid_token().await?;

        let mut headers = reqwest::header::HeaderMap::new();

        // 상수 문자열은 컴파일 타임에 검증되므로 unwrap() 안전
        headers.insert(
            "Content-Type",
            "application/json; charset=utf-8".parse().unwrap(),
        );
        headers.insert("custtype", "P".parse().unwrap());

        headers.insert(
            "authorization",
            token
                .auth_header()
                .parse()
                .map_err(|_| KisError::InvalidHeader("authorization".to_string()))?,
        );
        headers.insert(
            "appkey",
            self.config
                .app_key
                .parse()
                .map_err(|_| KisError::InvalidHeader("appkey".to_string()))?,
        );
        headers.insert(
            "appsecret",
            self.config
                .app_secret()
                .parse()
                .map_err(|_| KisError::InvalidHeader("appsecret".to_string()))?,
        );
        headers.insert(
            "tr_id",
            tr_id
                .parse()
                .map_err(|_| KisError::InvalidHeader(format!("tr_id: {}", tr_id)))?,
        );

        Ok(headers)
    }

    /// 설정 반환.
    pub fn config(&self) -> &KisConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kis::config::KisEnvironment;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicU64;

    static TEST_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    fn temp_token_dir() -> PathBuf {
        let seq = TEST_DIR_SEQ.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "broker-exchange-test-{}-{}",
            std::process::id(),
            seq
        ))
    }

    fn test_config(base_url: &str) -> KisConfig {
        KisConfig::new(
            "test_app_key".to_string(),
            "test_app_secret".to_string(),
            "12345678-01".to_string(),
            KisEnvironment::Paper,
        )
        .with_base_url(base_url)
        .with_token_dir(temp_token_dir())
    }

    fn token_expiring_in(secs: i64) -> TokenState {
        let now = Utc::now();
        TokenState {
            access_token: "tok".to_string(),
            token_type: "Bearer".to_string(),
            issued_at: now,
            expires_at: now + Duration::seconds(secs),
        }
    }

    #[test]
    fn test_token_usable_with_margin() {
        assert!(token_expiring_in(3600).is_usable());
        // 안전 마진(60초) 이내면 사용 불가
        assert!(!token_expiring_in(30).is_usable());
        assert!(!token_expiring_in(-10).is_usable());
    }

    #[test]
    fn test_auth_header_format() {
        let token = token_expiring_in(3600);
        assert_eq!(token.auth_header(), "Bearer tok");
    }

    #[tokio::test]
    async fn test_valid_token_issues_zero_oauth_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth2/tokenP")
            .with_status(200)
            .with_body(r#"{"access_token":"fresh","token_type":"Bearer","expires_in":86400}"#)
            .expect(1)
            .create_async()
            .await;

        let oauth = KisOAuth::new(test_config(&server.url())).unwrap();

        // 첫 호출: NoToken → Valid (네트워크 1회)
        let first = oauth.get_valid_token().await.unwrap();
        assert_eq!(first.access_token, "fresh");

        // 이후 호출: 캐시 재사용 (네트워크 0회)
        let second = oauth.get_valid_token().await.unwrap();
        assert_eq!(second.access_token, "fresh");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_triggers_exactly_one_renewal() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth2/tokenP")
            .with_status(200)
            .with_body(r#"{"access_token":"renewed","token_type":"Bearer","expires_in":86400}"#)
            .expect(1)
            .create_async()
            .await;

        let oauth = KisOAuth::new(test_config(&server.url())).unwrap();

        // 만료 임박 토큰을 캐시에 심어둔다
        let stale = token_expiring_in(30);
        let stale_expiry = stale.expires_at;
        {
            let mut guard = oauth.token.write().await;
            *guard = Some(stale);
        }
        oauth.file_probed.store(true, Ordering::SeqCst);

        let renewed = oauth.get_valid_token().await.unwrap();
        assert_eq!(renewed.access_token, "renewed");
        assert!(renewed.expires_at > stale_expiry);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_lifetime_when_expires_in_missing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth2/tokenP")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","token_type":"Bearer"}"#)
            .create_async()
            .await;

        let oauth = KisOAuth::new(test_config(&server.url())).unwrap();
        let token = oauth.get_valid_token().await.unwrap();

        let lifetime = (token.expires_at - token.issued_at).num_seconds();
        assert_eq!(lifetime, DEFAULT_TOKEN_LIFETIME_SECS);
    }

    #[tokio::test]
    async fn test_token_acquisition_error_carries_upstream_detail() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth2/tokenP")
            .with_status(403)
            .with_body(
                r#"{"error_code":"EGW00103","error_description":"유효하지 않은 AppKey입니다."}"#,
            )
            .create_async()
            .await;

        let oauth = KisOAuth::new(test_config(&server.url())).unwrap();
        let err = oauth.get_valid_token().await.unwrap_err();

        match err {
            KisError::TokenAcquisition(detail) => {
                assert!(detail.contains("EGW00103"));
                assert!(detail.contains("유효하지 않은"));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_token_file_reused_across_instances() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/oauth2/tokenP")
            .with_status(200)
            .with_body(r#"{"access_token":"persisted","token_type":"Bearer","expires_in":86400}"#)
            .expect(1)
            .create_async()
            .await;

        let config = test_config(&server.url());

        // 첫 인스턴스가 발급 + 파일 저장
        let first = KisOAuth::new(config.clone()).unwrap();
        first.get_valid_token().await.unwrap();

        // 두 번째 인스턴스(재기동 시뮬레이션)는 파일에서 재사용
        let second = KisOAuth::new(config.clone()).unwrap();
        let token = second.get_valid_token().await.unwrap();
        assert_eq!(token.access_token, "persisted");

        mock.assert_async().await;

        tokio::fs::remove_dir_all(&config.token_dir).await.ok();
    }

    #[tokio::test]
    async fn test_clear_removes_memory_and_file() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth2/tokenP")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","token_type":"Bearer","expires_in":86400}"#)
            .create_async()
            .await;

        let config = test_config(&server.url());
        let oauth = KisOAuth::new(config.clone()).unwrap();

        oauth.get_valid_token().await.unwrap();
        assert!(oauth.has_valid_token().await);
        assert!(config.token_file_path().exists());

        oauth.clear().await;
        assert!(!oauth.has_valid_token().await);
        assert!(!config.token_file_path().exists());

        tokio::fs::remove_dir_all(&config.token_dir).await.ok();
    }
}
