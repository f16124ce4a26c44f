//! 서버 설정.
//!
//! 환경변수에서 설정을 로드합니다. 데이터베이스 URL, JWT 시크릿,
//! 암호화 마스터 키는 필수이며 없으면 기동에 실패합니다.

use broker_core::CoreError;
use broker_exchange::KisEnvironment;
use std::path::PathBuf;

/// 서버 전체 설정.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
    /// Postgres 연결 URL
    pub database_url: String,
    /// JWT 서명 시크릿
    pub jwt_secret: String,
    /// JWT 만료 시간 (분)
    pub jwt_expires_minutes: i64,
    /// 자격증명 암호화 마스터 키 (base64, 32바이트)
    pub encryption_master_key: String,
    /// KIS 환경 기본값
    pub kis_environment: KisEnvironment,
    /// KIS 토큰 파일 디렉터리
    pub kis_token_dir: PathBuf,
    /// 업스트림 요청 타임아웃 (초)
    pub upstream_timeout_secs: u64,
    /// HTTP 요청 전역 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// 환경변수에서 설정 로드.
    ///
    /// # Errors
    /// `DATABASE_URL`, `JWT_SECRET`, `ENCRYPTION_MASTER_KEY`가 없으면
    /// `CoreError::Configuration`을 반환합니다.
    pub fn from_env() -> Result<Self, CoreError> {
        let host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let database_url = required_var("DATABASE_URL")?;
        let jwt_secret = required_var("JWT_SECRET")?;
        let encryption_master_key = required_var("ENCRYPTION_MASTER_KEY")?;

        let jwt_expires_minutes = std::env::var("JWT_EXPIRES_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60 * 24);

        let kis_environment = match std::env::var("KIS_ENVIRONMENT") {
            Ok(value) => KisEnvironment::parse(&value).ok_or_else(|| {
                CoreError::Configuration(format!(
                    "KIS_ENVIRONMENT 값이 유효하지 않습니다: {}",
                    value
                ))
            })?,
            Err(_) => KisEnvironment::default(),
        };

        let kis_token_dir = std::env::var("KIS_TOKEN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".tokens"));

        let upstream_timeout_secs = std::env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            jwt_expires_minutes,
            encryption_master_key,
            kis_environment,
            kis_token_dir,
            upstream_timeout_secs,
            request_timeout_secs,
        })
    }

    /// 바인딩 주소 문자열.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_var(name: &str) -> Result<String, CoreError> {
    std::env::var(name)
        .map_err(|_| CoreError::Configuration(format!("{} 환경변수가 설정되지 않았습니다", name)))
}
