//! 애플리케이션 공유 상태.

use crate::config::AppConfig;
use broker_core::crypto::CredentialEncryptor;
use broker_data::SymbolIndex;
use broker_exchange::{KisConfig, KisEnvironment, KisOAuth};
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// 프로세스 전역 공유 상태.
///
/// `Arc<AppState>`로 모든 핸들러에 주입됩니다. OAuth 캐시는 사용자별로
/// `KisOAuth`를 공유하여 토큰 발급 횟수를 최소화합니다 (KIS는 발급을
/// 1분당 1회로 제한).
pub struct AppState {
    /// Postgres 연결 풀
    pub pool: PgPool,
    /// 자격증명 암호화 관리자
    pub encryptor: CredentialEncryptor,
    /// 종목 심볼 인덱스
    pub symbols: Arc<SymbolIndex>,
    /// JWT 서명 시크릿
    pub jwt_secret: String,
    /// JWT 만료 시간 (분)
    pub jwt_expires_minutes: i64,
    /// KIS 환경 (실전/모의)
    pub kis_environment: KisEnvironment,
    /// 토큰 파일 디렉터리
    pub kis_token_dir: PathBuf,
    /// 업스트림 요청 타임아웃 (초)
    pub upstream_timeout_secs: u64,
    /// 사용자별 OAuth 캐시
    oauth_cache: RwLock<HashMap<Uuid, Arc<KisOAuth>>>,
}

impl AppState {
    /// 상태 생성.
    pub fn new(
        config: &AppConfig,
        pool: PgPool,
        encryptor: CredentialEncryptor,
        symbols: Arc<SymbolIndex>,
    ) -> Self {
        Self {
            pool,
            encryptor,
            symbols,
            jwt_secret: config.jwt_secret.clone(),
            jwt_expires_minutes: config.jwt_expires_minutes,
            kis_environment: config.kis_environment,
            kis_token_dir: config.kis_token_dir.clone(),
            upstream_timeout_secs: config.upstream_timeout_secs,
            oauth_cache: RwLock::new(HashMap::new()),
        }
    }

    /// 사용자의 OAuth 인스턴스 조회 또는 생성.
    ///
    /// 이미 캐시된 인스턴스가 있으면 그대로 반환하여 토큰 상태를
    /// 재사용합니다.
    pub async fn oauth_for(
        &self,
        user_id: Uuid,
        config: KisConfig,
    ) -> Result<Arc<KisOAuth>, broker_exchange::KisError> {
        {
            let cache = self.oauth_cache.read().await;
            if let Some(oauth) = cache.get(&user_id) {
                return Ok(Arc::clone(oauth));
            }
        }

        let mut cache = self.oauth_cache.write().await;
        // 쓰기 락 획득 사이에 다른 태스크가 먼저 넣었을 수 있다
        if let Some(oauth) = cache.get(&user_id) {
            return Ok(Arc::clone(oauth));
        }

        let oauth = Arc::new(KisOAuth::new(config)?);
        cache.insert(user_id, Arc::clone(&oauth));
        Ok(oauth)
    }

    /// 사용자의 OAuth 캐시 무효화.
    ///
    /// 자격증명이 재등록되면 기존 토큰 상태를 버려야 합니다.
    pub async fn invalidate_oauth(&self, user_id: Uuid) {
        let removed = self.oauth_cache.write().await.remove(&user_id);
        if let Some(oauth) = removed {
            oauth.clear().await;
        }
    }
}
