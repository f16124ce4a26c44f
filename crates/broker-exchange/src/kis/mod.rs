//! 한국투자증권 (KIS) 연동 모듈.
//!
//! # 기능
//!
//! - OAuth 2.0 인증 및 자동 토큰 갱신 (토큰 파일 캐시 포함)
//! - 국내 주식 잔고/현재가 조회
//! - 해외 주식 잔고/현재가 조회
//! - 모의투자 지원
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use broker_exchange::kis::{KisConfig, KisEnvironment, KisOAuth};
//! use broker_exchange::kis::client_kr::KisKrClient;
//!
//! let config = KisConfig::new(
//!     "your_app_key".to_string(),
//!     "your_app_secret".to_string(),
//!     "12345678-01".to_string(),
//!     KisEnvironment::Paper,
//! );
//!
//! let oauth = Arc::new(KisOAuth::new(config)?);
//! let client = KisKrClient::new(Arc::clone(&oauth))?;
//! let balance = client.get_balance().await?;
//! ```

pub mod auth;
pub mod client_kr;
pub mod client_us;
pub mod config;
pub(crate) mod de;

pub use auth::{KisOAuth, TokenState};
pub use client_kr::{KisKrClient, KrAccountSummary, KrBalance, KrHolding, KrQuote};
pub use client_us::{KisUsClient, UsBalance, UsHolding, UsQuote};
pub use config::{KisConfig, KisEnvironment};

/// KIS 거래 ID (tr_id) 상수 모음.
///
/// 거래 ID는 모든 API 호출에서 작업 유형을 식별하기 위해 필요하며,
/// 일부는 실전/모의 환경에 따라 값이 다릅니다.
pub mod tr_id {
    /// 국내 주식 잔고 조회 (실전)
    pub const KR_BALANCE_REAL: &str = "TTTC8434R";
    /// 국내 주식 잔고 조회 (모의)
    pub const KR_BALANCE_PAPER: &str = "VTTC8434R";

    /// 국내 주식 현재가 조회 (실전/모의 동일)
    pub const KR_PRICE: &str = "FHKST01010100";

    /// 해외 주식 잔고 조회 (실전)
    pub const US_BALANCE_REAL: &str = "TTTS3012R";
    /// 해외 주식 잔고 조회 (모의)
    pub const US_BALANCE_PAPER: &str = "JTTT3012R";

    /// 해외 주식 현재가 조회 (실전/모의 동일)
    pub const US_PRICE: &str = "HHDFS00000300";
}

/// KIS API에서 사용하는 거래소 코드.
pub mod exchange_code {
    /// 미국 NASDAQ
    pub const NASDAQ: &str = "NAS";
    /// 미국 NYSE
    pub const NYSE: &str = "NYS";
    /// 미국 AMEX
    pub const AMEX: &str = "AMS";
}
