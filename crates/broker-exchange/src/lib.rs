//! 한국투자증권 (KIS) Open API 연동 크레이트.
//!
//! 제공 기능:
//! - OAuth 2.0 토큰 수명 주기 관리 (메모리 + 토큰 파일 캐시)
//! - 국내 주식 잔고/현재가 조회
//! - 해외 주식 잔고/현재가 조회
//!
//! 공식 API 문서: <https://apiportal.koreainvestment.com/>

pub mod error;
pub mod kis;

pub use error::KisError;
pub use kis::{
    auth::{KisOAuth, TokenState},
    client_kr::{KisKrClient, KrAccountSummary, KrBalance, KrHolding, KrQuote},
    client_us::{KisUsClient, UsBalance, UsHolding, UsQuote},
    config::{KisConfig, KisEnvironment},
};
