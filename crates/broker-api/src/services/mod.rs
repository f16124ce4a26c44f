//! 도메인 서비스 모듈.

pub mod account;
pub mod normalizer;
pub mod quote;
pub mod snapshot;
