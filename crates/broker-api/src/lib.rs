//! 증권 계좌 대시보드 API 서버 라이브러리.
//!
//! 사용자 인증, KIS 자격증명 관리, 계좌 요약/보유 종목 조회,
//! 자산 스냅샷 통계, 종목 시세 조회를 제공합니다.

pub mod auth;
pub mod config;
pub mod error;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
