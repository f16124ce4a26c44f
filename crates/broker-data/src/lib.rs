//! 종목 심볼 해석 레이어.
//!
//! 종목 키워드(코드, 심볼, 종목명)를 국내/해외 종목 엔트리로 해석합니다.
//! 내장 시드 목록으로 시작하여, 조회 실패 시 외부 자동완성 소스로
//! 보완합니다.

pub mod error;
pub mod provider;
pub mod symbol;

pub use error::DataError;
pub use provider::{NaverAutocompleteClient, SymbolLookupProvider};
pub use symbol::{SymbolEntry, SymbolIndex, SymbolMarket};
