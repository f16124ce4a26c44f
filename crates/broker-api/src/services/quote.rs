//! 시세 조회 서비스.
//!
//! 키워드(코드/심볼/종목명)를 심볼 인덱스로 해석한 뒤 해당 시장의
//! 시세 API를 호출합니다. 인덱스에 없는 6자리 숫자 키워드는 국내
//! 종목코드로 간주하고 직접 조회를 시도합니다.

use crate::error::ApiError;
use crate::services::account::AccountService;
use crate::services::normalizer::{Currency, Market};
use crate::state::AppState;
use broker_data::{DataError, SymbolEntry, SymbolMarket};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// 등락 방향.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Unchanged,
}

impl Direction {
    /// 국내 전일대비 부호에서 방향 결정.
    ///
    /// "1"(상한)|"2"(상승) → UP, "4"(하한)|"5"(하락) → DOWN, 그 외 보합.
    pub fn from_sign(sign: &str) -> Self {
        match sign {
            "1" | "2" => Direction::Up,
            "4" | "5" => Direction::Down,
            _ => Direction::Unchanged,
        }
    }

    /// 전일대비 값의 부호에서 방향 결정 (해외).
    pub fn from_change(change: Decimal) -> Self {
        if change > Decimal::ZERO {
            Direction::Up
        } else if change < Decimal::ZERO {
            Direction::Down
        } else {
            Direction::Unchanged
        }
    }
}

/// 정규화된 시세.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteView {
    /// 종목코드 또는 심볼
    pub code: String,
    /// 종목명
    pub name: String,
    /// 시장 구분
    pub market: Market,
    /// 통화
    pub currency: Currency,
    /// 현재가
    pub current_price: Decimal,
    /// 전일대비
    pub change: Decimal,
    /// 등락률 (%)
    pub change_rate: Decimal,
    /// 등락 방향
    pub direction: Direction,
}

/// 시세 조회 서비스.
pub struct QuoteService;

impl QuoteService {
    /// 키워드로 시세 조회.
    pub async fn get_quote(
        state: &AppState,
        user_id: Uuid,
        keyword: &str,
    ) -> Result<QuoteView, ApiError> {
        let entry = match state.symbols.search(keyword).await {
            Ok(entry) => entry,
            // 6자리 숫자 코드는 캐시에 없어도 국내 직접 조회를 시도한다
            Err(DataError::NotFound { .. }) if is_domestic_code(keyword) => {
                SymbolEntry::domestic(keyword, keyword)
            }
            Err(e) => return Err(e.into()),
        };

        let (kr, us) = AccountService::clients_for(state, user_id).await?;

        match entry.market {
            SymbolMarket::Domestic => {
                let quote = kr.get_quote(&entry.code).await?;
                Ok(QuoteView {
                    code: entry.code,
                    name: entry.name,
                    market: Market::Domestic,
                    currency: Currency::Krw,
                    current_price: quote.current_price,
                    change: quote.price_change,
                    change_rate: quote.change_rate,
                    direction: Direction::from_sign(&quote.change_sign),
                })
            }
            SymbolMarket::Overseas => {
                let exchange = entry.exchange.as_deref().unwrap_or("NAS");
                let quote = us.get_quote(&entry.code, exchange).await?;
                Ok(QuoteView {
                    code: entry.code,
                    name: entry.name,
                    market: Market::Overseas,
                    currency: Currency::Usd,
                    current_price: quote.current_price,
                    change: quote.price_change,
                    change_rate: quote.change_rate,
                    direction: Direction::from_change(quote.price_change),
                })
            }
        }
    }
}

/// 6자리 숫자 종목코드 여부.
fn is_domestic_code(keyword: &str) -> bool {
    keyword.len() == 6 && keyword.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_direction_from_sign() {
        assert_eq!(Direction::from_sign("1"), Direction::Up);
        assert_eq!(Direction::from_sign("2"), Direction::Up);
        assert_eq!(Direction::from_sign("3"), Direction::Unchanged);
        assert_eq!(Direction::from_sign("4"), Direction::Down);
        assert_eq!(Direction::from_sign("5"), Direction::Down);
        assert_eq!(Direction::from_sign(""), Direction::Unchanged);
    }

    #[test]
    fn test_direction_from_change() {
        assert_eq!(Direction::from_change(dec!(2.30)), Direction::Up);
        assert_eq!(Direction::from_change(dec!(-0.01)), Direction::Down);
        assert_eq!(Direction::from_change(dec!(0)), Direction::Unchanged);
    }

    #[test]
    fn test_is_domestic_code() {
        assert!(is_domestic_code("005930"));
        assert!(!is_domestic_code("AAPL"));
        assert!(!is_domestic_code("12345"));
        assert!(!is_domestic_code("1234567"));
    }
}
