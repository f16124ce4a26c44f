//! 보유 종목 정규화.
//!
//! 업스트림 국내/해외 잔고 레코드를 공통 `HoldingItem` 형태로
//! 변환합니다. 수량이 0이거나 누락된 레코드는 양쪽 파서 모두에서
//! 제외됩니다.

use broker_exchange::{KrHolding, UsHolding};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 시장 필터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    /// 전체 (국내 + 해외)
    #[default]
    All,
    /// 국내
    Domestic,
    /// 해외
    Overseas,
}

impl Market {
    /// 쿼리 문자열에서 파싱. 알 수 없는 값은 None.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALL" => Some(Market::All),
            "DOMESTIC" => Some(Market::Domestic),
            "OVERSEAS" => Some(Market::Overseas),
            _ => None,
        }
    }
}

/// 통화 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Krw,
    Usd,
}

/// 정규화된 보유 종목.
///
/// 금액 필드는 `Decimal`로 보관되며 JSON에서는 문자열로 직렬화됩니다.
/// 평균단가는 파생 규칙이 있어 미리 렌더링된 문자열입니다.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingItem {
    /// 종목코드 또는 심볼
    pub code: String,
    /// 종목명
    pub name: String,
    /// 보유수량
    pub quantity: Decimal,
    /// 평균매입가 (렌더링된 문자열, 예: "100.0")
    pub avg_price: String,
    /// 현재가
    pub current_price: Decimal,
    /// 평가금액
    pub eval_amount: Decimal,
    /// 평가손익
    pub profit_loss: Decimal,
    /// 평가손익률 (%)
    pub profit_rate: Decimal,
    /// 시장 구분
    pub market: Market,
    /// 통화
    pub currency: Currency,
}

/// 보유 종목 합산 요약.
///
/// 단일 시장에서만 합산이 가능합니다. 전체(ALL) 조회는 통화 환산
/// 정책이 없으므로 모든 필드가 null입니다.
#[derive(Debug, Clone, Serialize)]
pub struct HoldingsSummary {
    pub total_evaluation: Option<String>,
    pub total_profit_loss: Option<String>,
    pub total_purchase: Option<String>,
    pub profit_rate: Option<String>,
}

impl HoldingsSummary {
    /// 모든 필드가 null인 요약.
    pub fn empty() -> Self {
        Self {
            total_evaluation: None,
            total_profit_loss: None,
            total_purchase: None,
            profit_rate: None,
        }
    }
}

/// 국내 잔고 레코드를 정규화.
pub fn parse_domestic(holdings: &[KrHolding]) -> Vec<HoldingItem> {
    holdings
        .iter()
        .filter(|h| h.quantity > Decimal::ZERO)
        .map(|h| HoldingItem {
            code: h.stock_code.clone(),
            name: h.stock_name.clone(),
            quantity: h.quantity,
            avg_price: h.avg_price.normalize().to_string(),
            current_price: h.current_price,
            eval_amount: h.eval_amount,
            profit_loss: h.profit_loss,
            profit_rate: h.profit_loss_rate,
            market: Market::Domestic,
            currency: Currency::Krw,
        })
        .collect()
}

/// 해외 잔고 레코드를 정규화.
///
/// 해외 응답에는 평균단가 필드가 없어 누적 매입금액에서 파생합니다.
pub fn parse_overseas(holdings: &[UsHolding]) -> Vec<HoldingItem> {
    holdings
        .iter()
        .filter(|h| h.quantity > Decimal::ZERO)
        .map(|h| HoldingItem {
            code: h.symbol.clone(),
            name: h.name.clone(),
            quantity: h.quantity,
            avg_price: format_avg_price(h.purchase_amount, h.quantity),
            current_price: h.current_price,
            eval_amount: h.eval_amount,
            profit_loss: h.profit_loss,
            profit_rate: h.profit_loss_rate,
            market: Market::Overseas,
            currency: Currency::Usd,
        })
        .collect()
}

/// 평균매입가 파생.
///
/// `round(매입금액 / 수량, 2)`를 소수점 포함 형태로 렌더링합니다
/// ("100.0"). 수량이 0이면 "0"입니다.
pub fn format_avg_price(purchase: Decimal, quantity: Decimal) -> String {
    if quantity <= Decimal::ZERO {
        return "0".to_string();
    }

    let avg = (purchase / quantity).round_dp(2).normalize();
    if avg.fract().is_zero() {
        format!("{}.0", avg.trunc())
    } else {
        avg.to_string()
    }
}

/// 단일 시장 보유 종목 합산.
///
/// total_purchase는 평가금액에서 평가손익을 빼 파생하며,
/// 수익률은 매입금액이 0 이하면 "0"으로 가드됩니다.
pub fn summarize(items: &[HoldingItem], market: Market) -> HoldingsSummary {
    if market == Market::All {
        return HoldingsSummary::empty();
    }

    let total_evaluation: Decimal = items.iter().map(|i| i.eval_amount).sum();
    let total_profit_loss: Decimal = items.iter().map(|i| i.profit_loss).sum();
    let total_purchase = total_evaluation - total_profit_loss;

    let profit_rate = if total_purchase > Decimal::ZERO {
        render(
            total_profit_loss / total_purchase * Decimal::ONE_HUNDRED,
            market,
        )
    } else {
        "0".to_string()
    };

    HoldingsSummary {
        total_evaluation: Some(render(total_evaluation, market)),
        total_profit_loss: Some(render(total_profit_loss, market)),
        total_purchase: Some(render(total_purchase, market)),
        profit_rate: Some(profit_rate),
    }
}

/// 시장별 합계 렌더링: 국내는 정수 문자열, 그 외(해외)는 소수점 2자리.
/// ALL은 `summarize`에서 먼저 걸러집니다.
fn render(value: Decimal, market: Market) -> String {
    if market == Market::Domestic {
        value.round_dp(0).normalize().to_string()
    } else {
        format!("{:.2}", value.round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn kr_holding(code: &str, qty: Decimal) -> KrHolding {
        serde_json::from_value(serde_json::json!({
            "pdno": code,
            "prdt_name": "테스트종목",
            "hldg_qty": qty.to_string(),
            "pchs_avg_pric": "70000",
            "prpr": "75000",
            "evlu_amt": "750000",
            "evlu_pfls_amt": "50000",
            "evlu_pfls_rt": "7.14"
        }))
        .unwrap()
    }

    fn us_holding(symbol: &str, qty: &str, purchase: &str) -> UsHolding {
        serde_json::from_value(serde_json::json!({
            "ovrs_pdno": symbol,
            "ovrs_item_name": "TEST",
            "ovrs_cblc_qty": qty,
            "frcr_pchs_amt1": purchase,
            "now_pric2": "180.50",
            "ovrs_stck_evlu_amt": "902.50",
            "frcr_evlu_pfls_amt": "52.50",
            "evlu_pfls_rt": "6.18"
        }))
        .unwrap()
    }

    #[test]
    fn test_zero_quantity_records_dropped() {
        let holdings = vec![kr_holding("005930", dec!(10)), kr_holding("000660", dec!(0))];
        let items = parse_domestic(&holdings);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].code, "005930");
    }

    #[test]
    fn test_overseas_avg_price_derivation() {
        assert_eq!(format_avg_price(dec!(1000), dec!(10)), "100.0");
        assert_eq!(format_avg_price(dec!(850.00), dec!(5)), "170.0");
        assert_eq!(format_avg_price(dec!(333), dec!(2)), "166.5");
        assert_eq!(format_avg_price(dec!(100), dec!(3)), "33.33");
        assert_eq!(format_avg_price(dec!(1000), dec!(0)), "0");
    }

    #[test]
    fn test_overseas_parse_uses_derived_avg_price() {
        let holdings = vec![us_holding("AAPL", "10", "1000")];
        let items = parse_overseas(&holdings);
        assert_eq!(items[0].avg_price, "100.0");
        assert_eq!(items[0].currency, Currency::Usd);
    }

    #[test]
    fn test_domestic_summary_integer_rendering() {
        let holdings = vec![kr_holding("005930", dec!(10))];
        let items = parse_domestic(&holdings);
        let summary = summarize(&items, Market::Domestic);

        assert_eq!(summary.total_evaluation.as_deref(), Some("750000"));
        assert_eq!(summary.total_profit_loss.as_deref(), Some("50000"));
        // 매입금액 = 평가금액 - 평가손익
        assert_eq!(summary.total_purchase.as_deref(), Some("700000"));
        // 50000 / 700000 * 100 = 7.142857... → 정수 반올림
        assert_eq!(summary.profit_rate.as_deref(), Some("7"));
    }

    #[test]
    fn test_overseas_summary_two_decimal_rendering() {
        let holdings = vec![us_holding("AAPL", "5", "850.00")];
        let items = parse_overseas(&holdings);
        let summary = summarize(&items, Market::Overseas);

        assert_eq!(summary.total_evaluation.as_deref(), Some("902.50"));
        assert_eq!(summary.total_purchase.as_deref(), Some("850.00"));
        assert_eq!(summary.profit_rate.as_deref(), Some("6.18"));
    }

    #[test]
    fn test_all_market_summary_is_null() {
        let holdings = vec![kr_holding("005930", dec!(10))];
        let items = parse_domestic(&holdings);
        let summary = summarize(&items, Market::All);

        assert!(summary.total_evaluation.is_none());
        assert!(summary.total_profit_loss.is_none());
        assert!(summary.total_purchase.is_none());
        assert!(summary.profit_rate.is_none());
    }

    #[test]
    fn test_zero_purchase_guards_rate() {
        let summary = summarize(&[], Market::Domestic);
        assert_eq!(summary.profit_rate.as_deref(), Some("0"));
    }

    #[test]
    fn test_market_parse() {
        assert_eq!(Market::parse("all"), Some(Market::All));
        assert_eq!(Market::parse("DOMESTIC"), Some(Market::Domestic));
        assert_eq!(Market::parse("overseas"), Some(Market::Overseas));
        assert_eq!(Market::parse("KOSPI"), None);
    }
}
