//! KIS 해외 주식 REST API 클라이언트.
//!
//! # 지원 기능
//!
//! - 해외 잔고 조회 (거래소별)
//! - 해외 주식 현재가 조회
//!
//! 해외 API는 거래소 코드(`OVRS_EXCG_CD`)를 요구하며, 미국 시장은
//! NASDAQ("NAS") / NYSE("NYS") / AMEX("AMS")로 나뉩니다.

use super::auth::KisOAuth;
use super::config::KisEnvironment;
use super::de::deserialize_decimal;
use super::tr_id;
use crate::KisError;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

/// KIS 해외 주식 REST API 클라이언트.
///
/// 국내 클라이언트와 동일한 `KisOAuth`를 공유합니다.
pub struct KisUsClient {
    oauth: Arc<KisOAuth>,
    client: Client,
}

impl KisUsClient {
    /// 공유된 OAuth로 해외 주식 클라이언트 생성.
    pub fn new(oauth: Arc<KisOAuth>) -> Result<Self, KisError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(oauth.config().timeout_secs))
            .build()
            .map_err(|e| KisError::Configuration(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self { oauth, client })
    }

    /// 내부 OAuth 참조 반환.
    pub fn oauth(&self) -> &Arc<KisOAuth> {
        &self.oauth
    }

    fn balance_tr_id(&self) -> &'static str {
        match self.oauth.config().environment {
            KisEnvironment::Real => tr_id::US_BALANCE_REAL,
            KisEnvironment::Paper => tr_id::US_BALANCE_PAPER,
        }
    }

    /// 해외 잔고 조회.
    ///
    /// # 인자
    /// * `exchange` - 거래소 코드 (`exchange_code` 모듈 참고, 예: "NAS")
    pub async fn get_balance(&self, exchange: &str) -> Result<UsBalance, KisError> {
        let url = format!(
            "{}/uapi/overseas-stock/v1/trading/inquire-balance",
            self.oauth.config().rest_base_url()
        );

        let headers = self.oauth.build_headers(self.balance_tr_id()).await?;
        let cano = self.oauth.config().cano();

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(&[
                ("CANO", cano.as_str()),
                ("ACNT_PRDT_CD", self.oauth.config().acnt_prdt_cd()),
                ("OVRS_EXCG_CD", exchange),
                ("TR_CRCY_CD", "USD"),
                ("CTX_AREA_FK200", ""),
                ("CTX_AREA_NK200", ""),
            ])
            .send()
            .await
            .map_err(|e| KisError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KisError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("US balance inquiry failed ({}): {} - {}", exchange, status, body);
            return Err(KisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            "US balance response received ({}, {} bytes)",
            exchange,
            body.len()
        );

        let resp: KisUsBalanceResponse = serde_json::from_str(&body)
            .map_err(|e| KisError::Parse(format!("Failed to parse balance response: {}", e)))?;

        if resp.rt_cd != "0" {
            return Err(KisError::Upstream {
                status: status.as_u16(),
                body: format!("[{}] {}", resp.msg_cd, resp.msg1),
            });
        }

        Ok(UsBalance {
            holdings: resp.output1,
        })
    }

    /// 해외 주식 현재가 조회.
    ///
    /// # 인자
    /// * `symbol` - 종목 심볼 (예: "AAPL")
    /// * `exchange` - 거래소 코드 (예: "NAS")
    pub async fn get_quote(&self, symbol: &str, exchange: &str) -> Result<UsQuote, KisError> {
        let url = format!(
            "{}/uapi/overseas-price/v1/quotations/price",
            self.oauth.config().rest_base_url()
        );

        let headers = self.oauth.build_headers(tr_id::US_PRICE).await?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(&[("AUTH", ""), ("EXCD", exchange), ("SYMB", symbol)])
            .send()
            .await
            .map_err(|e| KisError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| KisError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("US price inquiry failed ({}): {} - {}", symbol, status, body);
            return Err(KisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let resp: KisUsQuoteResponse = serde_json::from_str(&body)
            .map_err(|e| KisError::Parse(format!("Failed to parse price response: {}", e)))?;

        if resp.rt_cd != "0" {
            return Err(KisError::Upstream {
                status: status.as_u16(),
                body: format!("[{}] {}", resp.msg_cd, resp.msg1),
            });
        }

        Ok(resp.output)
    }
}

// ========================================
// 응답 타입
// ========================================

/// 해외 계좌 보유 종목.
#[derive(Debug, Clone, Deserialize)]
pub struct UsHolding {
    /// 종목 심볼
    #[serde(rename = "ovrs_pdno", default)]
    pub symbol: String,
    /// 종목명
    #[serde(rename = "ovrs_item_name", default)]
    pub name: String,
    /// 잔고수량 (누락 시 0)
    #[serde(
        rename = "ovrs_cblc_qty",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub quantity: Decimal,
    /// 외화 매입금액
    #[serde(
        rename = "frcr_pchs_amt1",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub purchase_amount: Decimal,
    /// 현재가
    #[serde(rename = "now_pric2", default, deserialize_with = "deserialize_decimal")]
    pub current_price: Decimal,
    /// 평가금액
    #[serde(
        rename = "ovrs_stck_evlu_amt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub eval_amount: Decimal,
    /// 외화 평가손익
    #[serde(
        rename = "frcr_evlu_pfls_amt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub profit_loss: Decimal,
    /// 평가손익률 (%)
    #[serde(
        rename = "evlu_pfls_rt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub profit_loss_rate: Decimal,
}

/// 해외 계좌 잔고.
///
/// 해외 잔고 조회에는 국내의 `output2` 같은 계좌 요약이 없습니다.
#[derive(Debug, Clone)]
pub struct UsBalance {
    /// 보유 종목
    pub holdings: Vec<UsHolding>,
}

/// 해외 주식 시세 데이터.
#[derive(Debug, Clone, Deserialize)]
pub struct UsQuote {
    /// 현재가
    #[serde(rename = "last", default, deserialize_with = "deserialize_decimal")]
    pub current_price: Decimal,
    /// 전일대비
    #[serde(rename = "diff", default, deserialize_with = "deserialize_decimal")]
    pub price_change: Decimal,
    /// 등락률 (%)
    #[serde(rename = "rate", default, deserialize_with = "deserialize_decimal")]
    pub change_rate: Decimal,
}

// ========================================
// API 응답 래퍼
// ========================================

#[derive(Debug, Deserialize)]
struct KisUsBalanceResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output1: Vec<UsHolding>,
}

#[derive(Debug, Deserialize)]
struct KisUsQuoteResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    output: UsQuote,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kis::config::KisConfig;
    use rust_decimal_macros::dec;

    fn test_client(base_url: &str) -> KisUsClient {
        let config = KisConfig::new(
            "us_test_key".to_string(),
            "us_test_secret".to_string(),
            "12345678-01".to_string(),
            KisEnvironment::Paper,
        )
        .with_base_url(base_url)
        .with_token_dir(std::env::temp_dir().join(format!("us-client-{}", std::process::id())));

        KisUsClient::new(Arc::new(KisOAuth::new(config).unwrap())).unwrap()
    }

    fn mock_token(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("POST", "/oauth2/tokenP")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","token_type":"Bearer","expires_in":86400}"#)
            .create()
    }

    #[test]
    fn test_balance_response_parsing() {
        let body = r#"{
            "rt_cd": "0", "msg_cd": "", "msg1": "",
            "output1": [
                {"ovrs_pdno": "AAPL", "ovrs_item_name": "APPLE INC",
                 "ovrs_cblc_qty": "5", "frcr_pchs_amt1": "850.00",
                 "now_pric2": "180.50", "ovrs_stck_evlu_amt": "902.50",
                 "frcr_evlu_pfls_amt": "52.50", "evlu_pfls_rt": "6.18"}
            ]
        }"#;

        let resp: KisUsBalanceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.output1.len(), 1);
        assert_eq!(resp.output1[0].symbol, "AAPL");
        assert_eq!(resp.output1[0].eval_amount, dec!(902.50));
    }

    #[test]
    fn test_holding_missing_quantity_defaults_to_zero() {
        // 일부 응답 행은 수량 필드가 빠진 채 내려온다
        let body = r#"{
            "rt_cd": "0",
            "output1": [{"ovrs_pdno": "TSLA", "ovrs_item_name": "TESLA INC"}]
        }"#;

        let resp: KisUsBalanceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.output1[0].quantity, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_get_quote_contract() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server);

        server
            .mock("GET", "/uapi/overseas-price/v1/quotations/price")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("EXCD".into(), "NAS".into()),
                mockito::Matcher::UrlEncoded("SYMB".into(), "AAPL".into()),
            ]))
            .match_header("tr_id", "HHDFS00000300")
            .with_status(200)
            .with_body(
                r#"{"rt_cd":"0","msg_cd":"","msg1":"",
                    "output":{"last":"180.50","diff":"2.30","rate":"1.29"}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let quote = client.get_quote("AAPL", "NAS").await.unwrap();

        assert_eq!(quote.current_price, dec!(180.50));
        assert_eq!(quote.change_rate, dec!(1.29));
    }

    #[tokio::test]
    async fn test_upstream_http_error() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server);

        server
            .mock("GET", "/uapi/overseas-stock/v1/trading/inquire-balance")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.get_balance("NAS").await.unwrap_err();

        match err {
            KisError::Upstream { status, .. } => assert_eq!(status, 500),
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}
