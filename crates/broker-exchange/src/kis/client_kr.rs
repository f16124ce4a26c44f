//! KIS 국내 주식 REST API 클라이언트.
//!
//! # 지원 기능
//!
//! - 잔고 조회 (보유 종목 + 계좌 요약)
//! - 현재가 조회
//!
//! 이 계층에는 재시도 로직이 없습니다. 전송 실패와 non-2xx 응답,
//! `rt_cd != "0"`인 2xx 응답 모두 `KisError::Upstream`으로 전파됩니다.

use super::auth::KisOAuth;
use super::config::KisEnvironment;
use super::de::{deserialize_decimal, deserialize_one_or_many};
use super::tr_id;
use crate::KisError;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error};

/// KIS 국내 주식 REST API 클라이언트.
///
/// `KisOAuth`를 `Arc`로 공유하여 국내/해외 클라이언트가 같은 토큰을
/// 사용합니다. KIS API는 토큰 발급을 1분에 1회로 제한하므로 토큰 공유가
/// 필수적입니다.
pub struct KisKrClient {
    oauth: Arc<KisOAuth>,
    client: Client,
}

impl KisKrClient {
    /// 공유된 OAuth로 국내 주식 클라이언트 생성.
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

    /// 환경에 따른 적절한 tr_id 반환.
    fn balance_tr_id(&self) -> &'static str {
        match self.oauth.config().environment {
            KisEnvironment::Real => tr_id::KR_BALANCE_REAL,
            KisEnvironment::Paper => tr_id::KR_BALANCE_PAPER,
        }
    }

    /// 잔고 조회.
    ///
    /// `output1`은 보유 종목 배열, `output2`는 계좌 요약입니다.
    pub async fn get_balance(&self) -> Result<KrBalance, KisError> {
        let url = format!(
            "{}/uapi/domestic-stock/v1/trading/inquire-balance",
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
                ("AFHR_FLPR_YN", "N"),
                ("OFL_YN", ""),
                ("INQR_DVSN", "02"),
                ("UNPR_DVSN", "01"),
                ("FUND_STTL_ICLD_YN", "N"),
                ("FNCG_AMT_AUTO_RDPT_YN", "N"),
                ("PRCS_DVSN", "00"),
                ("CTX_AREA_FK100", ""),
                ("CTX_AREA_NK100", ""),
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
            error!("KR balance inquiry failed: {} - {}", status, body);
            return Err(KisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        debug!("KR balance response received ({} bytes)", body.len());

        let resp: KisKrBalanceResponse = serde_json::from_str(&body)
            .map_err(|e| KisError::Parse(format!("Failed to parse balance response: {}", e)))?;

        if resp.rt_cd != "0" {
            return Err(KisError::Upstream {
                status: status.as_u16(),
                body: format!("[{}] {}", resp.msg_cd, resp.msg1),
            });
        }

        Ok(KrBalance {
            holdings: resp.output1,
            summary: resp.output2.into_iter().next(),
        })
    }

    /// 주식현재가 시세 조회.
    ///
    /// # 인자
    /// * `stock_code` - 종목코드 (예: "005930" 삼성전자)
    pub async fn get_quote(&self, stock_code: &str) -> Result<KrQuote, KisError> {
        let url = format!(
            "{}/uapi/domestic-stock/v1/quotations/inquire-price",
            self.oauth.config().rest_base_url()
        );

        let headers = self.oauth.build_headers(tr_id::KR_PRICE).await?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .query(&[
                ("FID_COND_MRKT_DIV_CODE", "J"),
                ("FID_INPUT_ISCD", stock_code),
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
            error!("KR price inquiry failed: {} - {}", status, body);
            return Err(KisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let resp: KisKrQuoteResponse = serde_json::from_str(&body)
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

/// 국내 계좌 보유 종목.
#[derive(Debug, Clone, Deserialize)]
pub struct KrHolding {
    /// 종목코드
    #[serde(rename = "pdno", default)]
    pub stock_code: String,
    /// 종목명
    #[serde(rename = "prdt_name", default)]
    pub stock_name: String,
    /// 보유수량 (누락 시 0)
    #[serde(rename = "hldg_qty", default, deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,
    /// 매입평균가격
    #[serde(
        rename = "pchs_avg_pric",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub avg_price: Decimal,
    /// 현재가
    #[serde(rename = "prpr", default, deserialize_with = "deserialize_decimal")]
    pub current_price: Decimal,
    /// 평가금액
    #[serde(rename = "evlu_amt", default, deserialize_with = "deserialize_decimal")]
    pub eval_amount: Decimal,
    /// 평가손익금액
    #[serde(
        rename = "evlu_pfls_amt",
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

/// 국내 계좌 요약.
#[derive(Debug, Clone, Deserialize)]
pub struct KrAccountSummary {
    /// 예수금
    #[serde(
        rename = "dnca_tot_amt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub deposit: Decimal,
    /// 총 평가금액
    #[serde(
        rename = "tot_evlu_amt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub total_eval_amount: Decimal,
    /// 총 평가손익
    #[serde(
        rename = "evlu_pfls_smtl_amt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub total_profit_loss: Decimal,
    /// 매입금액 합계
    #[serde(
        rename = "pchs_amt_smtl_amt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub total_purchase_amount: Decimal,
}

/// 국내 계좌 잔고.
#[derive(Debug, Clone)]
pub struct KrBalance {
    /// 보유 종목
    pub holdings: Vec<KrHolding>,
    /// 계좌 요약
    pub summary: Option<KrAccountSummary>,
}

/// 국내 주식 시세 데이터.
#[derive(Debug, Clone, Deserialize)]
pub struct KrQuote {
    /// 현재가
    #[serde(
        rename = "stck_prpr",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub current_price: Decimal,
    /// 전일대비
    #[serde(
        rename = "prdy_vrss",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub price_change: Decimal,
    /// 등락률 (%)
    #[serde(
        rename = "prdy_ctrt",
        default,
        deserialize_with = "deserialize_decimal"
    )]
    pub change_rate: Decimal,
    /// 전일대비 부호 ("1"|"2" 상승, "3" 보합, "4"|"5" 하락)
    #[serde(rename = "prdy_vrss_sign", default)]
    pub change_sign: String,
}

// ========================================
// API 응답 래퍼
// ========================================

#[derive(Debug, Deserialize)]
struct KisKrBalanceResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output1: Vec<KrHolding>,
    /// 배열 또는 단일 객체 모두 허용
    #[serde(default, deserialize_with = "deserialize_one_or_many")]
    output2: Vec<KrAccountSummary>,
}

#[derive(Debug, Deserialize)]
struct KisKrQuoteResponse {
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    output: KrQuote,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kis::config::KisConfig;
    use rust_decimal_macros::dec;

    fn test_client(base_url: &str) -> KisKrClient {
        let config = KisConfig::new(
            "kr_test_key".to_string(),
            "kr_test_secret".to_string(),
            "12345678-01".to_string(),
            KisEnvironment::Paper,
        )
        .with_base_url(base_url)
        .with_token_dir(std::env::temp_dir().join(format!("kr-client-{}", std::process::id())));

        KisKrClient::new(Arc::new(KisOAuth::new(config).unwrap())).unwrap()
    }

    fn mock_token(server: &mut mockito::Server) -> mockito::Mock {
        server
            .mock("POST", "/oauth2/tokenP")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","token_type":"Bearer","expires_in":86400}"#)
            .create()
    }

    #[test]
    fn test_balance_response_with_summary_array() {
        let body = r#"{
            "rt_cd": "0", "msg_cd": "KIOK0510", "msg1": "조회되었습니다",
            "output1": [
                {"pdno": "005930", "prdt_name": "삼성전자", "hldg_qty": "10",
                 "pchs_avg_pric": "70000", "prpr": "75000", "evlu_amt": "750000",
                 "evlu_pfls_amt": "50000", "evlu_pfls_rt": "7.14"}
            ],
            "output2": [
                {"dnca_tot_amt": "1000000", "tot_evlu_amt": "1750000",
                 "evlu_pfls_smtl_amt": "50000", "pchs_amt_smtl_amt": "700000"}
            ]
        }"#;

        let resp: KisKrBalanceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.output1.len(), 1);
        assert_eq!(resp.output1[0].quantity, dec!(10));
        assert_eq!(resp.output2[0].deposit, dec!(1000000));
    }

    #[test]
    fn test_balance_response_with_summary_object() {
        // 일부 환경은 output2를 단일 객체로 반환
        let body = r#"{
            "rt_cd": "0",
            "output1": [],
            "output2": {"dnca_tot_amt": "500000", "tot_evlu_amt": "500000",
                        "evlu_pfls_smtl_amt": "0", "pchs_amt_smtl_amt": "0"}
        }"#;

        let resp: KisKrBalanceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.output2.len(), 1);
        assert_eq!(resp.output2[0].deposit, dec!(500000));
    }

    #[tokio::test]
    async fn test_get_quote_contract() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server);

        server
            .mock(
                "GET",
                "/uapi/domestic-stock/v1/quotations/inquire-price",
            )
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("FID_COND_MRKT_DIV_CODE".into(), "J".into()),
                mockito::Matcher::UrlEncoded("FID_INPUT_ISCD".into(), "005930".into()),
            ]))
            .match_header("tr_id", "FHKST01010100")
            .match_header("custtype", "P")
            .with_status(200)
            .with_body(
                r#"{"rt_cd":"0","msg_cd":"","msg1":"",
                    "output":{"stck_prpr":"75000","prdy_vrss":"1200",
                              "prdy_ctrt":"1.63","prdy_vrss_sign":"2"}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let quote = client.get_quote("005930").await.unwrap();

        assert_eq!(quote.current_price, dec!(75000));
        assert_eq!(quote.change_sign, "2");
    }

    #[tokio::test]
    async fn test_rt_cd_failure_is_upstream_error() {
        let mut server = mockito::Server::new_async().await;
        mock_token(&mut server);

        server
            .mock(
                "GET",
                "/uapi/domestic-stock/v1/quotations/inquire-price",
            )
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"rt_cd":"1","msg_cd":"EGW00123","msg1":"기간이 만료된 token 입니다",
                    "output":{"stck_prpr":"0","prdy_vrss":"0","prdy_ctrt":"0","prdy_vrss_sign":""}}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let err = client.get_quote("005930").await.unwrap_err();

        match err {
            KisError::Upstream { body, .. } => assert!(body.contains("EGW00123")),
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}
