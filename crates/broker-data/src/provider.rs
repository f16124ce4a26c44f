//! 외부 종목 조회 소스.
//!
//! 네이버 금융 자동완성 API를 조회 소스로 사용합니다. 응답에서
//! 6자리 숫자 코드를 가진 항목만 국내 종목으로 인정합니다.

use crate::error::DataError;
use crate::symbol::SymbolEntry;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// 기본 자동완성 엔드포인트.
const NAVER_AC_URL: &str = "https://ac.finance.naver.com/ac";

/// 외부 종목 조회 소스.
#[async_trait]
pub trait SymbolLookupProvider: Send + Sync {
    /// 키워드로 종목 후보 목록 조회.
    async fn lookup(&self, keyword: &str) -> Result<Vec<SymbolEntry>, DataError>;
}

/// 네이버 금융 자동완성 클라이언트.
///
/// `GET /ac?q=<keyword>&...` 형태로 조회하며, 응답은
/// `{"query": [...], "items": [[[["005930", ...], ["삼성전자", ...]], ...]]}`
/// 형태의 중첩 배열입니다.
pub struct NaverAutocompleteClient {
    client: Client,
    base_url: String,
}

impl NaverAutocompleteClient {
    /// 기본 엔드포인트로 생성.
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(NAVER_AC_URL)
    }

    /// 엔드포인트 재정의 (테스트용).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, DataError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| DataError::Http(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// 중첩 배열 응답에서 (코드, 종목명) 쌍 추출.
    fn parse_items(value: &Value) -> Vec<SymbolEntry> {
        let mut entries = Vec::new();

        let groups = match value.get("items").and_then(Value::as_array) {
            Some(groups) => groups,
            None => return entries,
        };

        for group in groups {
            let items = match group.as_array() {
                Some(items) => items,
                None => continue,
            };

            for item in items {
                // 각 항목은 [[code, ...], [name, ...], ...] 형태
                let fields = match item.as_array() {
                    Some(fields) => fields,
                    None => continue,
                };

                let code = fields
                    .first()
                    .and_then(Value::as_array)
                    .and_then(|f| f.first())
                    .and_then(Value::as_str);
                let name = fields
                    .get(1)
                    .and_then(Value::as_array)
                    .and_then(|f| f.first())
                    .and_then(Value::as_str);

                if let (Some(code), Some(name)) = (code, name) {
                    // 6자리 숫자 코드만 국내 종목으로 인정
                    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
                        entries.push(SymbolEntry::domestic(code, name));
                    }
                }
            }
        }

        entries
    }
}

#[async_trait]
impl SymbolLookupProvider for NaverAutocompleteClient {
    async fn lookup(&self, keyword: &str) -> Result<Vec<SymbolEntry>, DataError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", keyword),
                ("q_enc", "UTF-8"),
                ("st", "111"),
                ("r_format", "json"),
                ("t_koreng", "1"),
                ("frm", "stock"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http(format!(
                "autocomplete returned {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        let entries = Self::parse_items(&body);

        debug!(
            "autocomplete lookup '{}' resolved {} candidates",
            keyword,
            entries.len()
        );

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolMarket;

    #[test]
    fn test_parse_items_filters_non_numeric_codes() {
        let body: Value = serde_json::from_str(
            r#"{
                "query": ["삼성"],
                "items": [[
                    [["005930", "_"], ["삼성전자", "_"]],
                    [["KRX:005935", "_"], ["삼성전자우", "_"]],
                    [["005380", "_"], ["현대차", "_"]]
                ]]
            }"#,
        )
        .unwrap();

        let entries = NaverAutocompleteClient::parse_items(&body);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "005930");
        assert_eq!(entries[0].name, "삼성전자");
        assert_eq!(entries[0].market, SymbolMarket::Domestic);
        assert_eq!(entries[1].code, "005380");
    }

    #[test]
    fn test_parse_items_tolerates_malformed_shapes() {
        let body: Value =
            serde_json::from_str(r#"{"query": [], "items": [["notanarray", 42]]}"#).unwrap();
        assert!(NaverAutocompleteClient::parse_items(&body).is_empty());

        let body: Value = serde_json::from_str(r#"{"message": "error"}"#).unwrap();
        assert!(NaverAutocompleteClient::parse_items(&body).is_empty());
    }

    #[tokio::test]
    async fn test_lookup_contract() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/ac")
            .match_query(mockito::Matcher::UrlEncoded("q".into(), "삼성전자".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"query": ["삼성전자"],
                    "items": [[[["005930", "_"], ["삼성전자", "_"]]]]}"#,
            )
            .create_async()
            .await;

        let client =
            NaverAutocompleteClient::with_base_url(format!("{}/ac", server.url())).unwrap();
        let entries = client.lookup("삼성전자").await.unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, "005930");
    }

    #[tokio::test]
    async fn test_lookup_http_error() {
        let mut server = mockito::Server::new_async().await;

        server
            .mock("GET", "/ac")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let client =
            NaverAutocompleteClient::with_base_url(format!("{}/ac", server.url())).unwrap();
        let err = client.lookup("테스트").await.unwrap_err();

        assert!(matches!(err, DataError::Http(_)));
    }
}
