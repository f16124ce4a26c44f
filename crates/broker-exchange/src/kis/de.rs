//! KIS 응답 역직렬화 헬퍼.
//!
//! KIS API는 숫자를 모두 문자열로 반환하며, 일부 필드는 빈 문자열이나
//! "-"로 내려오기도 합니다. 방어적 기본값을 적용해 역직렬화합니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

/// 문자열을 Decimal로 역직렬화.
///
/// 빈 문자열과 "-"는 0으로 처리합니다.
pub(crate) fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = String::deserialize(deserializer)?;
    if s.is_empty() || s == "-" {
        return Ok(Decimal::ZERO);
    }
    s.trim()
        .parse::<Decimal>()
        .map_err(|_| serde::de::Error::custom(format!("Invalid decimal: {}", s)))
}

/// 단일 객체 또는 배열 형태의 필드를 배열로 역직렬화.
///
/// KIS 잔고 응답의 `output2`는 환경에 따라 배열 또는 단일 객체로
/// 내려오므로 둘 다 허용합니다.
pub(crate) fn deserialize_one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(v) => Ok(v),
        OneOrMany::One(item) => Ok(vec![item]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Deserialize)]
    struct DecimalWrapper {
        #[serde(deserialize_with = "deserialize_decimal")]
        value: Decimal,
    }

    #[test]
    fn test_deserialize_decimal() {
        let parsed: DecimalWrapper = serde_json::from_str(r#"{"value": "12345.67"}"#).unwrap();
        assert_eq!(parsed.value, dec!(12345.67));
    }

    #[test]
    fn test_deserialize_empty_and_dash_as_zero() {
        let parsed: DecimalWrapper = serde_json::from_str(r#"{"value": ""}"#).unwrap();
        assert_eq!(parsed.value, Decimal::ZERO);

        let parsed: DecimalWrapper = serde_json::from_str(r#"{"value": "-"}"#).unwrap();
        assert_eq!(parsed.value, Decimal::ZERO);
    }

    #[derive(Deserialize)]
    struct ListWrapper {
        #[serde(deserialize_with = "deserialize_one_or_many")]
        items: Vec<DecimalWrapper>,
    }

    #[test]
    fn test_one_or_many() {
        let single: ListWrapper =
            serde_json::from_str(r#"{"items": {"value": "1"}}"#).unwrap();
        assert_eq!(single.items.len(), 1);

        let many: ListWrapper =
            serde_json::from_str(r#"{"items": [{"value": "1"}, {"value": "2"}]}"#).unwrap();
        assert_eq!(many.items.len(), 2);
    }
}
