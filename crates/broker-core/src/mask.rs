//! 민감 값 마스킹 유틸리티.

/// 민감 값을 마스킹합니다.
///
/// 마지막 4글자만 노출하고 앞부분은 "****"로 대체합니다.
/// 길이가 4 이하이면 전체를 "****"로 대체합니다.
///
/// # Example
/// ```
/// use broker_core::mask_value;
///
/// assert_eq!(mask_value("ABCDEFGH1234"), "****1234");
/// assert_eq!(mask_value("ABC"), "****");
/// ```
pub fn mask_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }

    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_long_value() {
        assert_eq!(mask_value("ABCDEFGH1234"), "****1234");
        assert_eq!(mask_value("12345"), "****2345");
    }

    #[test]
    fn test_mask_short_value() {
        assert_eq!(mask_value("ABC"), "****");
        assert_eq!(mask_value("1234"), "****");
        assert_eq!(mask_value(""), "****");
    }

    #[test]
    fn test_mask_multibyte_value() {
        // 문자 단위로 동작 (바이트 단위가 아님)
        assert_eq!(mask_value("삼성전자우선주"), "****자우선주");
    }
}
