// Storage encoding for list-valued columns (links, tags)
// Lists are persisted as JSON array text

use crate::error::{AppError, AppResult};

pub fn encode_list(items: &[String]) -> AppResult<String> {
    serde_json::to_string(items)
        .map_err(|e| AppError::EncodingError(format!("Failed to encode list: {}", e)))
}

/// Empty column text decodes to an empty list so rows written before a
/// default existed still load.
pub fn decode_list(text: &str) -> AppResult<Vec<String>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text)
        .map_err(|e| AppError::EncodingError(format!("Failed to decode list '{}': {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_order_and_content() {
        let cases: Vec<Vec<String>> = vec![
            vec![],
            vec!["https://github.com/alice".to_string()],
            vec![
                "b".to_string(),
                "a".to_string(),
                "b".to_string(),
                "".to_string(),
            ],
            vec!["quote \" comma , bracket ] unicode ü".to_string()],
        ];

        for list in cases {
            let encoded = encode_list(&list).unwrap();
            assert_eq!(decode_list(&encoded).unwrap(), list);
        }
    }

    #[test]
    fn test_empty_list_encoding() {
        assert_eq!(encode_list(&[]).unwrap(), "[]");
        assert!(decode_list("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_non_list() {
        let err = decode_list("{\"a\": 1}").unwrap_err();
        assert!(matches!(err, AppError::EncodingError(_)));
    }
}
