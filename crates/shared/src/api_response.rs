//! # API レスポンスエンベロープ
//!
//! 成功レスポンスの統一形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 統一レスポンス型
///
/// ```
/// use newsletter_shared::ApiResponse;
///
/// let response = ApiResponse::new("hello");
/// assert_eq!(response.data, "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeでdataキーに包まれる() {
        let json = serde_json::to_value(ApiResponse::new(vec!["a", "b"])).unwrap();

        assert_eq!(json, serde_json::json!({ "data": ["a", "b"] }));
    }
}
