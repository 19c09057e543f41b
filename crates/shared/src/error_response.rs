//! # エラーレスポンス（RFC 9457 Problem Details）
//!
//! - `ErrorResponse` は純粋なデータ構造（axum への変換は各サービスの責務）
//! - よく使うエラー種別は便利コンストラクタで提供する

use serde::{Deserialize, Serialize};

/// error_type URI のベースパス
const ERROR_TYPE_BASE: &str = "https://newsletter.example.com/errors";

/// エラーレスポンス（RFC 9457 Problem Details）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title:      String,
    pub status:     u16,
    pub detail:     String,
}

impl ErrorResponse {
    /// 汎用コンストラクタ
    ///
    /// `error_type_suffix` はベース URI に付加される（例: `"delivery-failed"`）。
    pub fn new(
        error_type_suffix: &str,
        title: impl Into<String>,
        status: u16,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            error_type: format!("{ERROR_TYPE_BASE}/{error_type_suffix}"),
            title: title.into(),
            status,
            detail: detail.into(),
        }
    }

    /// 500 Internal Server Error
    ///
    /// detail は固定値（内部情報を漏らさないため）。
    pub fn internal_error() -> Self {
        Self::new(
            "internal-error",
            "Internal Server Error",
            500,
            "内部エラーが発生しました",
        )
    }

    /// 502 Bad Gateway
    pub fn bad_gateway(error_type_suffix: &str, detail: impl Into<String>) -> Self {
        Self::new(error_type_suffix, "Bad Gateway", 502, detail)
    }

    /// 503 Service Unavailable
    pub fn service_unavailable(error_type_suffix: &str, detail: impl Into<String>) -> Self {
        Self::new(error_type_suffix, "Service Unavailable", 503, detail)
    }
}
