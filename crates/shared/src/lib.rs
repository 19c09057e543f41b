//! # Newsletter 共有ユーティリティ
//!
//! ワークスペース全体で使う、ビジネスロジックを含まないユーティリティ。
//!
//! - [`observability`] - トレーシング初期化とログ形式
//! - [`event_log`] - ビジネスイベントの構造化ログ
//! - [`ApiResponse`] / [`ErrorResponse`] / [`HealthResponse`] - HTTP レスポンスの共通型

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::HealthResponse;
