//! # ユースケース層
//!
//! 配信のビジネスロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: 宛先ソースと送信手段を `Arc<dyn Trait>` で外部から注入
//! - **薄いハンドラ**: ハンドラは薄く保ち、ロジックはユースケースに集約
//!
//! ## モジュール構成
//!
//! - `dispatcher`: 1 回の配信ジョブ（宛先取得 → 宛先ごとの送信）
//! - `scheduler`: 本文を用意して配信ジョブを 1 回起動する

pub mod dispatcher;
pub mod scheduler;

pub use dispatcher::NewsletterDispatcher;
pub use scheduler::NewsletterScheduler;
