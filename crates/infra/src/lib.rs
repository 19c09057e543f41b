//! # Newsletter インフラ層
//!
//! 配信処理が依存する 2 つの外部協調者（宛先ソースと送信手段）の
//! トレイトと具体実装を提供する。
//!
//! ## 責務
//!
//! - **宛先ソース**: [`recipient_source::RecipientSource`]（空 / 固定リスト / ファイル）
//! - **送信手段**: [`transport::Transport`]（メール送信 [`transport::EmailTransport`]）
//! - **メール送信**: [`mail::MailSender`]（SMTP / SES / Noop）
//!
//! ## 依存関係
//!
//! ```text
//! newsletter-service → infra → domain
//! ```
//!
//! 配信ロジック（`NewsletterDispatcher`）はトレイトにのみ依存し、
//! どの実装を使うかは起動時の設定で決める。

pub mod mail;
pub mod recipient_source;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use mail::MailSender;
pub use recipient_source::RecipientSource;
pub use transport::Transport;
