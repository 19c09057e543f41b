//! # メール送信
//!
//! [`crate::transport::EmailTransport`] が組み立てた [`EmailMessage`] を実際に送る。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailSender` で送信方法を隠す
//! - **3 つの実装**: SMTP（Mailpit 開発用）、SES（本番用）、Noop（既定）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択

mod noop;
mod ses;
mod smtp;

use async_trait::async_trait;
use newsletter_domain::newsletter::{DeliveryError, EmailMessage};
pub use noop::NoopMailSender;
pub use ses::{SesMailSender, create_client as create_ses_client};
pub use smtp::SmtpMailSender;

/// メール送信トレイト
#[async_trait]
pub trait MailSender: Send + Sync {
    /// メールを 1 通送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError>;
}
