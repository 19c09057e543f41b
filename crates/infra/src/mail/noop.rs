//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 送信先が未設定の環境や動作確認で使用する。

use async_trait::async_trait;
use newsletter_domain::newsletter::{DeliveryError, EmailMessage};

use super::MailSender;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMailSender;

#[async_trait]
impl MailSender for NoopMailSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}
