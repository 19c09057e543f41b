//! # 送信手段
//!
//! 1 つの本文を 1 つの宛先に届ける。配信処理は宛先ごとに 1 回 `send()` を呼ぶ。
//!
//! 送信の仕組み（プロトコル、冪等性、配送保証）はこのトレイトの実装に閉じる。
//! 現在の実装はメール送信の [`EmailTransport`] のみ。

mod renderer;

use std::sync::Arc;

use async_trait::async_trait;
use newsletter_domain::newsletter::{Content, DeliveryError, Recipient};
pub use renderer::NewsletterRenderer;

use crate::mail::MailSender;

/// 送信手段トレイト
#[async_trait]
pub trait Transport: Send + Sync {
    /// 本文を 1 宛先に送信する
    ///
    /// `Ok(())` は送信手段が失敗を報告しなかったことだけを意味する。
    async fn send(&self, recipient: &Recipient, content: &Content) -> Result<(), DeliveryError>;
}

/// メールによる送信手段
///
/// 本文をテンプレートでメールに整形し、[`MailSender`] に渡す。
pub struct EmailTransport {
    sender:   Arc<dyn MailSender>,
    renderer: NewsletterRenderer,
    subject:  String,
}

impl EmailTransport {
    pub fn new(
        sender: Arc<dyn MailSender>,
        renderer: NewsletterRenderer,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            sender,
            renderer,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl Transport for EmailTransport {
    async fn send(&self, recipient: &Recipient, content: &Content) -> Result<(), DeliveryError> {
        let email = self.renderer.render(recipient, &self.subject, content)?;
        self.sender.send_email(&email).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use newsletter_domain::newsletter::EmailMessage;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct RecordingMailSender {
        sent: Mutex<Vec<EmailMessage>>,
    }

    #[async_trait]
    impl MailSender for RecordingMailSender {
        async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn 本文をメールに整形して宛先に送る() {
        let sender = Arc::new(RecordingMailSender::default());
        let transport = EmailTransport::new(
            sender.clone(),
            NewsletterRenderer::new().unwrap(),
            "10月号",
        );

        transport
            .send(
                &Recipient::new("reader@example.com"),
                &Content::new("今月のお知らせ"),
            )
            .await
            .unwrap();

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "reader@example.com");
        assert_eq!(sent[0].subject, "10月号");
        assert!(sent[0].text_body.contains("今月のお知らせ"));
        assert!(sent[0].html_body.contains("今月のお知らせ"));
    }
}
