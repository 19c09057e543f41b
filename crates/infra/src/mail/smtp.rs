//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpTransport` でメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
};
use newsletter_domain::newsletter::{DeliveryError, EmailMessage};

use super::MailSender;

/// SMTP メール送信
///
/// 送信元アドレスは生成時に検証し、送信ごとのパースを避ける。
pub struct SmtpMailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from:      Mailbox,
}

impl SmtpMailSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    /// - `from_address`: 送信元メールアドレス
    ///
    /// # エラー
    ///
    /// 送信元アドレスが不正な場合は `DeliveryError::InvalidAddress` を返す。
    pub fn new(host: &str, port: u16, from_address: &str) -> Result<Self, DeliveryError> {
        let from = from_address.parse::<Mailbox>().map_err(|e| {
            DeliveryError::InvalidAddress(format!("送信元 {from_address}: {e}"))
        })?;

        // TLS なし（Mailpit 等のローカル SMTP 向け）
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl MailSender for SmtpMailSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::InvalidAddress(format!("宛先 {}: {e}", email.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&email.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| DeliveryError::SendFailed(format!("メッセージ構築失敗: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
