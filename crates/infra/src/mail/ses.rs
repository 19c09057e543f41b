//! SES メール送信実装
//!
//! AWS SES v2 API を使用してメールを送信する。本番環境で使用する。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    types::{Body, Content, Destination, EmailContent, Message},
};
use newsletter_domain::newsletter::{DeliveryError, EmailMessage};

use super::MailSender;

/// SES クライアントを作成する
///
/// リージョンと認証情報は AWS SDK の既定の探索順（環境変数、プロファイル等）に従う。
/// `endpoint` を指定するとローカルのエミュレータに接続する。
pub async fn create_client(endpoint: Option<&str>) -> Client {
    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest());

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder.endpoint_url(endpoint_url);
    }

    let config = config_builder.load().await;
    Client::new(&config)
}

/// SES メール送信
pub struct SesMailSender {
    client:       Client,
    from_address: String,
}

impl SesMailSender {
    /// `from_address` は SES で検証済みであること
    pub fn new(client: Client, from_address: String) -> Self {
        Self {
            client,
            from_address,
        }
    }
}

fn build_content(data: &str, part: &str) -> Result<Content, DeliveryError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| DeliveryError::SendFailed(format!("{part}構築失敗: {e}")))
}

#[async_trait]
impl MailSender for SesMailSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), DeliveryError> {
        let destination = Destination::builder().to_addresses(&email.to).build();

        let content = EmailContent::builder()
            .simple(
                Message::builder()
                    .subject(build_content(&email.subject, "件名")?)
                    .body(
                        Body::builder()
                            .html(build_content(&email.html_body, "HTML 本文")?)
                            .text(build_content(&email.text_body, "テキスト本文")?)
                            .build(),
                    )
                    .build(),
            )
            .build();

        self.client
            .send_email()
            .from_email_address(&self.from_address)
            .destination(destination)
            .content(content)
            .send()
            .await
            .map_err(|e| DeliveryError::SendFailed(format!("SES 送信失敗: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SesMailSender>();
    }

    #[test]
    fn 本文パートをutf8で構築できる() {
        let content = build_content("お知らせ", "件名").unwrap();

        assert_eq!(content.data(), "お知らせ");
        assert_eq!(content.charset(), Some("UTF-8"));
    }
}
