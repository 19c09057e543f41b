//! # ニュースレターのメール整形
//!
//! tera テンプレートエンジンで本文を HTML / plaintext の両形式に整形する。
//! テンプレートは `include_str!` でバイナリに埋め込む。
//! HTML テンプレートは自動エスケープされる（本文は不透明なテキストとして扱う）。

use newsletter_domain::newsletter::{Content, DeliveryError, EmailMessage, Recipient};
use tera::{Context, Tera};

const HTML_TEMPLATE: &str = "newsletter.html";
const TEXT_TEMPLATE: &str = "newsletter.txt";

/// テンプレートレンダラー
pub struct NewsletterRenderer {
    engine: Tera,
}

impl NewsletterRenderer {
    /// 埋め込みテンプレートを登録したレンダラーを作成する
    pub fn new() -> Result<Self, DeliveryError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    HTML_TEMPLATE,
                    include_str!("../../templates/newsletter.html"),
                ),
                (TEXT_TEMPLATE, include_str!("../../templates/newsletter.txt")),
            ])
            .map_err(|e| DeliveryError::RenderFailed(e.to_string()))?;

        Ok(Self { engine })
    }

    /// 本文から 1 宛先分のメールメッセージを生成する
    pub fn render(
        &self,
        recipient: &Recipient,
        subject: &str,
        content: &Content,
    ) -> Result<EmailMessage, DeliveryError> {
        let mut context = Context::new();
        context.insert("subject", subject);
        context.insert("body", content.as_str());
        context.insert("recipient", recipient.as_str());

        let html_body = self
            .engine
            .render(HTML_TEMPLATE, &context)
            .map_err(|e| DeliveryError::RenderFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(TEXT_TEMPLATE, &context)
            .map_err(|e| DeliveryError::RenderFailed(e.to_string()))?;

        Ok(EmailMessage {
            to: recipient.as_str().to_string(),
            subject: subject.to_string(),
            html_body,
            text_body,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(body: &str) -> EmailMessage {
        NewsletterRenderer::new()
            .unwrap()
            .render(
                &Recipient::new("reader@example.com"),
                "10月号",
                &Content::new(body),
            )
            .unwrap()
    }

    #[test]
    fn 宛先と件名がメッセージに設定される() {
        let email = render("本文");

        assert_eq!(email.to, "reader@example.com");
        assert_eq!(email.subject, "10月号");
    }

    #[test]
    fn テキスト本文は本文をそのまま含む() {
        let email = render("a & b\n次の行");

        assert!(email.text_body.starts_with("10月号\n"));
        assert!(email.text_body.contains("a & b\n次の行"));
        assert!(email.text_body.contains("reader@example.com 宛て"));
    }

    #[test]
    fn html本文はエスケープされ改行がbrになる() {
        let email = render("a & <b>\n次の行");

        assert!(email.html_body.contains("a &amp; &lt;b&gt;<br>次の行"));
        assert!(!email.html_body.contains("<b>"));
    }
}
