//! 配信統合テスト
//!
//! スケジューラ → 配信 → 宛先ソース → 送信手段 の一連のフローを、
//! 公開 API だけを使って検証する。メール送信は記録用の `MailSender` に差し替える。
//!
//! ## 実行方法
//!
//! ```bash
//! cargo test -p newsletter-service --test dispatch_integration_test
//! ```
//!
//! ## テストケース
//!
//! - 宛先 0 件: 送信 0 回で成功
//! - 宛先 3 件: 取得順に同じ本文で 3 回送信
//! - 1 件目で失敗: 配信エラーになり 2 件目には送信しない
//! - ファイルの宛先にメールとして配信する
//! - 宛先ファイルが読めない場合は送信前に失敗する

use std::{
   path::PathBuf,
   sync::{Arc, Mutex},
};

use async_trait::async_trait;
use newsletter_domain::{
   clock::SystemClock,
   dispatch::{DeliveryStatus, DispatchPolicy},
   newsletter::{Content, DeliveryError, EmailMessage, Recipient, RecipientSourceError},
};
use newsletter_infra::{
   MailSender,
   mock::{MockRecipientSource, MockTransport},
   recipient_source::FileRecipientSource,
   transport::{EmailTransport, NewsletterRenderer},
};
use newsletter_service::{
   error::DispatchErrorKind,
   usecase::{NewsletterDispatcher, NewsletterScheduler},
};
use pretty_assertions::assert_eq;

/// 送信されたメールを記録する `MailSender`
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

fn scheduler_with_mocks(
   recipients: Vec<Recipient>,
   transport: &MockTransport,
) -> NewsletterScheduler {
   let dispatcher = NewsletterDispatcher::new(
      Arc::new(MockRecipientSource::new(recipients)),
      Arc::new(transport.clone()),
      Arc::new(SystemClock),
   );
   NewsletterScheduler::new(Arc::new(dispatcher), "X")
}

/// テストごとに一意な一時ファイルへ宛先を書き出す
fn write_recipients_file(contents: &str) -> PathBuf {
   let path = std::env::temp_dir().join(format!("newsletter-it-{}.txt", uuid::Uuid::new_v4()));
   std::fs::write(&path, contents).unwrap();
   path
}

#[tokio::test]
async fn 宛先0件なら送信0回で成功する() {
   // Given
   let transport = MockTransport::new();
   let sut = scheduler_with_mocks(Vec::new(), &transport);

   // When
   let report = sut.run().await.unwrap();

   // Then
   assert_eq!(report.total(), 0);
   assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn 宛先3件に取得順で同じ本文を送信する() {
   // Given
   let transport = MockTransport::new();
   let sut = scheduler_with_mocks(
      vec![
         Recipient::new("r1@example.com"),
         Recipient::new("r2@example.com"),
         Recipient::new("r3@example.com"),
      ],
      &transport,
   );

   // When
   sut.run().await.unwrap();

   // Then
   assert_eq!(
      transport.sent(),
      vec![
         (Recipient::new("r1@example.com"), Content::new("X")),
         (Recipient::new("r2@example.com"), Content::new("X")),
         (Recipient::new("r3@example.com"), Content::new("X")),
      ]
   );
}

#[tokio::test]
async fn 一件目の送信失敗で配信エラーになり二件目には送信しない() {
   // Given
   let transport = MockTransport::new();
   transport.fail_for(Recipient::new("r1@example.com"));
   let sut = scheduler_with_mocks(
      vec![
         Recipient::new("r1@example.com"),
         Recipient::new("r2@example.com"),
      ],
      &transport,
   );

   // When
   let error = sut.run().await.unwrap_err();

   // Then
   assert!(matches!(error.kind(), DispatchErrorKind::Delivery { .. }));
   assert!(
      !transport
         .attempts()
         .contains(&Recipient::new("r2@example.com"))
   );
   assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn ファイルの宛先にメールとして配信する() {
   // Given
   let path = write_recipients_file("# 購読者\na@example.com\n\n b@example.com \n");
   let mail_sender = Arc::new(RecordingMailSender::default());
   let transport = EmailTransport::new(
      mail_sender.clone(),
      NewsletterRenderer::new().unwrap(),
      "10月号",
   );
   let dispatcher = NewsletterDispatcher::new(
      Arc::new(FileRecipientSource::new(&path)),
      Arc::new(transport),
      Arc::new(SystemClock),
   )
   .with_policy(DispatchPolicy::isolated(2).unwrap());
   let sut = NewsletterScheduler::new(Arc::new(dispatcher), "今月のお知らせ");

   // When
   let report = sut.run().await.unwrap();
   std::fs::remove_file(&path).unwrap();

   // Then
   let statuses: Vec<_> = report.outcomes.iter().map(|o| o.status).collect();
   assert_eq!(statuses, vec![DeliveryStatus::Sent, DeliveryStatus::Sent]);

   let sent = mail_sender.sent.lock().unwrap();
   let to: Vec<_> = sent.iter().map(|e| e.to.as_str()).collect();
   assert_eq!(to, vec!["a@example.com", "b@example.com"]);
   assert!(sent.iter().all(|e| e.subject == "10月号"));
   assert!(sent.iter().all(|e| e.text_body.contains("今月のお知らせ")));
}

#[tokio::test]
async fn 宛先ファイルが読めない場合は送信前に失敗する() {
   // Given
   let transport = MockTransport::new();
   let dispatcher = NewsletterDispatcher::new(
      Arc::new(FileRecipientSource::new("/nonexistent/newsletter/recipients.txt")),
      Arc::new(transport.clone()),
      Arc::new(SystemClock),
   );
   let sut = NewsletterScheduler::with_default_content(Arc::new(dispatcher));

   // When
   let error = sut.run().await.unwrap_err();

   // Then
   assert!(matches!(
      error.kind(),
      DispatchErrorKind::RecipientFetch(RecipientSourceError::Unavailable(_))
   ));
   assert!(transport.attempts().is_empty());
}
