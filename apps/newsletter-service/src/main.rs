//! # Newsletter Service サーバー
//!
//! 1 つの本文を現在の全宛先に配信する内部サービス。
//!
//! ## 役割
//!
//! - **トリガー**: `POST /internal/newsletter/dispatch` でスケジューラを 1 回起動する
//! - **配信**: 宛先ソースから宛先リストを取得し、宛先ごとにメールを送信する
//!
//! いつ配信するか（cron 等）は外部の呼び出し元が決める。
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌──────────────┐
//! │   Trigger    │────→│ Newsletter Service │────→│ SMTP / SES   │
//! └──────────────┘     └────────────────────┘     └──────────────┘
//!                                │
//!                                ↓
//!                      ┌────────────────────┐
//!                      │  Recipient Source  │
//!                      └────────────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NEWSLETTER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NEWSLETTER_PORT` | No | ポート番号（デフォルト: `3100`） |
//! | `NEWSLETTER_CONTENT` | No | 配信する本文（デフォルト: `Email Content Here`） |
//! | `NEWSLETTER_SUBJECT` | No | メールの件名（デフォルト: `Newsletter`） |
//! | `RECIPIENT_SOURCE` | No | `empty` / `static` / `file`（デフォルト: `empty`） |
//! | `NEWSLETTER_RECIPIENTS` | No | `static` の宛先（カンマ区切り） |
//! | `NEWSLETTER_RECIPIENTS_FILE` | `file` のとき | 宛先ファイルのパス |
//! | `DISPATCH_POLICY` | No | `fail_fast` / `isolated`（デフォルト: `fail_fast`） |
//! | `DISPATCH_CONCURRENCY` | No | `isolated` の並行度（デフォルト: `8`） |
//! | `DISPATCH_SEND_TIMEOUT_SECS` | No | 1 送信あたりのタイムアウト秒数 |
//! | `MAIL_BACKEND` | No | `smtp` / `ses` / `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP サーバー（デフォルト: `localhost:1025`） |
//! | `MAIL_FROM_ADDRESS` | No | 送信元アドレス |
//! | `SES_ENDPOINT_URL` | No | SES エンドポイント（ローカルエミュレータ用） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（Mailpit に送信）
//! MAIL_BACKEND=smtp RECIPIENT_SOURCE=static NEWSLETTER_RECIPIENTS=a@example.com \
//!   cargo run -p newsletter-service
//!
//! # 配信をトリガー
//! curl -X POST http://localhost:3100/internal/newsletter/dispatch
//! ```

use std::{net::SocketAddr, sync::Arc};

use newsletter_domain::clock::SystemClock;
use newsletter_infra::{
   MailSender,
   RecipientSource,
   mail::{NoopMailSender, SesMailSender, SmtpMailSender, create_ses_client},
   recipient_source::{EmptyRecipientSource, FileRecipientSource, StaticRecipientSource},
   transport::{EmailTransport, NewsletterRenderer},
};
use newsletter_service::{
   app::build_router,
   config::{MailBackend, MailConfig, NewsletterConfig, RecipientSourceConfig},
   handler::DispatchState,
   shutdown::shutdown_token,
   usecase::{NewsletterDispatcher, NewsletterScheduler},
};
use newsletter_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Newsletter Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルを読み込む（存在する場合）
   dotenvy::dotenv().ok();

   // トレーシング初期化
   init_tracing(TracingConfig::from_env("newsletter-service"));
   let _tracing_guard = tracing::info_span!("app", service = "newsletter-service").entered();

   // 設定読み込み
   let config = NewsletterConfig::from_env()?;

   tracing::info!(
      "Newsletter Service サーバーを起動します: {}:{}",
      config.host,
      config.port
   );

   // 依存コンポーネントを初期化
   let source = build_recipient_source(&config.recipients);
   let mail_sender = build_mail_sender(&config.mail).await?;
   let transport = EmailTransport::new(mail_sender, NewsletterRenderer::new()?, &config.subject);

   let dispatcher = NewsletterDispatcher::new(source, Arc::new(transport), Arc::new(SystemClock))
      .with_policy(config.dispatch.policy)
      .with_send_timeout(config.dispatch.send_timeout);
   tracing::info!(
      policy = config.dispatch.policy.name(),
      max_in_flight = config.dispatch.policy.max_in_flight(),
      "配信ポリシーを設定しました"
   );

   let shutdown = shutdown_token();
   let dispatch_state = Arc::new(DispatchState {
      scheduler: NewsletterScheduler::new(Arc::new(dispatcher), config.content.clone()),
      shutdown:  shutdown.clone(),
   });

   // ルーター構築
   let app = build_router(dispatch_state);

   // サーバー起動
   let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

   let listener = TcpListener::bind(addr).await?;
   tracing::info!("Newsletter Service サーバーが起動しました: {}", addr);

   axum::serve(listener, app)
      .with_graceful_shutdown(shutdown.cancelled_owned())
      .await?;

   tracing::info!("Newsletter Service サーバーを停止しました");

   Ok(())
}

/// 設定に応じた宛先ソースを作成する
fn build_recipient_source(config: &RecipientSourceConfig) -> Arc<dyn RecipientSource> {
   match config {
      RecipientSourceConfig::Empty => {
         tracing::info!("宛先ソース: empty（常に 0 件）");
         Arc::new(EmptyRecipientSource)
      }
      RecipientSourceConfig::Static(recipients) => {
         tracing::info!(count = recipients.len(), "宛先ソース: static");
         Arc::new(StaticRecipientSource::new(recipients.clone()))
      }
      RecipientSourceConfig::File(path) => {
         tracing::info!(path = %path.display(), "宛先ソース: file");
         Arc::new(FileRecipientSource::new(path.clone()))
      }
   }
}

/// 設定に応じたメール送信実装を作成する
async fn build_mail_sender(config: &MailConfig) -> anyhow::Result<Arc<dyn MailSender>> {
   let sender: Arc<dyn MailSender> = match config.backend {
      MailBackend::Smtp => {
         tracing::info!(
            "メール送信: SMTP（{}:{}）",
            config.smtp_host,
            config.smtp_port
         );
         Arc::new(SmtpMailSender::new(
            &config.smtp_host,
            config.smtp_port,
            &config.from_address,
         )?)
      }
      MailBackend::Ses => {
         tracing::info!("メール送信: SES");
         let client = create_ses_client(config.ses_endpoint_url.as_deref()).await;
         Arc::new(SesMailSender::new(client, config.from_address.clone()))
      }
      MailBackend::Noop => {
         tracing::info!("メール送信: Noop（送信しない）");
         Arc::new(NoopMailSender)
      }
   };

   Ok(sender)
}
