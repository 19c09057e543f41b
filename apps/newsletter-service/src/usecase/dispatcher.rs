//! # 配信ユースケース
//!
//! 1 回の配信ジョブを実行する: 宛先ソースから宛先リストを 1 回だけ取得し、
//! 同じ本文を宛先ごとに送信手段へ渡す。
//!
//! ## 設計方針
//!
//! - **スナップショット**: 宛先リストはジョブ開始時に 1 回だけ取得し、途中で取り直さない
//! - **ポリシー切替**: 失敗時の振る舞いと並行度は [`DispatchPolicy`] で決める
//!   - `FailFast`: 取得順に 1 件ずつ送信し、最初の失敗で中断してエラーを返す
//!   - `Isolated`: 最大 `concurrency` 件を並行に送信し、失敗を記録して続行する
//! - **キャンセル**: トークンがキャンセルされたら新しい送信を始めない。
//!   送信中のものは完了を待ち、未送信の宛先は `skipped` としてレポートに残す
//! - **状態を持たない**: ジョブの状態はすべて `dispatch` 呼び出しの中に閉じる。
//!   同じインスタンスを複数のジョブから同時に使ってよい

use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream};
use newsletter_domain::{
   clock::Clock,
   dispatch::{DeliveryOutcome, DeliveryStatus, DispatchJobId, DispatchPolicy, DispatchReport},
   newsletter::{Content, DeliveryError, Recipient},
};
use newsletter_infra::{RecipientSource, Transport};
use newsletter_shared::{event_log::event, log_business_event};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error::DispatchError;

/// ニュースレター配信
pub struct NewsletterDispatcher {
   source:       Arc<dyn RecipientSource>,
   transport:    Arc<dyn Transport>,
   clock:        Arc<dyn Clock>,
   policy:       DispatchPolicy,
   send_timeout: Option<Duration>,
}

impl NewsletterDispatcher {
   /// `FailFast` ポリシー・タイムアウトなしで作成する
   pub fn new(
      source: Arc<dyn RecipientSource>,
      transport: Arc<dyn Transport>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         source,
         transport,
         clock,
         policy: DispatchPolicy::default(),
         send_timeout: None,
      }
   }

   pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
      self.policy = policy;
      self
   }

   /// 1 送信あたりのタイムアウトを設定する（`None` で無制限）
   pub fn with_send_timeout(mut self, send_timeout: Option<Duration>) -> Self {
      self.send_timeout = send_timeout;
      self
   }

   pub fn policy(&self) -> DispatchPolicy {
      self.policy
   }

   /// 本文を現在の全宛先に配信する
   pub async fn dispatch(&self, content: Content) -> Result<DispatchReport, DispatchError> {
      self
         .dispatch_with_cancellation(content, &CancellationToken::new())
         .await
   }

   /// キャンセル可能な配信
   ///
   /// # エラー
   ///
   /// - 宛先リストの取得に失敗した場合は `DispatchErrorKind::RecipientFetch`（送信は行わない）
   /// - `FailFast` で送信に失敗した場合は `DispatchErrorKind::Delivery`（残りの宛先には送信しない）
   pub async fn dispatch_with_cancellation(
      &self,
      content: Content,
      cancel: &CancellationToken,
   ) -> Result<DispatchReport, DispatchError> {
      let job_id = DispatchJobId::new();
      let span = tracing::info_span!("dispatch", job_id = %job_id, policy = self.policy.name());

      self.run(job_id, &content, cancel).instrument(span).await
   }

   async fn run(
      &self,
      job_id: DispatchJobId,
      content: &Content,
      cancel: &CancellationToken,
   ) -> Result<DispatchReport, DispatchError> {
      let started_at = self.clock.now();

      let recipients = match self.source.fetch().await {
         Ok(recipients) => recipients,
         Err(e) => {
            log_business_event!(
               event.category = event::category::NEWSLETTER,
               event.action = event::action::DISPATCH_FAILED,
               event.job_id = %job_id,
               event.result = event::result::FAILURE,
               error = %e,
               "宛先リストの取得に失敗したため配信を中断"
            );
            return Err(e.into());
         }
      };

      log_business_event!(
         event.category = event::category::NEWSLETTER,
         event.action = event::action::DISPATCH_STARTED,
         event.job_id = %job_id,
         recipients = recipients.len(),
         "配信を開始"
      );

      let outcomes = match self.policy {
         DispatchPolicy::FailFast => {
            self
               .fan_out_sequential(job_id, recipients, content, cancel)
               .await?
         }
         DispatchPolicy::Isolated { concurrency } => {
            self
               .fan_out_isolated(job_id, recipients, content, cancel, concurrency.get())
               .await
         }
      };

      let report = DispatchReport {
         job_id,
         policy: self.policy,
         started_at,
         finished_at: self.clock.now(),
         cancelled: outcomes
            .iter()
            .any(|o| o.status == DeliveryStatus::Skipped),
         outcomes,
      };

      let result = if report.is_success() {
         event::result::SUCCESS
      } else {
         event::result::FAILURE
      };
      log_business_event!(
         event.category = event::category::NEWSLETTER,
         event.action = event::action::DISPATCH_COMPLETED,
         event.job_id = %job_id,
         event.result = result,
         total = report.total(),
         sent = report.sent(),
         failed = report.failed(),
         skipped = report.skipped(),
         cancelled = report.cancelled,
         "配信が完了"
      );

      Ok(report)
   }

   /// 取得順に 1 件ずつ送信し、最初の失敗で中断する
   async fn fan_out_sequential(
      &self,
      job_id: DispatchJobId,
      recipients: Vec<Recipient>,
      content: &Content,
      cancel: &CancellationToken,
   ) -> Result<Vec<DeliveryOutcome>, DispatchError> {
      let mut outcomes = Vec::with_capacity(recipients.len());

      for recipient in recipients {
         if cancel.is_cancelled() {
            outcomes.push(skipped(job_id, recipient));
            continue;
         }

         match self.send_one(&recipient, content).await {
            Ok(()) => outcomes.push(sent(job_id, recipient)),
            Err(source) => {
               // キャンセル後は送信しないので、ここまでの結果はすべて送信成功
               let delivered = outcomes.len();
               log_delivery_failed(job_id, &recipient, &source);
               log_business_event!(
                  event.category = event::category::NEWSLETTER,
                  event.action = event::action::DISPATCH_FAILED,
                  event.job_id = %job_id,
                  event.result = event::result::FAILURE,
                  event.recipient = %recipient,
                  delivered,
                  "送信に失敗したため配信を中断"
               );
               return Err(DispatchError::delivery(recipient, delivered, source));
            }
         }
      }

      Ok(outcomes)
   }

   /// 最大 `concurrency` 件を並行に送信する
   ///
   /// 1 件が終わるたびに次の宛先を送信し始める。結果は完了順に集まるので、
   /// 取得順の添字で並べ直してから返す。
   async fn fan_out_isolated(
      &self,
      job_id: DispatchJobId,
      recipients: Vec<Recipient>,
      content: &Content,
      cancel: &CancellationToken,
      concurrency: usize,
   ) -> Vec<DeliveryOutcome> {
      let mut outcomes: Vec<(usize, DeliveryOutcome)> =
         stream::iter(recipients.into_iter().enumerate())
            .map(|(index, recipient)| async move {
               if cancel.is_cancelled() {
                  return (index, skipped(job_id, recipient));
               }

               let outcome = match self.send_one(&recipient, content).await {
                  Ok(()) => sent(job_id, recipient),
                  Err(e) => {
                     log_delivery_failed(job_id, &recipient, &e);
                     DeliveryOutcome::failed(recipient, &e)
                  }
               };
               (index, outcome)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

      outcomes.sort_unstable_by_key(|(index, _)| *index);
      outcomes.into_iter().map(|(_, outcome)| outcome).collect()
   }

   async fn send_one(&self, recipient: &Recipient, content: &Content) -> Result<(), DeliveryError> {
      let send = self.transport.send(recipient, content);

      match self.send_timeout {
         Some(limit) => tokio::time::timeout(limit, send)
            .await
            .map_err(|_| DeliveryError::TimedOut {
               timeout_ms: limit.as_millis(),
            })?,
         None => send.await,
      }
   }
}

fn sent(job_id: DispatchJobId, recipient: Recipient) -> DeliveryOutcome {
   log_business_event!(
      event.category = event::category::NEWSLETTER,
      event.action = event::action::DELIVERY_SENT,
      event.job_id = %job_id,
      event.result = event::result::SUCCESS,
      event.recipient = %recipient,
      "送信成功"
   );
   DeliveryOutcome::sent(recipient)
}

fn skipped(job_id: DispatchJobId, recipient: Recipient) -> DeliveryOutcome {
   log_business_event!(
      event.category = event::category::NEWSLETTER,
      event.action = event::action::DELIVERY_SKIPPED,
      event.job_id = %job_id,
      event.recipient = %recipient,
      "キャンセル済みのため送信しない"
   );
   DeliveryOutcome::skipped(recipient)
}

fn log_delivery_failed(job_id: DispatchJobId, recipient: &Recipient, error: &DeliveryError) {
   log_business_event!(
      event.category = event::category::NEWSLETTER,
      event.action = event::action::DELIVERY_FAILED,
      event.job_id = %job_id,
      event.result = event::result::FAILURE,
      event.recipient = %recipient,
      error = %error,
      "送信失敗"
   );
}
