//! # 配信トリガーハンドラ
//!
//! スケジューラを 1 回起動し、配信レポートを返す。
//!
//! ## エンドポイント
//!
//! ```text
//! POST /internal/newsletter/dispatch
//! ```
//!
//! 配信ジョブは別タスクで完了まで実行する。クライアントが切断してリクエストが
//! 破棄されても、ジョブは途中で止まらない。サーバーのシャットダウンが始まると
//! 新しい送信を止め、未送信の宛先は `skipped` としてレポートに残る。

use std::sync::Arc;

use axum::{
   Json,
   extract::State,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use newsletter_domain::dispatch::{DeliveryOutcome, DispatchReport};
use newsletter_shared::ApiResponse;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::{error::DispatchError, usecase::NewsletterScheduler};

/// 配信トリガーハンドラーの State
pub struct DispatchState {
   pub scheduler: NewsletterScheduler,
   /// サーバーのシャットダウンでキャンセルされる
   pub shutdown:  CancellationToken,
}

/// 宛先ごとの配信結果 DTO
#[derive(Debug, Serialize)]
pub struct DeliveryOutcomeDto {
   pub recipient: String,
   pub status:    &'static str,
   #[serde(skip_serializing_if = "Option::is_none")]
   pub error:     Option<String>,
}

impl From<DeliveryOutcome> for DeliveryOutcomeDto {
   fn from(outcome: DeliveryOutcome) -> Self {
      Self {
         recipient: outcome.recipient.into_string(),
         status:    outcome.status.into(),
         error:     outcome.error,
      }
   }
}

/// 配信レポート DTO
#[derive(Debug, Serialize)]
pub struct DispatchReportDto {
   pub job_id:      String,
   pub policy:      &'static str,
   pub started_at:  DateTime<Utc>,
   pub finished_at: DateTime<Utc>,
   pub cancelled:   bool,
   pub total:       usize,
   pub sent:        usize,
   pub failed:      usize,
   pub skipped:     usize,
   pub outcomes:    Vec<DeliveryOutcomeDto>,
}

impl From<DispatchReport> for DispatchReportDto {
   fn from(report: DispatchReport) -> Self {
      Self {
         job_id:      report.job_id.to_string(),
         policy:      report.policy.name(),
         started_at:  report.started_at,
         finished_at: report.finished_at,
         cancelled:   report.cancelled,
         total:       report.total(),
         sent:        report.sent(),
         failed:      report.failed(),
         skipped:     report.skipped(),
         outcomes:    report.outcomes.into_iter().map(Into::into).collect(),
      }
   }
}

/// 配信を 1 回実行する
///
/// 宛先ごとの送信失敗（`Isolated` ポリシー）はレポートに含めて 200 を返す。
/// 配信自体が中断された場合は [`DispatchError`] の変換規則に従う。
#[tracing::instrument(skip_all)]
pub async fn trigger_dispatch(
   State(state): State<Arc<DispatchState>>,
) -> Result<Response, DispatchError> {
   let job = tokio::spawn(
      async move {
         state
            .scheduler
            .run_with_cancellation(&state.shutdown)
            .await
      }
      .in_current_span(),
   );
   let report = job
      .await
      .map_err(|e| DispatchError::internal(e.to_string()))??;

   let response = ApiResponse::new(DispatchReportDto::from(report));

   Ok((StatusCode::OK, Json(response)).into_response())
}
