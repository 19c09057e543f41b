//! # Newsletter Service エラー定義
//!
//! 配信ジョブの失敗と、HTTP レスポンスへの変換を定義する。
//!
//! ## 構造
//!
//! - [`DispatchError`]: エラー種別（[`DispatchErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`DispatchErrorKind`]: 配信を打ち切った理由
//!
//! `From` 実装と constructor でエラーを生成すると、その時点のスパン
//! （`dispatch` スパンの `job_id` / `policy` を含む）が記録される。

use std::fmt;

use axum::{
   Json,
   http::StatusCode,
   response::{IntoResponse, Response},
};
use derive_more::Display;
use newsletter_domain::newsletter::{DeliveryError, Recipient, RecipientSourceError};
use newsletter_shared::{ErrorResponse, event_log::error as log_error};
use thiserror::Error;
use tracing_error::SpanTrace;

/// 配信ジョブの失敗
///
/// `Isolated` ポリシーでの宛先ごとの送信失敗はエラーにならず、レポートに記録される。
#[derive(Display)]
#[display("{kind}")]
pub struct DispatchError {
   kind:       DispatchErrorKind,
   span_trace: SpanTrace,
}

/// 配信ジョブの失敗の種別
#[derive(Debug, Error)]
pub enum DispatchErrorKind {
   /// 宛先リストを取得できなかった（送信は 1 件も行っていない）
   #[error("宛先リストの取得に失敗しました: {0}")]
   RecipientFetch(#[source] RecipientSourceError),

   /// 送信に失敗し、残りの宛先への配信を中断した
   #[error("{recipient} への送信に失敗したため配信を中断しました（送信済み {delivered} 件）")]
   Delivery {
      recipient: Recipient,
      /// 失敗より前に送信できた件数
      delivered: usize,
      #[source]
      source:    DeliveryError,
   },

   /// 配信ジョブのタスクが異常終了した
   #[error("配信ジョブが異常終了しました: {0}")]
   Internal(String),
}

impl DispatchError {
   pub fn kind(&self) -> &DispatchErrorKind {
      &self.kind
   }

   /// SpanTrace を取得する
   pub fn span_trace(&self) -> &SpanTrace {
      &self.span_trace
   }

   /// 送信失敗による中断エラーを生成する
   pub fn delivery(recipient: Recipient, delivered: usize, source: DeliveryError) -> Self {
      Self {
         kind:       DispatchErrorKind::Delivery {
            recipient,
            delivered,
            source,
         },
         span_trace: SpanTrace::capture(),
      }
   }

   /// 予期しないエラーを生成する
   pub fn internal(msg: impl Into<String>) -> Self {
      Self {
         kind:       DispatchErrorKind::Internal(msg.into()),
         span_trace: SpanTrace::capture(),
      }
   }
}

impl fmt::Debug for DispatchError {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("DispatchError")
         .field("kind", &self.kind)
         .field("span_trace", &self.span_trace)
         .finish()
   }
}

impl std::error::Error for DispatchError {
   fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
      self.kind.source()
   }
}

impl From<RecipientSourceError> for DispatchError {
   fn from(source: RecipientSourceError) -> Self {
      Self {
         kind:       DispatchErrorKind::RecipientFetch(source),
         span_trace: SpanTrace::capture(),
      }
   }
}

impl IntoResponse for DispatchError {
   fn into_response(self) -> Response {
      let span_trace = &self.span_trace;
      let (status, body) = match &self.kind {
         DispatchErrorKind::RecipientFetch(e) => {
            tracing::error!(
               error.category = log_error::category::EXTERNAL_SERVICE,
               error.kind = log_error::kind::RECIPIENT_FETCH,
               span_trace = %span_trace,
               "宛先リストの取得に失敗: {}",
               e
            );
            (
               StatusCode::SERVICE_UNAVAILABLE,
               ErrorResponse::service_unavailable("recipient-source-unavailable", e.to_string()),
            )
         }
         DispatchErrorKind::Delivery { source, .. } => {
            tracing::error!(
               error.category = log_error::category::EXTERNAL_SERVICE,
               error.kind = log_error::kind::DELIVERY,
               span_trace = %span_trace,
               "配信を中断: {}: {}",
               self,
               source
            );
            (
               StatusCode::BAD_GATEWAY,
               ErrorResponse::bad_gateway("delivery-failed", format!("{self}: {source}")),
            )
         }
         DispatchErrorKind::Internal(msg) => {
            tracing::error!(
               error.category = log_error::category::INFRASTRUCTURE,
               error.kind = log_error::kind::INTERNAL,
               span_trace = %span_trace,
               "配信ジョブが異常終了: {}",
               msg
            );
            (
               StatusCode::INTERNAL_SERVER_ERROR,
               ErrorResponse::internal_error(),
            )
         }
      };

      (status, Json(body)).into_response()
   }
}
