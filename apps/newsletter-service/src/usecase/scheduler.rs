//! # 配信スケジューラ
//!
//! 配信のトリガー。本文を用意して配信ジョブを 1 回だけ起動する。
//!
//! いつ起動するかは呼び出し元（HTTP トリガーや外部のスケジューラ）が決める。
//! 呼び出しごとに本文を作り直すため、同時に複数回起動しても状態を共有しない。

use std::sync::Arc;

use newsletter_domain::{dispatch::DispatchReport, newsletter::Content};
use tokio_util::sync::CancellationToken;

use super::NewsletterDispatcher;
use crate::error::DispatchError;

/// 本文が設定されていない場合の既定の本文
pub const DEFAULT_CONTENT: &str = "Email Content Here";

/// ニュースレター配信スケジューラ
pub struct NewsletterScheduler {
   dispatcher: Arc<NewsletterDispatcher>,
   body:       String,
}

impl NewsletterScheduler {
   pub fn new(dispatcher: Arc<NewsletterDispatcher>, body: impl Into<String>) -> Self {
      Self {
         dispatcher,
         body: body.into(),
      }
   }

   /// 既定の本文で配信するスケジューラ
   pub fn with_default_content(dispatcher: Arc<NewsletterDispatcher>) -> Self {
      Self::new(dispatcher, DEFAULT_CONTENT)
   }

   /// 配信ジョブを 1 回起動する
   ///
   /// 配信処理のエラーはそのまま返す。
   pub async fn run(&self) -> Result<DispatchReport, DispatchError> {
      self.run_with_cancellation(&CancellationToken::new()).await
   }

   /// キャンセルトークンを配信処理に渡して起動する
   pub async fn run_with_cancellation(
      &self,
      cancel: &CancellationToken,
   ) -> Result<DispatchReport, DispatchError> {
      let content = Content::new(self.body.as_str());
      tracing::debug!("配信ジョブを起動");

      self
         .dispatcher
         .dispatch_with_cancellation(content, cancel)
         .await
   }
}
