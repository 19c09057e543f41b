//! # シャットダウンシグナル
//!
//! SIGINT（Ctrl+C）/ SIGTERM / SIGQUIT を受けたら [`CancellationToken`] をキャンセルする。
//!
//! 同じトークンを HTTP サーバーの graceful shutdown と配信ジョブの両方に渡すため、
//! シャットダウンが始まると実行中の配信ジョブも新しい送信を止める。

use tokio_util::sync::CancellationToken;

#[cfg(target_family = "unix")]
use tokio::signal::unix::SignalKind;

async fn shutdown_signal() {
   let ctrl_c = async {
      if let Err(e) = tokio::signal::ctrl_c().await {
         tracing::error!(error = %e, "Ctrl+C ハンドラの登録に失敗しました");
         std::future::pending::<()>().await;
      }
   };

   #[cfg(target_family = "unix")]
   let second_signal = async {
      let (mut terminate, mut quit) = match (
         tokio::signal::unix::signal(SignalKind::terminate()),
         tokio::signal::unix::signal(SignalKind::quit()),
      ) {
         (Ok(terminate), Ok(quit)) => (terminate, quit),
         (Err(e), _) | (_, Err(e)) => {
            tracing::error!(error = %e, "シグナルハンドラの登録に失敗しました");
            return std::future::pending::<()>().await;
         }
      };

      tokio::select! {
         _ = terminate.recv() => (),
         _ = quit.recv() => (),
      }
   };
   #[cfg(not(target_family = "unix"))]
   let second_signal = std::future::pending::<()>();

   tokio::select! {
      () = ctrl_c => (),
      () = second_signal => (),
   }
}

/// シグナルを受けるとキャンセルされるトークンを返す
///
/// tokio ランタイム内で呼び出すこと。
#[must_use]
pub fn shutdown_token() -> CancellationToken {
   let token = CancellationToken::new();

   {
      let token = token.clone();

      tokio::spawn(async move {
         shutdown_signal().await;
         tracing::info!("シャットダウンシグナルを受信しました");
         token.cancel();
      });
   }

   token
}
