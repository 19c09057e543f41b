//! # ルーター構築
//!
//! `main.rs` は依存コンポーネントの初期化とサーバー起動に集中し、
//! ルート定義はここに置く（テストから同じルーターを組み立てるため）。

use std::sync::Arc;

use axum::{
   Router,
   routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handler::{DispatchState, health_check, trigger_dispatch};

/// アプリケーションのルーターを構築する
pub fn build_router(dispatch_state: Arc<DispatchState>) -> Router {
   Router::new()
      .route("/health", get(health_check))
      .route("/internal/newsletter/dispatch", post(trigger_dispatch))
      .with_state(dispatch_state)
      .layer(TraceLayer::new_for_http())
}
