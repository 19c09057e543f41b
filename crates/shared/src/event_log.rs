//! # ビジネスイベントログ
//!
//! 配信の開始・完了や宛先ごとの送信結果を、`jq` で絞り込みやすい形で出力する。
//!
//! [`log_business_event!`] は `event.kind = "business_event"` を自動付与するので、
//! `jq 'select(.["event.kind"] == "business_event")'` で抽出できる。
//!
//! フィールド名はドット記法（`event.category`、`event.action`）を使う。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: [`event::category`] の定数
/// - `event.action`: [`event::action`] の定数
/// - `event.result`: [`event::result`] の定数
///
/// ## 推奨フィールド
///
/// - `event.job_id`: 配信ジョブ ID
/// - `event.recipient`: 宛先
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const NEWSLETTER: &str = "newsletter";
    }

    /// イベントアクション
    pub mod action {
        // 配信ジョブ
        pub const DISPATCH_STARTED: &str = "dispatch.started";
        pub const DISPATCH_COMPLETED: &str = "dispatch.completed";
        pub const DISPATCH_FAILED: &str = "dispatch.failed";

        // 宛先ごとの送信
        pub const DELIVERY_SENT: &str = "delivery.sent";
        pub const DELIVERY_FAILED: &str = "delivery.failed";
        pub const DELIVERY_SKIPPED: &str = "delivery.skipped";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
///
/// `tracing::error!` に `error.category` と `error.kind` を直接付ける。
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// 宛先ソース・送信手段などの外部協調者
        pub const EXTERNAL_SERVICE: &str = "external_service";
        /// タスク実行基盤
        pub const INFRASTRUCTURE: &str = "infrastructure";
    }

    /// エラー種別
    pub mod kind {
        pub const RECIPIENT_FETCH: &str = "recipient_fetch";
        pub const DELIVERY: &str = "delivery";
        pub const INTERNAL: &str = "internal";
    }
}
