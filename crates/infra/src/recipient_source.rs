//! # 宛先ソース
//!
//! 配信ジョブごとに 1 回呼ばれ、その時点の宛先リストを返す。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: 宛先の保存方法を `RecipientSource` で隠す
//! - **3 つの実装**: 空（既定）、固定リスト、ファイル
//! - **スナップショット**: `fetch()` は有限の `Vec` を一度に返す（ストリームにしない）

mod empty;
mod file;
mod static_list;

use async_trait::async_trait;
pub use empty::EmptyRecipientSource;
pub use file::FileRecipientSource;
use newsletter_domain::newsletter::{Recipient, RecipientSourceError};
pub use static_list::StaticRecipientSource;

/// 宛先ソーストレイト
#[async_trait]
pub trait RecipientSource: Send + Sync {
    /// 現在の宛先リストを取得する
    ///
    /// 返すリストは順序付きで、空でもよい。
    async fn fetch(&self) -> Result<Vec<Recipient>, RecipientSourceError>;
}
