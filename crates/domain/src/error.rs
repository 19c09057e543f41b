//! # ドメイン層エラー定義
//!
//! 値オブジェクトの生成時に検出されるルール違反を表現する。
//! 送信・宛先取得の失敗は [`crate::newsletter`] に専用のエラー型がある。

use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がドメインのルールに違反している場合に使用する。
    ///
    /// # 例
    ///
    /// - メールアドレスの形式が不正
    /// - 並行度に 0 を指定した
    #[error("バリデーションエラー: {0}")]
    Validation(String),
}
