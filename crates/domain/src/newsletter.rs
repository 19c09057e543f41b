//! # ニュースレター
//!
//! 配信ジョブで扱う値オブジェクトと、送信・宛先取得のエラーを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Content`] | 本文 | 配信ジョブ内の全宛先で共有される不変のペイロード |
//! | [`Recipient`] | 宛先 | 不透明なアドレス識別子。形式の検証は宛先ソースの責務 |
//! | [`EmailMessage`] | メールメッセージ | メール送信時に本文から組み立てる |
//!
//! ## エラー
//!
//! - [`RecipientSourceError`]: 宛先リストの取得失敗（配信開始前に中断）
//! - [`DeliveryError`]: 1 宛先への送信失敗

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DomainError;

/// メールアドレスの最大長
const MAX_EMAIL_LENGTH: usize = 255;

/// 本文（値オブジェクト）
///
/// 呼び出し元が用意した不透明なテキスト。配信処理は中身を解釈しない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(String);

impl Content {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Content {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 宛先（値オブジェクト）
///
/// 配信処理にとっては不透明な識別子。
/// [`Recipient::new`] は値を検証しない。メールアドレスとして扱う宛先ソースは
/// [`Recipient::email`] で生成時に形式を検証する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipient(String);

impl Recipient {
    /// 検証なしで宛先を作成する
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// メールアドレスとして検証した宛先を作成する
    ///
    /// # バリデーション
    ///
    /// - 前後の空白を除去した上で空でない
    /// - `local@domain` の形式（両側とも空でない）
    /// - 最大 255 文字
    pub fn email(address: impl Into<String>) -> Result<Self, DomainError> {
        let address = address.into().trim().to_string();

        if address.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = address.split_once('@') else {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {address}"
            )));
        };

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(DomainError::Validation(format!(
                "メールアドレスの形式が不正です: {address}"
            )));
        }

        if address.chars().count() > MAX_EMAIL_LENGTH {
            return Err(DomainError::Validation(format!(
                "メールアドレスは{MAX_EMAIL_LENGTH}文字以内である必要があります"
            )));
        }

        Ok(Self(address))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// メールメッセージ
///
/// 本文をメールとして送るときの送信単位。`MailSender` に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 宛先リストの取得エラー
#[derive(Debug, Error)]
pub enum RecipientSourceError {
    /// 宛先の保存先にアクセスできない
    #[error("宛先リストを取得できません: {0}")]
    Unavailable(String),

    /// 保存されている宛先が不正
    #[error("不正な宛先が含まれています（{line} 行目）: {reason}")]
    InvalidRecipient {
        /// 1 始まりの行番号
        line:   usize,
        reason: String,
    },
}

/// 1 宛先への送信エラー
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// 送信に失敗
    #[error("送信に失敗: {0}")]
    SendFailed(String),

    /// 宛先または送信元のアドレスが送信手段で扱えない
    #[error("アドレスが不正: {0}")]
    InvalidAddress(String),

    /// メール本文の生成に失敗
    #[error("メール本文の生成に失敗: {0}")]
    RenderFailed(String),

    /// 送信がタイムアウトした
    #[error("送信がタイムアウトしました（{timeout_ms} ms）")]
    TimedOut { timeout_ms: u128 },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("reader@example.com", "reader@example.com")]
    #[case("  padded@example.com  ", "padded@example.com")]
    #[case("first.last+tag@sub.example.co.jp", "first.last+tag@sub.example.co.jp")]
    fn 正しいメールアドレスから宛先を作成できる(#[case] input: &str, #[case] expected: &str) {
        let recipient = Recipient::email(input).unwrap();

        assert_eq!(recipient.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("no-at-mark")]
    #[case("@example.com")]
    #[case("reader@")]
    #[case("a@b@example.com")]
    fn 不正なメールアドレスはバリデーションエラーになる(#[case] input: &str) {
        let result = Recipient::email(input);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn 長すぎるメールアドレスはバリデーションエラーになる() {
        let address = format!("{}@example.com", "a".repeat(250));

        let result = Recipient::email(address);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn newは値を検証しない() {
        let recipient = Recipient::new("not-an-email");

        assert_eq!(recipient.to_string(), "not-an-email");
    }

    #[test]
    fn contentとrecipientは文字列としてシリアライズされる() {
        let content = serde_json::to_value(Content::new("本文")).unwrap();
        let recipient = serde_json::to_value(Recipient::new("r@example.com")).unwrap();

        assert_eq!(content, serde_json::json!("本文"));
        assert_eq!(recipient, serde_json::json!("r@example.com"));
    }

    #[test]
    fn delivery_errorのメッセージに理由が含まれる() {
        let error = DeliveryError::TimedOut { timeout_ms: 1500 };

        assert_eq!(error.to_string(), "送信がタイムアウトしました（1500 ms）");
    }
}
