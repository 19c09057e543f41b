//! # Newsletter ドメイン層
//!
//! ニュースレター配信の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **値オブジェクト**: 本文（[`newsletter::Content`]）と宛先（[`newsletter::Recipient`]）は
//!   不変の Newtype として扱い、配信ジョブ内で共有する
//! - **配信結果の型**: 宛先ごとの結果（[`dispatch::DeliveryOutcome`]）を集約した
//!   [`dispatch::DispatchReport`] を配信ジョブの戻り値とする
//! - **外部依存なし**: 宛先の保存方法や送信手段はインフラ層の責務とし、
//!   このクレートはそれらに依存しない
//!
//! ## 依存関係の方向
//!
//! ```text
//! newsletter-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`clock`] - 時刻プロバイダ
//! - [`dispatch`] - 配信ジョブ、配信ポリシー、配信レポート
//! - [`error`] - ドメイン層のエラー定義
//! - [`newsletter`] - 本文、宛先、メールメッセージ、送信系エラー
//!
//! ## 使用例
//!
//! ```rust
//! use newsletter_domain::newsletter::{Content, Recipient};
//!
//! let content = Content::new("今月のお知らせ");
//! let recipient = Recipient::email("reader@example.com").unwrap();
//!
//! assert_eq!(content.as_str(), "今月のお知らせ");
//! assert_eq!(recipient.as_str(), "reader@example.com");
//! ```

#[macro_use]
mod macros;

pub mod clock;
pub mod dispatch;
pub mod error;
pub mod newsletter;

pub use error::DomainError;
