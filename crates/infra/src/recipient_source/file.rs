//! ファイルの宛先ソース
//!
//! 1 行 1 アドレスのテキストファイルを `fetch()` のたびに読み込む。
//! 空行と `#` で始まる行は無視する。各行はメールアドレスとして検証する。

use std::path::PathBuf;

use async_trait::async_trait;
use newsletter_domain::newsletter::{Recipient, RecipientSourceError};

use super::RecipientSource;

#[derive(Debug, Clone)]
pub struct FileRecipientSource {
    path: PathBuf,
}

impl FileRecipientSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecipientSource for FileRecipientSource {
    async fn fetch(&self) -> Result<Vec<Recipient>, RecipientSourceError> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            RecipientSourceError::Unavailable(format!("{}: {e}", self.path.display()))
        })?;

        let recipients = parse_recipients(&text)?;
        tracing::debug!(
            path = %self.path.display(),
            count = recipients.len(),
            "宛先ファイルを読み込みました"
        );
        Ok(recipients)
    }
}

/// 宛先ファイルの内容をパースする
///
/// 行の順序を保つ。重複は取り除かない。
pub(crate) fn parse_recipients(text: &str) -> Result<Vec<Recipient>, RecipientSourceError> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(line_number, line)| {
            Recipient::email(line).map_err(|e| RecipientSourceError::InvalidRecipient {
                line:   line_number,
                reason: e.to_string(),
            })
        })
        .collect()
}
