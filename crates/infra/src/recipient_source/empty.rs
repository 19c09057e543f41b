//! 空の宛先ソース
//!
//! 宛先の保存先が未整備の間の既定実装。常に 0 件を返す。

use async_trait::async_trait;
use newsletter_domain::newsletter::{Recipient, RecipientSourceError};

use super::RecipientSource;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRecipientSource;

#[async_trait]
impl RecipientSource for EmptyRecipientSource {
    async fn fetch(&self) -> Result<Vec<Recipient>, RecipientSourceError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetchは常に空のリストを返す() {
        let recipients = EmptyRecipientSource.fetch().await.unwrap();

        assert!(recipients.is_empty());
    }
}
