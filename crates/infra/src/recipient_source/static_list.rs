//! 固定リストの宛先ソース
//!
//! 起動時に渡された宛先をそのまま返す。`NEWSLETTER_RECIPIENTS` で設定する。

use async_trait::async_trait;
use newsletter_domain::newsletter::{Recipient, RecipientSourceError};

use super::RecipientSource;

#[derive(Debug, Clone)]
pub struct StaticRecipientSource {
    recipients: Vec<Recipient>,
}

impl StaticRecipientSource {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self { recipients }
    }
}

#[async_trait]
impl RecipientSource for StaticRecipientSource {
    async fn fetch(&self) -> Result<Vec<Recipient>, RecipientSourceError> {
        Ok(self.recipients.clone())
    }
}
