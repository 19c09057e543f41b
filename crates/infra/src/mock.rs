//! # テスト用モック
//!
//! 配信ユースケースのテストで使用するインメモリの宛先ソースと送信手段。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! newsletter-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use newsletter_domain::newsletter::{Content, DeliveryError, Recipient, RecipientSourceError};

use crate::{recipient_source::RecipientSource, transport::Transport};

// ===== MockRecipientSource =====

/// テスト用の宛先ソース
///
/// `fetch()` の呼び出し回数を数える。`replace()` で次回以降の宛先を差し替えられる。
#[derive(Clone, Default)]
pub struct MockRecipientSource {
    recipients:  Arc<Mutex<Vec<Recipient>>>,
    failing:     bool,
    fetch_count: Arc<AtomicUsize>,
}

impl MockRecipientSource {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self {
            recipients: Arc::new(Mutex::new(recipients)),
            ..Self::default()
        }
    }

    /// `fetch()` が常に失敗する宛先ソース
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// 次回以降の `fetch()` が返す宛先を差し替える
    pub fn replace(&self, recipients: Vec<Recipient>) {
        *self.recipients.lock().unwrap() = recipients;
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipientSource for MockRecipientSource {
    async fn fetch(&self) -> Result<Vec<Recipient>, RecipientSourceError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(RecipientSourceError::Unavailable(
                "mock recipient source".to_string(),
            ));
        }
        Ok(self.recipients.lock().unwrap().clone())
    }
}

// ===== MockTransport =====

/// テスト用の送信手段
///
/// - `attempts()`: `send()` が呼ばれた宛先（呼び出し順）
/// - `sent()`: 成功した `(宛先, 本文)`（完了順）
/// - `fail_for()`: 指定した宛先への送信を失敗させる
/// - `with_delay()`: 1 送信あたりの所要時間を設定する
/// - `peak_in_flight()`: 同時に送信中だった件数の最大値
#[derive(Clone, Default)]
pub struct MockTransport {
    attempts:       Arc<Mutex<Vec<Recipient>>>,
    sent:           Arc<Mutex<Vec<(Recipient, Content)>>>,
    failing:        Arc<Mutex<HashSet<Recipient>>>,
    delay:          Option<Duration>,
    in_flight:      Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fail_for(&self, recipient: Recipient) {
        self.failing.lock().unwrap().insert(recipient);
    }

    pub fn attempts(&self) -> Vec<Recipient> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(Recipient, Content)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, recipient: &Recipient, content: &Content) -> Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push(recipient.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(recipient) {
            return Err(DeliveryError::SendFailed(format!(
                "mock transport rejected {recipient}"
            )));
        }

        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), content.clone()));
        Ok(())
    }
}
