//! # 配信ジョブ
//!
//! 1 回の配信（本文 1 件 × 宛先スナップショット 1 回分）の結果を表現する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`DispatchJobId`] | 配信ジョブ ID | ログ相関用。永続化はしない |
//! | [`DispatchPolicy`] | 配信ポリシー | 失敗時に打ち切るか、宛先ごとに隔離するか |
//! | [`DeliveryOutcome`] | 宛先ごとの配信結果 | sent / failed / skipped |
//! | [`DispatchReport`] | 配信レポート | 宛先取得順に並んだ配信結果の集約 |
//!
//! ## 不変条件
//!
//! - `outcomes` は宛先リストの取得順に並ぶ（完了順ではない）
//! - 1 宛先につき `outcomes` の要素はちょうど 1 つ

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::IntoStaticStr;

use crate::{
    DomainError,
    newsletter::{DeliveryError, Recipient},
};

define_uuid_id! {
    /// 配信ジョブ ID
    ///
    /// 1 回の `dispatch` 呼び出しごとに採番する。ログとレポートの相関に使う。
    pub struct DispatchJobId;
}

/// 配信ポリシー
///
/// - `FailFast`: 宛先取得順に 1 件ずつ送信し、最初の送信失敗で配信全体を中断する
/// - `Isolated`: 最大 `concurrency` 件を並行に送信し、失敗した宛先を記録して続行する
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DispatchPolicy {
    #[default]
    FailFast,
    Isolated { concurrency: NonZeroUsize },
}

impl DispatchPolicy {
    /// 並行度を指定して `Isolated` ポリシーを作成する
    ///
    /// # エラー
    ///
    /// `concurrency` が 0 の場合は `DomainError::Validation` を返す。
    pub fn isolated(concurrency: usize) -> Result<Self, DomainError> {
        let concurrency = NonZeroUsize::new(concurrency).ok_or_else(|| {
            DomainError::Validation("並行度は 1 以上である必要があります".to_string())
        })?;
        Ok(Self::Isolated { concurrency })
    }

    /// ログ出力用の名前
    pub fn name(&self) -> &'static str {
        match self {
            Self::FailFast => "fail_fast",
            Self::Isolated { .. } => "isolated",
        }
    }

    /// 同時に送信中となりうる最大件数
    pub fn max_in_flight(&self) -> usize {
        match self {
            Self::FailFast => 1,
            Self::Isolated { concurrency } => concurrency.get(),
        }
    }
}

/// 宛先ごとの配信状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryStatus {
    /// 送信成功
    Sent,
    /// 送信失敗
    Failed,
    /// キャンセルにより送信しなかった
    Skipped,
}

/// 宛先ごとの配信結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub recipient: Recipient,
    pub status:    DeliveryStatus,
    /// 失敗理由（`Failed` のときのみ）
    pub error:     Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(recipient: Recipient) -> Self {
        Self {
            recipient,
            status: DeliveryStatus::Sent,
            error: None,
        }
    }

    pub fn failed(recipient: Recipient, error: &DeliveryError) -> Self {
        Self {
            recipient,
            status: DeliveryStatus::Failed,
            error: Some(error.to_string()),
        }
    }

    pub fn skipped(recipient: Recipient) -> Self {
        Self {
            recipient,
            status: DeliveryStatus::Skipped,
            error: None,
        }
    }
}

/// 配信レポート
///
/// 1 回の配信ジョブの結果。ジョブ終了後は何も保持しないため、
/// 呼び出し元に返した時点でレポートが唯一の記録になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub job_id:      DispatchJobId,
    pub policy:      DispatchPolicy,
    pub started_at:  DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// キャンセルにより送信しなかった宛先があるか
    pub cancelled:   bool,
    pub outcomes:    Vec<DeliveryOutcome>,
}

impl DispatchReport {
    /// 宛先数
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// 送信成功数
    pub fn sent(&self) -> usize {
        self.count(DeliveryStatus::Sent)
    }

    /// 送信失敗数
    pub fn failed(&self) -> usize {
        self.count(DeliveryStatus::Failed)
    }

    /// 未送信数
    pub fn skipped(&self) -> usize {
        self.count(DeliveryStatus::Skipped)
    }

    /// 送信に失敗した宛先（取得順）
    pub fn failed_recipients(&self) -> Vec<&Recipient> {
        self.outcomes
            .iter()
            .filter(|o| o.status == DeliveryStatus::Failed)
            .map(|o| &o.recipient)
            .collect()
    }

    /// 全宛先に送信できたか
    ///
    /// 宛先 0 件の配信も成功として扱う。
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == DeliveryStatus::Sent)
    }

    fn count(&self, status: DeliveryStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_report(outcomes: Vec<DeliveryOutcome>) -> DispatchReport {
        let at = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        DispatchReport {
            job_id: DispatchJobId::new(),
            policy: DispatchPolicy::isolated(4).unwrap(),
            started_at: at,
            finished_at: at,
            cancelled: false,
            outcomes,
        }
    }

    #[test]
    fn isolatedは並行度0を受け付けない() {
        let result = DispatchPolicy::isolated(0);

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn fail_fastの同時送信数は1() {
        assert_eq!(DispatchPolicy::FailFast.max_in_flight(), 1);
        assert_eq!(DispatchPolicy::isolated(8).unwrap().max_in_flight(), 8);
        assert_eq!(DispatchPolicy::default(), DispatchPolicy::FailFast);
    }

    #[test]
    fn 配信状態ごとの件数を集計する() {
        let report = make_report(vec![
            DeliveryOutcome::sent(Recipient::new("a@example.com")),
            DeliveryOutcome::failed(
                Recipient::new("b@example.com"),
                &DeliveryError::SendFailed("550".to_string()),
            ),
            DeliveryOutcome::sent(Recipient::new("c@example.com")),
            DeliveryOutcome::skipped(Recipient::new("d@example.com")),
        ]);

        assert_eq!(report.total(), 4);
        assert_eq!(report.sent(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(
            report.failed_recipients(),
            vec![&Recipient::new("b@example.com")]
        );
        assert!(!report.is_success());
    }

    #[test]
    fn 宛先0件のレポートは成功として扱う() {
        let report = make_report(Vec::new());

        assert_eq!(report.total(), 0);
        assert!(report.is_success());
    }

    #[test]
    fn failedは失敗理由を保持する() {
        let outcome = DeliveryOutcome::failed(
            Recipient::new("b@example.com"),
            &DeliveryError::SendFailed("mailbox unavailable".to_string()),
        );

        assert_eq!(outcome.status.to_string(), "failed");
        assert_eq!(
            outcome.error.as_deref(),
            Some("送信に失敗: mailbox unavailable")
        );
    }

    #[test]
    fn policyはmodeタグ付きでシリアライズされる() {
        let json = serde_json::to_value(DispatchPolicy::isolated(3).unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "mode": "isolated", "concurrency": 3 })
        );
        assert_eq!(
            serde_json::to_value(DispatchPolicy::FailFast).unwrap(),
            serde_json::json!({ "mode": "fail_fast" })
        );
    }
}
