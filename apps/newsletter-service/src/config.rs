//! # Newsletter Service 設定
//!
//! 環境変数から Newsletter Service の設定を読み込む。
//!
//! 読み込みは [`NewsletterConfig::from_lookup`] に集約し、環境変数以外の
//! 値の供給元（テストの `HashMap` など）からも同じ規則で組み立てられるようにする。
//! 不正な値はパニックせず [`ConfigError`] として返す。

use std::{env, path::PathBuf, time::Duration};

use newsletter_domain::{dispatch::DispatchPolicy, newsletter::Recipient};
use thiserror::Error;

use crate::usecase::scheduler::DEFAULT_CONTENT;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3100;
const DEFAULT_SUBJECT: &str = "Newsletter";
const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_SMTP_HOST: &str = "localhost";
const DEFAULT_SMTP_PORT: u16 = 1025;
const DEFAULT_FROM_ADDRESS: &str = "noreply@newsletter.example.com";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
   /// 必須の環境変数が未設定
   #[error("{0} が設定されていません")]
   Missing(&'static str),

   /// 値が不正
   #[error("{name} の値が不正です（{value:?}）: {reason}")]
   Invalid {
      name:   &'static str,
      value:  String,
      reason: String,
   },
}

/// Newsletter Service の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterConfig {
   /// バインドアドレス
   pub host:       String,
   /// ポート番号
   pub port:       u16,
   /// スケジューラが配信する本文
   pub content:    String,
   /// メールの件名
   pub subject:    String,
   /// 宛先ソース
   pub recipients: RecipientSourceConfig,
   /// 配信設定
   pub dispatch:   DispatchConfig,
   /// メール送信設定
   pub mail:       MailConfig,
}

/// 宛先ソースの設定
///
/// `RECIPIENT_SOURCE` 環境変数で切り替える:
/// - `empty`: 常に 0 件（既定）
/// - `static`: `NEWSLETTER_RECIPIENTS` のカンマ区切りリスト
/// - `file`: `NEWSLETTER_RECIPIENTS_FILE` を配信ごとに読み込む
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientSourceConfig {
   Empty,
   Static(Vec<Recipient>),
   File(PathBuf),
}

/// 配信の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
   pub policy:       DispatchPolicy,
   /// 1 送信あたりのタイムアウト（未設定なら無制限）
   pub send_timeout: Option<Duration>,
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
   Smtp,
   Ses,
   Noop,
}

/// メール送信の設定
///
/// `MAIL_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: Mailpit（開発）/ SMTP サーバー経由で送信
/// - `ses`: Amazon SES v2 経由で送信（本番）
/// - `noop`: 送信しない（ログ出力のみ、既定）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
   pub backend:          MailBackend,
   /// SMTP ホスト（backend=smtp の場合に使用）
   pub smtp_host:        String,
   /// SMTP ポート（backend=smtp の場合に使用）
   pub smtp_port:        u16,
   /// 送信元メールアドレス
   pub from_address:     String,
   /// SES エンドポイント URL（ローカルエミュレータ使用時に設定）
   pub ses_endpoint_url: Option<String>,
}

impl NewsletterConfig {
   /// 環境変数から設定を読み込む
   pub fn from_env() -> Result<Self, ConfigError> {
      Self::from_lookup(|name| env::var(name).ok())
   }

   /// 名前から値を引く関数で設定を組み立てる
   ///
   /// 空文字列の値は未設定として扱う。
   pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
   where
      F: Fn(&str) -> Option<String>,
   {
      let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

      Ok(Self {
         host:       get("NEWSLETTER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
         port:       parse_or("NEWSLETTER_PORT", get("NEWSLETTER_PORT"), DEFAULT_PORT)?,
         content:    get("NEWSLETTER_CONTENT").unwrap_or_else(|| DEFAULT_CONTENT.to_string()),
         subject:    get("NEWSLETTER_SUBJECT").unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
         recipients: RecipientSourceConfig::from_lookup(&get)?,
         dispatch:   DispatchConfig::from_lookup(&get)?,
         mail:       MailConfig::from_lookup(&get)?,
      })
   }
}

impl RecipientSourceConfig {
   fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
      match get("RECIPIENT_SOURCE").as_deref() {
         None | Some("empty") => Ok(Self::Empty),
         Some("static") => {
            let raw = get("NEWSLETTER_RECIPIENTS").unwrap_or_default();
            let recipients = raw
               .split(',')
               .map(str::trim)
               .filter(|s| !s.is_empty())
               .map(|s| {
                  Recipient::email(s).map_err(|e| ConfigError::Invalid {
                     name:   "NEWSLETTER_RECIPIENTS",
                     value:  s.to_string(),
                     reason: e.to_string(),
                  })
               })
               .collect::<Result<Vec<_>, _>>()?;
            Ok(Self::Static(recipients))
         }
         Some("file") => get("NEWSLETTER_RECIPIENTS_FILE")
            .map(|path| Self::File(PathBuf::from(path)))
            .ok_or(ConfigError::Missing("NEWSLETTER_RECIPIENTS_FILE")),
         Some(other) => Err(ConfigError::Invalid {
            name:   "RECIPIENT_SOURCE",
            value:  other.to_string(),
            reason: "empty / static / file のいずれかを指定してください".to_string(),
         }),
      }
   }
}

impl DispatchConfig {
   fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
      let policy = match get("DISPATCH_POLICY").as_deref() {
         None | Some("fail_fast") => DispatchPolicy::FailFast,
         Some("isolated") => {
            let concurrency = parse_or(
               "DISPATCH_CONCURRENCY",
               get("DISPATCH_CONCURRENCY"),
               DEFAULT_CONCURRENCY,
            )?;
            DispatchPolicy::isolated(concurrency).map_err(|e| ConfigError::Invalid {
               name:   "DISPATCH_CONCURRENCY",
               value:  concurrency.to_string(),
               reason: e.to_string(),
            })?
         }
         Some(other) => {
            return Err(ConfigError::Invalid {
               name:   "DISPATCH_POLICY",
               value:  other.to_string(),
               reason: "fail_fast / isolated のいずれかを指定してください".to_string(),
            });
         }
      };

      let send_timeout = match get("DISPATCH_SEND_TIMEOUT_SECS") {
         Some(raw) => {
            let secs: u64 = parse("DISPATCH_SEND_TIMEOUT_SECS", &raw)?;
            if secs == 0 {
               return Err(ConfigError::Invalid {
                  name:   "DISPATCH_SEND_TIMEOUT_SECS",
                  value:  raw,
                  reason: "1 以上を指定してください".to_string(),
               });
            }
            Some(Duration::from_secs(secs))
         }
         None => None,
      };

      Ok(Self {
         policy,
         send_timeout,
      })
   }
}

impl MailConfig {
   fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
      let backend = match get("MAIL_BACKEND").as_deref() {
         None | Some("noop") => MailBackend::Noop,
         Some("smtp") => MailBackend::Smtp,
         Some("ses") => MailBackend::Ses,
         Some(other) => {
            return Err(ConfigError::Invalid {
               name:   "MAIL_BACKEND",
               value:  other.to_string(),
               reason: "smtp / ses / noop のいずれかを指定してください".to_string(),
            });
         }
      };

      Ok(Self {
         backend,
         smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
         smtp_port: parse_or("SMTP_PORT", get("SMTP_PORT"), DEFAULT_SMTP_PORT)?,
         from_address: get("MAIL_FROM_ADDRESS")
            .unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
         ses_endpoint_url: get("SES_ENDPOINT_URL"),
      })
   }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
   T: std::str::FromStr,
   T::Err: std::fmt::Display,
{
   raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
      name,
      value: raw.to_string(),
      reason: e.to_string(),
   })
}

fn parse_or<T>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
   T: std::str::FromStr,
   T::Err: std::fmt::Display,
{
   match raw {
      Some(raw) => parse(name, &raw),
      None => Ok(default),
   }
}

#[cfg(test)]
mod tests {
   use std::collections::HashMap;

   use pretty_assertions::assert_eq;
   use rstest::rstest;

   use super::*;

   fn load(vars: &[(&str, &str)]) -> Result<NewsletterConfig, ConfigError> {
      let vars: HashMap<String, String> = vars
         .iter()
         .map(|(k, v)| (k.to_string(), v.to_string()))
         .collect();
      NewsletterConfig::from_lookup(|name| vars.get(name).cloned())
   }

   #[test]
   fn 未設定ならすべて既定値になる() {
      let config = load(&[]).unwrap();

      assert_eq!(
         config,
         NewsletterConfig {
            host:       "0.0.0.0".to_string(),
            port:       3100,
            content:    "Email Content Here".to_string(),
            subject:    "Newsletter".to_string(),
            recipients: RecipientSourceConfig::Empty,
            dispatch:   DispatchConfig {
               policy:       DispatchPolicy::FailFast,
               send_timeout: None,
            },
            mail:       MailConfig {
               backend:          MailBackend::Noop,
               smtp_host:        "localhost".to_string(),
               smtp_port:        1025,
               from_address:     "noreply@newsletter.example.com".to_string(),
               ses_endpoint_url: None,
            },
         }
      );
   }

   #[test]
   fn staticはカンマ区切りの宛先を順に読み込む() {
      let config = load(&[
         ("RECIPIENT_SOURCE", "static"),
         ("NEWSLETTER_RECIPIENTS", "a@example.com, b@example.com,,c@example.com"),
      ])
      .unwrap();

      assert_eq!(
         config.recipients,
         RecipientSourceConfig::Static(vec![
            Recipient::new("a@example.com"),
            Recipient::new("b@example.com"),
            Recipient::new("c@example.com"),
         ])
      );
   }

   #[test]
   fn staticの不正な宛先はエラーになる() {
      let result = load(&[
         ("RECIPIENT_SOURCE", "static"),
         ("NEWSLETTER_RECIPIENTS", "a@example.com,broken"),
      ]);

      assert!(matches!(
         result,
         Err(ConfigError::Invalid {
            name: "NEWSLETTER_RECIPIENTS",
            ..
         })
      ));
   }

   #[test]
   fn fileはパスが必須() {
      let result = load(&[("RECIPIENT_SOURCE", "file")]);

      assert_eq!(
         result,
         Err(ConfigError::Missing("NEWSLETTER_RECIPIENTS_FILE"))
      );
   }

   #[test]
   fn fileはパスを保持する() {
      let config = load(&[
         ("RECIPIENT_SOURCE", "file"),
         ("NEWSLETTER_RECIPIENTS_FILE", "/var/lib/newsletter/recipients.txt"),
      ])
      .unwrap();

      assert_eq!(
         config.recipients,
         RecipientSourceConfig::File(PathBuf::from("/var/lib/newsletter/recipients.txt"))
      );
   }

   #[test]
   fn isolatedは並行度とタイムアウトを読み込む() {
      let config = load(&[
         ("DISPATCH_POLICY", "isolated"),
         ("DISPATCH_CONCURRENCY", "16"),
         ("DISPATCH_SEND_TIMEOUT_SECS", "30"),
      ])
      .unwrap();

      assert_eq!(
         config.dispatch,
         DispatchConfig {
            policy:       DispatchPolicy::isolated(16).unwrap(),
            send_timeout: Some(Duration::from_secs(30)),
         }
      );
   }

   #[test]
   fn isolatedの並行度は既定で8() {
      let config = load(&[("DISPATCH_POLICY", "isolated")]).unwrap();

      assert_eq!(config.dispatch.policy.max_in_flight(), 8);
   }

   #[rstest]
   #[case::ポート番号("NEWSLETTER_PORT", "abc")]
   #[case::smtpポート範囲外("SMTP_PORT", "70000")]
   #[case::宛先ソース("RECIPIENT_SOURCE", "database")]
   #[case::配信ポリシー("DISPATCH_POLICY", "retry")]
   #[case::タイムアウト0秒("DISPATCH_SEND_TIMEOUT_SECS", "0")]
   #[case::タイムアウト負数("DISPATCH_SEND_TIMEOUT_SECS", "-1")]
   #[case::メール送信バックエンド("MAIL_BACKEND", "sendmail")]
   fn 不正な値はinvalidになる(#[case] name: &str, #[case] value: &str) {
      let result = load(&[(name, value)]);

      assert!(
         matches!(&result, Err(ConfigError::Invalid { name: n, .. }) if *n == name),
         "{result:?}"
      );
   }

   #[test]
   fn 並行度0はinvalidになる() {
      let result = load(&[("DISPATCH_POLICY", "isolated"), ("DISPATCH_CONCURRENCY", "0")]);

      assert!(matches!(
         result,
         Err(ConfigError::Invalid {
            name: "DISPATCH_CONCURRENCY",
            ..
         })
      ));
   }

   #[test]
   fn 空文字列は未設定として扱う() {
      let config = load(&[("NEWSLETTER_PORT", ""), ("MAIL_BACKEND", " ")]).unwrap();

      assert_eq!(config.port, 3100);
      assert_eq!(config.mail.backend, MailBackend::Noop);
   }

   #[test]
   fn smtpバックエンドの接続先を読み込む() {
      let config = load(&[
         ("MAIL_BACKEND", "smtp"),
         ("SMTP_HOST", "mailpit"),
         ("SMTP_PORT", "2525"),
         ("MAIL_FROM_ADDRESS", "news@example.com"),
      ])
      .unwrap();

      assert_eq!(config.mail.backend, MailBackend::Smtp);
      assert_eq!(config.mail.smtp_host, "mailpit");
      assert_eq!(config.mail.smtp_port, 2525);
      assert_eq!(config.mail.from_address, "news@example.com");
   }
}
