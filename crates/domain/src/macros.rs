/// UUID v7 ベースの ID 型を定義する宣言型マクロ
///
/// 以下を一括生成する:
/// - `Uuid` をラップする Newtype 構造体
/// - `derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()` / `from_uuid()` / `as_uuid()`
/// - `Default` impl（`new()` に委譲）
///
/// # 使用例
///
/// ```rust
/// use newsletter_domain::dispatch::DispatchJobId;
///
/// let id = DispatchJobId::new();
/// let restored = DispatchJobId::from_uuid(*id.as_uuid());
/// assert_eq!(id, restored);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 新しい ID を生成する（UUID v7）
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// 既存の UUID から ID を作成する
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// 内部の UUID 参照を取得する
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}
