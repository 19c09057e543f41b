//! # Newsletter Service ライブラリ
//!
//! 配信ユースケース、設定、HTTP ハンドラを公開する。
//! 統合テストから配信処理を直接呼べるよう、バイナリとは別にライブラリとして切り出している。

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod shutdown;
pub mod usecase;
