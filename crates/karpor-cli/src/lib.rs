//! # Karpor CLI Library
//!
//! Karpor クラスタ登録をコマンドラインから操作するためのインターフェース

pub mod commands;

pub use commands::*;
