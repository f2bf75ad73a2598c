// Core Domain
// テーブル定義・エンティティ記述子・変更セット・設定・エラーの純粋なモデル

pub mod change_set;
pub mod config;
pub mod entity;
pub mod error;
pub mod naming;
pub mod report;
pub mod table;
