// Tablewrightライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（plan / apply / validate のコマンドルーティング）
// - core: コアドメインモデル（テーブル定義、エンティティ記述子、変更セット、設定、エラー）
// - adapters: 方言ごとのDDL生成・カタログ参照とデータベース接続
// - services: メタデータ抽出、差分検出、検証、実行、非同期実行と起動時オーケストレーション

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
