// エンティティ記述子
//
// ドメイン型に付与する宣言的メタデータ（テーブル・カラム・ID・インデックスのマーカー）。
// `Entity` トレイトによるプログラム的な登録と、YAML記述子ファイルの両方で使用します。

use crate::core::naming;
use crate::core::table::{IdStrategy, IndexType, LogicalType};
use serde::{Deserialize, Serialize};

/// 記述子を提供するドメイン型
///
/// ```
/// use tablewright::core::entity::{ColumnMarker, Entity, EntityDescriptor, FieldDescriptor, TableMarker};
///
/// struct SysUser;
///
/// impl Entity for SysUser {
///     fn descriptor() -> EntityDescriptor {
///         EntityDescriptor::new("app::domain::SysUser")
///             .with_table(TableMarker::named("sys_user"))
///             .with_field(FieldDescriptor::new("id", "i64").identifier())
///             .with_field(FieldDescriptor::new("username", "String").with_column(ColumnMarker {
///                 length: Some(50),
///                 nullable: Some(false),
///                 unique: true,
///                 ..Default::default()
///             }))
///     }
/// }
///
/// assert_eq!(SysUser::descriptor().simple_name(), "SysUser");
/// ```
pub trait Entity {
    /// エンティティ記述子を返す
    fn descriptor() -> EntityDescriptor;
}

/// エンティティ記述子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityDescriptor {
    /// 完全修飾型名（`app::domain::SysUser`）
    pub type_name: String,
    /// テーブルマーカー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<TableMarker>,
    /// フィールド（宣言順）
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// テーブルレベルのインデックス
    #[serde(default)]
    pub indexes: Vec<IndexMarker>,
}

impl EntityDescriptor {
    /// 新しい記述子を作成
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            table: None,
            fields: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// テーブルマーカーを指定
    pub fn with_table(mut self, table: TableMarker) -> Self {
        self.table = Some(table);
        self
    }

    /// フィールドを追加
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// インデックスを追加
    pub fn with_index(mut self, index: IndexMarker) -> Self {
        self.indexes.push(index);
        self
    }

    /// 単純型名
    pub fn simple_name(&self) -> &str {
        naming::simple_type_name(&self.type_name)
    }

    /// 型が属するモジュールパス
    pub fn module_path(&self) -> &str {
        match self.type_name.rfind("::") {
            Some(pos) => &self.type_name[..pos],
            None => "",
        }
    }

    /// 自動メンテナンスが有効なテーブルマーカーを持つかどうか
    pub fn is_auto_maintained(&self) -> bool {
        self.table.as_ref().is_some_and(|t| t.auto_maintain)
    }
}

fn default_true() -> bool {
    true
}

/// テーブルマーカー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableMarker {
    /// 明示的なテーブル名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// スキーマ名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// コメント
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// ストレージエンジン
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// 文字セット
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// 照合順序
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,
    /// 自動メンテナンス対象かどうか
    #[serde(default = "default_true")]
    pub auto_maintain: bool,
}

impl Default for TableMarker {
    fn default() -> Self {
        Self {
            name: None,
            schema: None,
            comment: None,
            engine: None,
            charset: None,
            collation: None,
            auto_maintain: true,
        }
    }
}

impl TableMarker {
    /// テーブル名を指定したマーカー
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }
}

/// フィールド記述子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldDescriptor {
    /// フィールド名
    pub name: String,
    /// Rustの型（`i64`, `Option<String>`, `chrono::NaiveDateTime` など）
    #[serde(rename = "type")]
    pub field_type: String,
    /// カラムマーカー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ColumnMarker>,
    /// IDマーカー
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdMarker>,
    /// 永続化対象外
    #[serde(default)]
    pub transient: bool,
}

impl FieldDescriptor {
    /// 新しいフィールド記述子を作成
    pub fn new(name: &str, field_type: &str) -> Self {
        Self {
            name: name.to_string(),
            field_type: field_type.to_string(),
            column: None,
            id: None,
            transient: false,
        }
    }

    /// カラムマーカーを指定
    pub fn with_column(mut self, column: ColumnMarker) -> Self {
        self.column = Some(column);
        self
    }

    /// 既定の戦略（AUTO）でIDにする
    pub fn identifier(self) -> Self {
        self.with_id(IdMarker::default())
    }

    /// IDマーカーを指定
    pub fn with_id(mut self, id: IdMarker) -> Self {
        self.id = Some(id);
        self
    }

    /// 永続化対象外にする
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }
}

/// カラムマーカー
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ColumnMarker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// 論理型の上書き
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<LogicalType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// 未指定の場合はフィールド型（`Option<T>`）から判定
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub auto_increment: bool,
    /// 生のカラム定義（型以降の全体）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_definition: Option<String>,
}

/// IDマーカー
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IdMarker {
    #[serde(default)]
    pub strategy: IdStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_name: Option<String>,
}

/// インデックスマーカー
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexMarker {
    /// 省略時は自動生成
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// カラム名またはフィールド名
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, rename = "type")]
    pub index_type: IndexType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl IndexMarker {
    /// カラムを指定してインデックスマーカーを作成
    pub fn on(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    /// 名前を指定
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// ユニークにする
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
