// テーブル定義モデル
//
// 望ましい状態（エンティティから抽出）と実際の状態（カタログから取得）の
// 両方を表現する、方言非依存のテーブル構造を定義します。

use crate::core::naming;
use serde::{Deserialize, Serialize};

/// 論理データ型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Float,
    Double,
    Boolean,
    Char,
    Varchar,
    Text,
    Date,
    Time,
    Timestamp,
    Blob,
    Json,
    Uuid,
}

impl LogicalType {
    /// 長さ指定を持つ型かどうか
    pub fn has_length(&self) -> bool {
        matches!(self, LogicalType::Char | LogicalType::Varchar)
    }

    /// 精度・スケール指定を持つ型かどうか
    pub fn has_precision(&self) -> bool {
        matches!(self, LogicalType::Decimal)
    }

    /// 整数型かどうか
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            LogicalType::TinyInt | LogicalType::SmallInt | LogicalType::Integer | LogicalType::BigInt
        )
    }

    /// 既定の長さ
    pub fn default_length(&self) -> Option<u32> {
        match self {
            LogicalType::Varchar => Some(255),
            LogicalType::Char => Some(1),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogicalType::TinyInt => "TINYINT",
            LogicalType::SmallInt => "SMALLINT",
            LogicalType::Integer => "INTEGER",
            LogicalType::BigInt => "BIGINT",
            LogicalType::Decimal => "DECIMAL",
            LogicalType::Float => "FLOAT",
            LogicalType::Double => "DOUBLE",
            LogicalType::Boolean => "BOOLEAN",
            LogicalType::Char => "CHAR",
            LogicalType::Varchar => "VARCHAR",
            LogicalType::Text => "TEXT",
            LogicalType::Date => "DATE",
            LogicalType::Time => "TIME",
            LogicalType::Timestamp => "TIMESTAMP",
            LogicalType::Blob => "BLOB",
            LogicalType::Json => "JSON",
            LogicalType::Uuid => "UUID",
        };
        write!(f, "{}", name)
    }
}

/// DECIMAL型の既定精度
pub const DEFAULT_DECIMAL_PRECISION: u32 = 19;
/// DECIMAL型の既定スケール
pub const DEFAULT_DECIMAL_SCALE: u32 = 2;

/// インデックス種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexType {
    #[default]
    Btree,
    Hash,
    Fulltext,
    Spatial,
}

/// ID生成戦略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdStrategy {
    #[default]
    Auto,
    Identity,
    Sequence,
    Assigned,
    Uuid,
}

impl IdStrategy {
    /// データベース側で値を採番する戦略かどうか
    pub fn is_generated(&self) -> bool {
        matches!(self, IdStrategy::Auto | IdStrategy::Identity)
    }
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDefinition {
    /// カラム名
    pub name: String,
    /// 論理型
    pub logical_type: LogicalType,
    /// 文字列長
    pub length: Option<u32>,
    /// 数値精度
    pub precision: Option<u32>,
    /// 数値スケール
    pub scale: Option<u32>,
    /// NULL許可
    pub nullable: bool,
    /// 単一カラムのユニーク制約
    pub unique: bool,
    /// デフォルト値（SQLリテラル）
    pub default_value: Option<String>,
    /// 自動採番
    pub auto_increment: bool,
    /// コメント
    pub comment: Option<String>,
    /// 生のカラム定義（指定時は他の属性より優先）
    pub column_definition: Option<String>,
    /// カタログから取得した物理型（実テーブルのみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_type: Option<String>,
}

impl ColumnDefinition {
    /// 新しいカラム定義を作成（NULL許可、その他の属性は未指定）
    pub fn new(name: &str, logical_type: LogicalType) -> Self {
        Self {
            name: name.to_string(),
            logical_type,
            length: None,
            precision: None,
            scale: None,
            nullable: true,
            unique: false,
            default_value: None,
            auto_increment: false,
            comment: None,
            column_definition: None,
            physical_type: None,
        }
    }

    /// 長さを指定
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// 精度とスケールを指定
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// NOT NULLにする
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// ユニークにする
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// 自動採番にする
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.nullable = false;
        self
    }

    /// デフォルト値を指定
    pub fn with_default(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    /// コメントを指定
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// 物理型を指定（イントロスペクション結果）
    pub fn with_physical_type(mut self, physical_type: &str) -> Self {
        self.physical_type = Some(physical_type.to_string());
        self
    }

    /// 生のカラム定義で上書きされているかどうか
    pub fn is_raw(&self) -> bool {
        self.column_definition.is_some()
    }

    /// 有効な長さ（未指定の場合は型の既定値）
    pub fn effective_length(&self) -> Option<u32> {
        self.length.or_else(|| self.logical_type.default_length())
    }

    /// 有効な精度とスケール
    pub fn effective_precision(&self) -> (u32, u32) {
        (
            self.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
            self.scale.unwrap_or(DEFAULT_DECIMAL_SCALE),
        )
    }
}

/// インデックス定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexDefinition {
    /// インデックス名
    pub name: String,
    /// 対象カラム（順序付き）
    pub columns: Vec<String>,
    /// ユニークインデックス
    pub unique: bool,
    /// インデックス種別
    pub index_type: IndexType,
    /// コメント
    pub comment: Option<String>,
}

impl IndexDefinition {
    /// 新しいインデックス定義を作成
    pub fn new(name: &str, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: name.to_string(),
            columns,
            unique,
            index_type: IndexType::Btree,
            comment: None,
        }
    }

    /// 構成（カラムとユニーク性）が同じかどうか
    pub fn same_shape(&self, other: &IndexDefinition, case_sensitive: bool) -> bool {
        self.unique == other.unique
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(other.columns.iter())
                .all(|(a, b)| names_equal(a, b, case_sensitive))
    }
}

/// ID定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdDefinition {
    /// 主キーカラム
    pub column: String,
    /// 生成戦略
    pub strategy: IdStrategy,
    /// シーケンス名（SEQUENCE戦略）
    pub sequence_name: Option<String>,
}

/// テーブル定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDefinition {
    /// テーブル名
    pub name: String,
    /// スキーマ名
    pub schema: Option<String>,
    /// コメント
    pub comment: Option<String>,
    /// ストレージエンジン（MySQLのみ）
    pub engine: Option<String>,
    /// 文字セット（MySQLのみ）
    pub charset: Option<String>,
    /// 照合順序（MySQLのみ）
    pub collation: Option<String>,
    /// カラム（宣言順）
    pub columns: Vec<ColumnDefinition>,
    /// 明示的なインデックス
    pub indexes: Vec<IndexDefinition>,
    /// 主キー
    pub id: Option<IdDefinition>,
}

impl TableDefinition {
    /// 新しいテーブル定義を作成
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            schema: None,
            comment: None,
            engine: None,
            charset: None,
            collation: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            id: None,
        }
    }

    /// スキーマを指定
    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    /// カラムを追加
    pub fn add_column(&mut self, column: ColumnDefinition) {
        self.columns.push(column);
    }

    /// インデックスを追加
    pub fn add_index(&mut self, index: IndexDefinition) {
        self.indexes.push(index);
    }

    /// 主キーを設定
    pub fn set_id(&mut self, column: &str, strategy: IdStrategy, sequence_name: Option<String>) {
        self.id = Some(IdDefinition {
            column: column.to_string(),
            strategy,
            sequence_name,
        });
    }

    /// 名前でカラムを取得
    pub fn get_column(&self, name: &str, case_sensitive: bool) -> Option<&ColumnDefinition> {
        self.columns
            .iter()
            .find(|c| names_equal(&c.name, name, case_sensitive))
    }

    /// 主キーカラムかどうか
    pub fn is_primary_key(&self, column: &str, case_sensitive: bool) -> bool {
        self.id
            .as_ref()
            .is_some_and(|id| names_equal(&id.column, column, case_sensitive))
    }

    /// 主キー以外のカラムのユニーク制約から導出される暗黙のインデックス
    pub fn implicit_unique_indexes(&self) -> Vec<IndexDefinition> {
        self.columns
            .iter()
            .filter(|c| c.unique && !c.is_raw() && !self.is_primary_key(&c.name, false))
            .map(|c| {
                let columns = vec![c.name.clone()];
                let name = naming::auto_index_name(&self.name, &columns, true);
                IndexDefinition::new(&name, columns, true)
            })
            .collect()
    }

    /// 明示的なインデックスと暗黙のユニークインデックスを合わせた一覧
    ///
    /// 同名の明示的インデックスがある場合は暗黙のものを省きます。
    pub fn effective_indexes(&self) -> Vec<IndexDefinition> {
        let mut indexes = self.indexes.clone();
        for implicit in self.implicit_unique_indexes() {
            if !indexes
                .iter()
                .any(|i| i.name.eq_ignore_ascii_case(&implicit.name))
            {
                indexes.push(implicit);
            }
        }
        indexes
    }

    /// 名前でインデックスを取得（暗黙のインデックスを含む）
    pub fn get_index(&self, name: &str, case_sensitive: bool) -> Option<IndexDefinition> {
        self.effective_indexes()
            .into_iter()
            .find(|i| names_equal(&i.name, name, case_sensitive))
    }
}

/// 方言の大文字小文字規則に従って識別子を比較
pub fn names_equal(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}
