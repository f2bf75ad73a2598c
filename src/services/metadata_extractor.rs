// メタデータ抽出サービス
//
// エンティティ記述子から望ましいテーブル定義（TableDefinition）を構築します。
// 命名規則（スネークケース変換、接頭辞・接尾辞、既定スキーマ）は設定から受け取ります。

use crate::core::config::TableMaintenanceConfig;
use crate::core::entity::{
    ColumnMarker, EntityDescriptor, FieldDescriptor, IndexMarker, TableMarker,
};
use crate::core::error::MetadataError;
use crate::core::naming;
use crate::core::table::{
    names_equal, ColumnDefinition, IndexDefinition, LogicalType, TableDefinition,
};

/// 命名オプション
#[derive(Debug, Clone, PartialEq)]
pub struct NamingOptions {
    /// 導出テーブル名の接頭辞
    pub table_prefix: String,
    /// 導出テーブル名の接尾辞
    pub table_suffix: String,
    /// キャメルケースをスネークケースに変換するか
    pub camel_case_to_underscore: bool,
    /// 既定スキーマ
    pub default_schema: Option<String>,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            table_suffix: String::new(),
            camel_case_to_underscore: true,
            default_schema: None,
        }
    }
}

impl From<&TableMaintenanceConfig> for NamingOptions {
    fn from(config: &TableMaintenanceConfig) -> Self {
        Self {
            table_prefix: config.table_prefix.clone(),
            table_suffix: config.table_suffix.clone(),
            camel_case_to_underscore: config.camel_case_to_underscore,
            default_schema: config.default_schema.clone(),
        }
    }
}

/// メタデータ抽出サービス
#[derive(Debug, Clone, Default)]
pub struct MetadataExtractor {
    options: NamingOptions,
}

impl MetadataExtractor {
    /// 命名オプションを指定して作成
    pub fn new(options: NamingOptions) -> Self {
        Self { options }
    }

    /// エンティティ記述子からテーブル定義を抽出
    ///
    /// # Errors
    ///
    /// - 同名カラムの重複（大文字小文字を区別しない）
    /// - 複数フィールドのID指定
    /// - インデックスの不正（カラムなし、名前の重複、未知のカラム参照）
    /// - 型上書きのない未対応のフィールド型
    pub fn extract(&self, descriptor: &EntityDescriptor) -> Result<TableDefinition, MetadataError> {
        let marker = descriptor.table.clone().unwrap_or_default();
        let mut table = TableDefinition::new(&self.table_name(descriptor, &marker));
        table.schema = marker
            .schema
            .clone()
            .or_else(|| self.options.default_schema.clone());
        table.comment = marker.comment;
        table.engine = marker.engine;
        table.charset = marker.charset;
        table.collation = marker.collation;

        let persistent: Vec<&FieldDescriptor> =
            descriptor.fields.iter().filter(|f| !f.transient).collect();

        let identifiers: Vec<String> = persistent
            .iter()
            .filter(|f| f.id.is_some())
            .map(|f| f.name.clone())
            .collect();
        if identifiers.len() > 1 {
            return Err(MetadataError::MultipleIdentifiers {
                entity: descriptor.type_name.clone(),
                fields: identifiers,
            });
        }

        // フィールド名 → カラム名
        let mut field_columns: Vec<(&str, String)> = Vec::new();

        for field in persistent {
            let column = self.column(descriptor, field)?;
            if table.get_column(&column.name, false).is_some() {
                return Err(MetadataError::DuplicateColumn {
                    entity: descriptor.type_name.clone(),
                    column: column.name,
                });
            }
            if let Some(id) = &field.id {
                table.set_id(&column.name, id.strategy, id.sequence_name.clone());
            }
            field_columns.push((field.name.as_str(), column.name.clone()));
            table.add_column(column);
        }

        for marker in &descriptor.indexes {
            let index = self.index(descriptor, &table, &field_columns, marker)?;
            if table
                .indexes
                .iter()
                .any(|i| names_equal(&i.name, &index.name, false))
            {
                return Err(MetadataError::DuplicateIndex {
                    entity: descriptor.type_name.clone(),
                    index: index.name,
                });
            }
            table.add_index(index);
        }

        Ok(table)
    }

    /// テーブル名を決定（明示的な名前には接頭辞・接尾辞を付けない）
    fn table_name(&self, descriptor: &EntityDescriptor, marker: &TableMarker) -> String {
        if let Some(name) = marker.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        format!(
            "{}{}{}",
            self.options.table_prefix,
            self.derive_name(descriptor.simple_name()),
            self.options.table_suffix
        )
    }

    fn derive_name(&self, name: &str) -> String {
        if self.options.camel_case_to_underscore {
            naming::to_snake_case(name)
        } else {
            name.to_string()
        }
    }

    fn column(
        &self,
        descriptor: &EntityDescriptor,
        field: &FieldDescriptor,
    ) -> Result<ColumnDefinition, MetadataError> {
        let marker = field.column.clone().unwrap_or_default();
        let optional = is_optional(&field.field_type);

        let logical_type = match marker.column_type {
            Some(column_type) => column_type,
            None => parse_field_type(&field.field_type).ok_or_else(|| {
                MetadataError::UnsupportedFieldType {
                    entity: descriptor.type_name.clone(),
                    field: field.name.clone(),
                    field_type: field.field_type.clone(),
                }
            })?,
        };

        let name = match marker.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => name.trim().to_string(),
            None => self.derive_name(&field.name),
        };

        let mut column = apply_marker(ColumnDefinition::new(&name, logical_type), &marker);
        column.nullable = marker.nullable.unwrap_or(optional) && !column.auto_increment;

        if let Some(id) = &field.id {
            column.nullable = false;
            if id.strategy.is_generated() && logical_type.is_integer() {
                column = column.auto_increment();
            }
        }
        Ok(column)
    }

    fn index(
        &self,
        descriptor: &EntityDescriptor,
        table: &TableDefinition,
        field_columns: &[(&str, String)],
        marker: &IndexMarker,
    ) -> Result<IndexDefinition, MetadataError> {
        let label = marker.name.clone().unwrap_or_else(|| "(unnamed)".to_string());
        if marker.columns.is_empty() {
            return Err(MetadataError::EmptyIndex {
                entity: descriptor.type_name.clone(),
                index: label,
            });
        }

        let mut columns = Vec::with_capacity(marker.columns.len());
        for reference in &marker.columns {
            let reference = reference.trim();
            let by_field = field_columns
                .iter()
                .find(|(field, _)| *field == reference)
                .map(|(_, column)| column.clone());
            let resolved = by_field.or_else(|| {
                table
                    .get_column(reference, false)
                    .map(|c| c.name.clone())
            });
            match resolved {
                Some(column) => columns.push(column),
                None => {
                    return Err(MetadataError::UnknownIndexColumn {
                        entity: descriptor.type_name.clone(),
                        index: label,
                        column: reference.to_string(),
                    })
                }
            }
        }

        let name = match marker.name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => name.trim().to_string(),
            None => naming::auto_index_name(&table.name, &columns, marker.unique),
        };

        let mut index = IndexDefinition::new(&name, columns, marker.unique);
        index.index_type = marker.index_type;
        index.comment = marker.comment.clone();
        Ok(index)
    }
}

/// カラムマーカーの属性を反映
fn apply_marker(mut column: ColumnDefinition, marker: &ColumnMarker) -> ColumnDefinition {
    column.length = marker.length;
    column.precision = marker.precision;
    column.scale = marker.scale;
    column.unique = marker.unique;
    column.default_value = marker.default_value.clone();
    column.comment = marker.comment.clone();
    column.column_definition = marker
        .column_definition
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    if marker.auto_increment {
        column = column.auto_increment();
    }
    column
}

fn compact(field_type: &str) -> String {
    field_type.chars().filter(|c| !c.is_whitespace()).collect()
}

/// `Outer<Inner>` の Inner を取り出す（Outer はパス付きでもよい）
fn generic_argument<'a>(field_type: &'a str, outer: &str) -> Option<&'a str> {
    let (head, rest) = field_type.split_once('<')?;
    if naming::simple_type_name(head) != outer {
        return None;
    }
    rest.strip_suffix('>')
}

fn is_optional(field_type: &str) -> bool {
    generic_argument(&compact(field_type), "Option").is_some()
}

/// Rustのフィールド型から論理型を判定
pub fn parse_field_type(field_type: &str) -> Option<LogicalType> {
    let field_type = compact(field_type);
    parse_compact(field_type.trim_start_matches('&'))
}

fn parse_compact(field_type: &str) -> Option<LogicalType> {
    if let Some(inner) = generic_argument(field_type, "Option") {
        return parse_compact(inner);
    }
    if let Some(inner) = generic_argument(field_type, "Vec") {
        return (inner == "u8").then_some(LogicalType::Blob);
    }

    let base = field_type.split('<').next().unwrap_or(field_type);
    let logical_type = match naming::simple_type_name(base) {
        "i8" | "u8" => LogicalType::TinyInt,
        "i16" | "u16" => LogicalType::SmallInt,
        "i32" | "u32" => LogicalType::Integer,
        "i64" | "u64" | "isize" | "usize" => LogicalType::BigInt,
        "f32" => LogicalType::Float,
        "f64" => LogicalType::Double,
        "bool" => LogicalType::Boolean,
        "String" | "str" => LogicalType::Varchar,
        "char" => LogicalType::Char,
        "Decimal" | "BigDecimal" => LogicalType::Decimal,
        "NaiveDate" => LogicalType::Date,
        "NaiveTime" => LogicalType::Time,
        "NaiveDateTime" | "DateTime" | "OffsetDateTime" | "SystemTime" => LogicalType::Timestamp,
        "Uuid" => LogicalType::Uuid,
        "Value" | "JsonValue" => LogicalType::Json,
        _ => return None,
    };
    Some(logical_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::IdMarker;
    use crate::core::table::IdStrategy;

    fn sys_user() -> EntityDescriptor {
        EntityDescriptor::new("app::domain::SysUser")
            .with_table(TableMarker::default())
            .with_field(FieldDescriptor::new("id", "i64").identifier())
            .with_field(FieldDescriptor::new("userName", "String").with_column(ColumnMarker {
                length: Some(50),
                nullable: Some(false),
                unique: true,
                ..Default::default()
            }))
            .with_field(FieldDescriptor::new("nickName", "Option<String>"))
            .with_field(FieldDescriptor::new("createdAt", "chrono::NaiveDateTime"))
            .with_field(FieldDescriptor::new("cache", "HashMap<String, String>").transient())
    }

    #[test]
    fn test_extract_sys_user() {
        let table = MetadataExtractor::default().extract(&sys_user()).unwrap();

        assert_eq!(table.name, "sys_user");
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "user_name", "nick_name", "created_at"]);

        let id = &table.columns[0];
        assert_eq!(id.logical_type, LogicalType::BigInt);
        assert!(id.auto_increment);
        assert!(!id.nullable);

        let user_name = &table.columns[1];
        assert_eq!(user_name.length, Some(50));
        assert!(!user_name.nullable);
        assert!(user_name.unique);

        assert!(table.columns[2].nullable);
        assert_eq!(table.columns[3].logical_type, LogicalType::Timestamp);
        assert!(!table.columns[3].nullable);

        let id_def = table.id.unwrap();
        assert_eq!(id_def.column, "id");
        assert_eq!(id_def.strategy, IdStrategy::Auto);
    }

    #[test]
    fn test_prefix_suffix_apply_to_derived_names_only() {
        let extractor = MetadataExtractor::new(NamingOptions {
            table_prefix: "t_".to_string(),
            table_suffix: "_v1".to_string(),
            default_schema: Some("app".to_string()),
            ..Default::default()
        });

        let derived = extractor.extract(&sys_user()).unwrap();
        assert_eq!(derived.name, "t_sys_user_v1");
        assert_eq!(derived.schema.as_deref(), Some("app"));

        let explicit = EntityDescriptor::new("app::Order").with_table(TableMarker {
            name: Some("orders".to_string()),
            schema: Some("sales".to_string()),
            ..Default::default()
        });
        let table = extractor.extract(&explicit).unwrap();
        assert_eq!(table.name, "orders");
        assert_eq!(table.schema.as_deref(), Some("sales"));
    }

    #[test]
    fn test_camel_case_conversion_disabled() {
        let extractor = MetadataExtractor::new(NamingOptions {
            camel_case_to_underscore: false,
            ..Default::default()
        });
        let table = extractor.extract(&sys_user()).unwrap();
        assert_eq!(table.name, "SysUser");
        assert_eq!(table.columns[1].name, "userName");
    }

    #[test]
    fn test_index_resolves_field_and_column_names() {
        let descriptor = sys_user()
            .with_index(IndexMarker::on(&["nickName"]))
            .with_index(IndexMarker::on(&["nickName", "created_at"]).named("idx_nick_created"))
            .with_index(IndexMarker::on(&["userName"]).named("idx_login").unique());

        let table = MetadataExtractor::default().extract(&descriptor).unwrap();
        assert_eq!(table.indexes[0].name, "idx_sys_user_nick_name");
        assert_eq!(
            table.indexes[1].columns,
            vec!["nick_name".to_string(), "created_at".to_string()]
        );
        assert_eq!(table.indexes[2].name, "idx_login");
        assert!(table.indexes[2].unique);
    }

    #[test]
    fn test_unknown_index_column() {
        let descriptor = sys_user().with_index(IndexMarker::on(&["missing"]));
        let error = MetadataExtractor::default().extract(&descriptor).unwrap_err();
        assert!(error.is_unknown_index_column());
    }

    #[test]
    fn test_empty_and_duplicate_indexes() {
        let empty = sys_user().with_index(IndexMarker::default().named("idx_empty"));
        assert!(matches!(
            MetadataExtractor::default().extract(&empty),
            Err(MetadataError::EmptyIndex { .. })
        ));

        let duplicate = sys_user()
            .with_index(IndexMarker::on(&["id"]).named("idx_a"))
            .with_index(IndexMarker::on(&["user_name"]).named("IDX_A"));
        assert!(matches!(
            MetadataExtractor::default().extract(&duplicate),
            Err(MetadataError::DuplicateIndex { .. })
        ));
    }

    #[test]
    fn test_duplicate_column_is_case_insensitive() {
        let descriptor = sys_user().with_field(
            FieldDescriptor::new("login", "String").with_column(ColumnMarker {
                name: Some("USER_NAME".to_string()),
                ..Default::default()
            }),
        );
        let error = MetadataExtractor::default().extract(&descriptor).unwrap_err();
        assert!(error.is_duplicate_column());
    }

    #[test]
    fn test_multiple_identifiers() {
        let descriptor = sys_user().with_field(FieldDescriptor::new("code", "String").identifier());
        let error = MetadataExtractor::default().extract(&descriptor).unwrap_err();
        assert!(error.is_multiple_identifiers());
    }

    #[test]
    fn test_unsupported_type_requires_override() {
        let descriptor = EntityDescriptor::new("app::Doc")
            .with_table(TableMarker::default())
            .with_field(FieldDescriptor::new("tags", "HashSet<String>"));
        assert!(matches!(
            MetadataExtractor::default().extract(&descriptor),
            Err(MetadataError::UnsupportedFieldType { .. })
        ));

        let overridden = EntityDescriptor::new("app::Doc")
            .with_table(TableMarker::default())
            .with_field(FieldDescriptor::new("tags", "Option<HashSet<String>>").with_column(
                ColumnMarker {
                    column_type: Some(LogicalType::Json),
                    ..Default::default()
                },
            ));
        let table = MetadataExtractor::default().extract(&overridden).unwrap();
        assert_eq!(table.columns[0].logical_type, LogicalType::Json);
        assert!(table.columns[0].nullable);
    }

    #[test]
    fn test_sequence_identifier_keeps_sequence_name() {
        let descriptor = EntityDescriptor::new("app::Invoice")
            .with_table(TableMarker::default())
            .with_field(FieldDescriptor::new("id", "i64").with_id(IdMarker {
                strategy: IdStrategy::Sequence,
                sequence_name: Some("invoice_seq".to_string()),
            }));
        let table = MetadataExtractor::default().extract(&descriptor).unwrap();
        assert!(!table.columns[0].auto_increment);
        assert_eq!(
            table.id.and_then(|id| id.sequence_name).as_deref(),
            Some("invoice_seq")
        );
    }

    #[test]
    fn test_parse_field_type() {
        assert_eq!(parse_field_type("u8"), Some(LogicalType::TinyInt));
        assert_eq!(parse_field_type("Vec<u8>"), Some(LogicalType::Blob));
        assert_eq!(parse_field_type("Vec<String>"), None);
        assert_eq!(
            parse_field_type("chrono::DateTime<chrono::Utc>"),
            Some(LogicalType::Timestamp)
        );
        assert_eq!(
            parse_field_type("Option<rust_decimal::Decimal>"),
            Some(LogicalType::Decimal)
        );
        assert_eq!(parse_field_type("&str"), Some(LogicalType::Varchar));
        assert_eq!(parse_field_type("serde_json::Value"), Some(LogicalType::Json));
    }
}
