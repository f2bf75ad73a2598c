// エンティティ記述子ファイル読み込みサービス
//
// `entities:` 配下にエンティティ記述子を並べたYAMLファイルを読み込みます。
// ディレクトリを指定した場合は直下の *.yaml / *.yml をファイル名順に読み込みます。

use crate::core::entity::EntityDescriptor;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// 記述子ファイルの構造
#[derive(Debug, Deserialize)]
struct DescriptorDocument {
    #[serde(default)]
    entities: Vec<EntityDescriptor>,
}

/// エンティティ記述子ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct DescriptorLoader;

impl DescriptorLoader {
    /// 1ファイルから記述子を読み込む
    pub fn from_file(path: &Path) -> Result<Vec<EntityDescriptor>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read descriptor file: {:?}", path))?;
        let document: DescriptorDocument = serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse descriptor file: {:?}", path))?;
        Ok(document.entities)
    }

    /// 複数のファイル・ディレクトリから記述子を読み込む
    pub fn load_all(paths: &[PathBuf]) -> Result<Vec<EntityDescriptor>> {
        let mut descriptors = Vec::new();
        for path in paths {
            for file in Self::expand(path)? {
                descriptors.extend(Self::from_file(&file)?);
            }
        }
        Ok(descriptors)
    }

    /// ディレクトリをYAMLファイルの一覧に展開
    fn expand(path: &Path) -> Result<Vec<PathBuf>> {
        if !path.is_dir() {
            return Ok(vec![path.to_path_buf()]);
        }

        let entries = std::fs::read_dir(path)
            .with_context(|| format!("Failed to read descriptor directory: {:?}", path))?;
        let mut files = Vec::new();
        for entry in entries {
            let file = entry?.path();
            let is_yaml = file
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == "yaml" || e == "yml");
            if file.is_file() && is_yaml {
                files.push(file);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const USERS: &str = r#"
entities:
  - type-name: app::domain::SysUser
    table:
      name: sys_user
    fields:
      - name: id
        type: i64
        id: {}
      - name: username
        type: String
"#;

    const ORDERS: &str = r#"
entities:
  - type-name: app::domain::Order
    table: {}
    fields:
      - name: id
        type: i64
        id: {}
"#;

    #[test]
    fn test_load_directory_in_file_name_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b_users.yaml"), USERS).unwrap();
        std::fs::write(dir.path().join("a_orders.yml"), ORDERS).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let descriptors = DescriptorLoader::load_all(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<&str> = descriptors.iter().map(|d| d.type_name.as_str()).collect();
        assert_eq!(names, vec!["app::domain::Order", "app::domain::SysUser"]);
        assert!(descriptors[1].fields[0].id.is_some());
    }

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.yaml");
        std::fs::write(&path, USERS).unwrap();

        let descriptors = DescriptorLoader::from_file(&path).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].simple_name(), "SysUser");
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "entities: [ {type-name: 1, fields: oops").unwrap();

        let error = DescriptorLoader::from_file(&path).unwrap_err();
        assert!(format!("{}", error).contains("broken.yaml"));
    }
}
