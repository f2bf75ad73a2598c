// エンティティスキャナー
//
// レジストリから、モジュールパスと include / exclude リストに従って
// 自動メンテナンス対象のエンティティを選び出します。
//
// 優先順位: exclude > include > テーブルマーカーの auto-maintain

use crate::core::entity::EntityDescriptor;
use crate::services::entity_registry::EntityRegistry;
use tracing::debug;

/// エンティティスキャナー
#[derive(Debug, Clone)]
pub struct EntityScanner {
    registry: EntityRegistry,
}

impl EntityScanner {
    pub fn new(registry: EntityRegistry) -> Self {
        Self { registry }
    }

    /// 対象エンティティを完全修飾名順で返す
    ///
    /// # Arguments
    /// * `packages` - 対象モジュールパス（空の場合は全エンティティ）
    /// * `include` - マーカーの有無にかかわらず対象とするエンティティ
    /// * `exclude` - 対象外とするエンティティ
    pub fn scan(
        &self,
        packages: &[String],
        include: &[String],
        exclude: &[String],
    ) -> Vec<EntityDescriptor> {
        let mut candidates: Vec<EntityDescriptor> = self
            .registry
            .descriptors()
            .iter()
            .filter(|d| in_packages(d, packages))
            .filter(|d| {
                if matches_any(d, exclude) {
                    debug!(entity = %d.type_name, "Excluded by configuration");
                    return false;
                }
                matches_any(d, include) || d.is_auto_maintained()
            })
            .cloned()
            .collect();

        candidates.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        candidates.dedup_by(|a, b| a.type_name == b.type_name);
        candidates
    }
}

/// モジュールパスが対象パッケージ配下かどうか
fn in_packages(descriptor: &EntityDescriptor, packages: &[String]) -> bool {
    if packages.is_empty() {
        return true;
    }
    let module = descriptor.module_path();
    packages.iter().any(|package| {
        let package = package.trim().trim_end_matches("::");
        module == package || module.starts_with(&format!("{}::", package))
    })
}

/// 完全修飾名または単純名がリストに含まれるかどうか
fn matches_any(descriptor: &EntityDescriptor, names: &[String]) -> bool {
    names
        .iter()
        .map(|n| n.trim())
        .any(|n| n == descriptor.type_name || n == descriptor.simple_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::TableMarker;

    fn maintained(name: &str) -> EntityDescriptor {
        EntityDescriptor::new(name).with_table(TableMarker::default())
    }

    fn registry() -> EntityRegistry {
        [
            maintained("app::domain::User"),
            maintained("app::domain::billing::Invoice"),
            EntityDescriptor::new("app::domain::Unmarked"),
            EntityDescriptor::new("app::domain::Disabled").with_table(TableMarker {
                auto_maintain: false,
                ..Default::default()
            }),
            maintained("app::other::Log"),
        ]
        .into_iter()
        .collect()
    }

    fn names(descriptors: &[EntityDescriptor]) -> Vec<&str> {
        descriptors.iter().map(|d| d.type_name.as_str()).collect()
    }

    #[test]
    fn test_scan_packages_sorted() {
        let scanner = EntityScanner::new(registry());
        let result = scanner.scan(&["app::domain".to_string()], &[], &[]);
        assert_eq!(
            names(&result),
            vec!["app::domain::User", "app::domain::billing::Invoice"]
        );
    }

    #[test]
    fn test_empty_packages_scan_everything() {
        let scanner = EntityScanner::new(registry());
        let result = scanner.scan(&[], &[], &[]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_include_overrides_marker() {
        let scanner = EntityScanner::new(registry());
        let result = scanner.scan(
            &["app::domain".to_string()],
            &["Disabled".to_string(), "app::domain::Unmarked".to_string()],
            &[],
        );
        assert!(names(&result).contains(&"app::domain::Disabled"));
        assert!(names(&result).contains(&"app::domain::Unmarked"));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let scanner = EntityScanner::new(registry());
        let result = scanner.scan(&[], &["User".to_string()], &["User".to_string()]);
        assert!(!names(&result).contains(&"app::domain::User"));
    }

    #[test]
    fn test_package_prefix_is_path_aware() {
        let scanner = EntityScanner::new(registry());
        let result = scanner.scan(&["app::dom".to_string()], &[], &[]);
        assert!(result.is_empty());
    }
}
