// エンティティレジストリ
//
// スキャン対象となるエンティティ記述子を保持します。
// `Entity` トレイト実装型の登録と、記述子ファイルからの登録の両方に対応します。

use crate::core::entity::{Entity, EntityDescriptor};

/// エンティティレジストリ
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    descriptors: Vec<EntityDescriptor>,
}

impl EntityRegistry {
    /// 空のレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// `Entity` 実装型を登録
    pub fn register<E: Entity>(&mut self) -> &mut Self {
        self.register_descriptor(E::descriptor())
    }

    /// 記述子を登録（同じ型名は置き換え）
    pub fn register_descriptor(&mut self, descriptor: EntityDescriptor) -> &mut Self {
        match self
            .descriptors
            .iter_mut()
            .find(|d| d.type_name == descriptor.type_name)
        {
            Some(existing) => *existing = descriptor,
            None => self.descriptors.push(descriptor),
        }
        self
    }

    /// 登録済みの記述子
    pub fn descriptors(&self) -> &[EntityDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl FromIterator<EntityDescriptor> for EntityRegistry {
    fn from_iter<I: IntoIterator<Item = EntityDescriptor>>(iter: I) -> Self {
        let mut registry = Self::new();
        for descriptor in iter {
            registry.register_descriptor(descriptor);
        }
        registry
    }
}
