// 🥕 Food groups - hierarchical, cycle free
//
// "Vegetables" → "Root vegetables" → "Carrots"
//
// A food group only knows its parent identifier. The collection owns every
// group and is the only place a parent can change, so it can refuse
// assignments that would close a loop.

use super::data_provider::ForeignKey;
use super::translation::{Translatable, Translation};
use crate::error::{IntranetError, IntranetResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// FOOD GROUP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodGroup {
    pub identifier: Uuid,
    parent: Option<Uuid>,
    pub is_active: bool,
    foreign_keys: Vec<ForeignKey>,
    translations: Vec<Translation>,
}

impl FoodGroup {
    pub fn new(parent: Option<Uuid>) -> Self {
        FoodGroup {
            identifier: Uuid::new_v4(),
            parent,
            is_active: true,
            foreign_keys: Vec::new(),
            translations: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn add_foreign_key(&mut self, key: ForeignKey) -> IntranetResult<()> {
        if key.foreign_key_for != self.identifier {
            return Err(IntranetError::business(format!(
                "foreign key {} does not point at food group {}",
                key.identifier, self.identifier
            )));
        }
        if self.foreign_keys.iter().any(|k| k.data_provider == key.data_provider) {
            return Err(IntranetError::business(format!(
                "food group {} already has a foreign key from data provider {}",
                self.identifier, key.data_provider
            )));
        }
        self.foreign_keys.push(key);
        Ok(())
    }

    pub fn foreign_key_for(&self, data_provider: Uuid) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|k| k.data_provider == data_provider)
    }
}

impl Translatable for FoodGroup {
    fn translation_of_identifier(&self) -> Uuid {
        self.identifier
    }

    fn translations(&self) -> &[Translation] {
        &self.translations
    }

    fn translations_mut(&mut self) -> &mut Vec<Translation> {
        &mut self.translations
    }
}

// ============================================================================
// FOOD GROUP COLLECTION
// ============================================================================

/// Every known food group, insertion ordered
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodGroupCollection {
    groups: Vec<FoodGroup>,
}

impl FoodGroupCollection {
    pub fn new() -> Self {
        FoodGroupCollection { groups: Vec::new() }
    }

    /// Builds a collection from stored groups; parents are checked after all are loaded
    pub fn from_groups(groups: Vec<FoodGroup>) -> IntranetResult<Self> {
        let mut collection = FoodGroupCollection::new();
        for group in groups.iter() {
            if collection.get(group.identifier).is_some() {
                return Err(IntranetError::business(format!(
                    "food group {} appears twice",
                    group.identifier
                )));
            }
            collection.groups.push(FoodGroup {
                parent: None,
                ..group.clone()
            });
        }
        for group in groups {
            collection.set_parent(group.identifier, group.parent)?;
        }
        Ok(collection)
    }

    pub fn add(&mut self, group: FoodGroup) -> IntranetResult<()> {
        if self.get(group.identifier).is_some() {
            return Err(IntranetError::business(format!(
                "food group {} already exists",
                group.identifier
            )));
        }
        if let Some(parent) = group.parent {
            if self.get(parent).is_none() {
                return Err(IntranetError::not_found("FoodGroup", parent));
            }
        }
        self.groups.push(group);
        Ok(())
    }

    pub fn get(&self, identifier: Uuid) -> Option<&FoodGroup> {
        self.groups.iter().find(|g| g.identifier == identifier)
    }

    pub fn get_mut(&mut self, identifier: Uuid) -> Option<&mut FoodGroup> {
        self.groups.iter_mut().find(|g| g.identifier == identifier)
    }

    pub fn all(&self) -> &[FoodGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Moves a group under a new parent, refusing self-parenting and cycles
    pub fn set_parent(&mut self, child: Uuid, parent: Option<Uuid>) -> IntranetResult<()> {
        if self.get(child).is_none() {
            return Err(IntranetError::not_found("FoodGroup", child));
        }

        if let Some(parent) = parent {
            if parent == child {
                return Err(IntranetError::business(format!(
                    "food group {} cannot be its own parent",
                    child
                )));
            }
            if self.get(parent).is_none() {
                return Err(IntranetError::not_found("FoodGroup", parent));
            }
            if self.is_ancestor(child, parent) {
                return Err(IntranetError::business(format!(
                    "food group {} is a descendant of {}, the hierarchy would become circular",
                    parent, child
                )));
            }
        }

        if let Some(group) = self.get_mut(child) {
            group.parent = parent;
        }
        Ok(())
    }

    /// Removes a leaf group
    pub fn remove(&mut self, identifier: Uuid) -> IntranetResult<FoodGroup> {
        if !self.children(identifier).is_empty() {
            return Err(IntranetError::business(format!(
                "food group {} has children and cannot be removed",
                identifier
            )));
        }
        let index = self
            .groups
            .iter()
            .position(|g| g.identifier == identifier)
            .ok_or_else(|| IntranetError::not_found("FoodGroup", identifier))?;
        Ok(self.groups.remove(index))
    }

    pub fn roots(&self) -> Vec<&FoodGroup> {
        self.groups.iter().filter(|g| g.is_root()).collect()
    }

    pub fn children(&self, parent: Uuid) -> Vec<&FoodGroup> {
        self.groups
            .iter()
            .filter(|g| g.parent == Some(parent))
            .collect()
    }

    pub fn parent(&self, identifier: Uuid) -> Option<&FoodGroup> {
        self.get(identifier)
            .and_then(|g| g.parent)
            .and_then(|parent| self.get(parent))
    }

    /// Root first, the group itself last
    pub fn path(&self, identifier: Uuid) -> Vec<&FoodGroup> {
        let mut path = Vec::new();
        let mut current = self.get(identifier);

        while let Some(group) = current {
            path.insert(0, group);
            if path.len() > self.groups.len() {
                break;
            }
            current = group.parent.and_then(|parent| self.get(parent));
        }

        path
    }

    pub fn depth(&self, identifier: Uuid) -> usize {
        self.path(identifier).len().saturating_sub(1)
    }

    /// True when `ancestor` is `descendant` or lies on its parent chain
    pub fn is_ancestor(&self, ancestor: Uuid, descendant: Uuid) -> bool {
        self.path(descendant).iter().any(|g| g.identifier == ancestor)
    }

    pub fn descendants(&self, identifier: Uuid) -> Vec<&FoodGroup> {
        let mut descendants = Vec::new();
        for child in self.children(identifier) {
            descendants.push(child);
            descendants.extend(self.descendants(child.identifier));
        }
        descendants
    }

    /// Inactive if the group or any ancestor is inactive
    pub fn is_effectively_active(&self, identifier: Uuid) -> bool {
        let path = self.path(identifier);
        !path.is_empty() && path.iter().all(|g| g.is_active)
    }

    /// Drops every group that is not effectively active, returns how many went
    pub fn remove_inactive(&mut self) -> usize {
        let keep: Vec<bool> = self
            .groups
            .iter()
            .map(|g| self.is_effectively_active(g.identifier))
            .collect();
        let before = self.groups.len();
        let mut flags = keep.into_iter();
        self.groups.retain(|_| flags.next().unwrap_or(false));
        before - self.groups.len()
    }

    /// Translated names from root to the group
    pub fn translated_path(&self, identifier: Uuid, culture: &str) -> Vec<String> {
        self.path(identifier)
            .into_iter()
            .map(|g| {
                g.translated_value(culture)
                    .map(str::to_string)
                    .unwrap_or_else(|| g.identifier.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foodwaste::{DataProvider, TranslationInfo};

    fn named(parent: Option<Uuid>, name: &str) -> FoodGroup {
        let mut group = FoodGroup::new(parent);
        let info = TranslationInfo::new("en-US").unwrap();
        group
            .add_translation(Translation::new(group.identifier, info, name).unwrap())
            .unwrap();
        group
    }

    /// Vegetables → Root vegetables → Carrots, Vegetables → Cabbages, Dairy
    fn sample() -> (FoodGroupCollection, Uuid, Uuid, Uuid, Uuid, Uuid) {
        let mut collection = FoodGroupCollection::new();
        let vegetables = named(None, "Vegetables");
        let vegetables_id = vegetables.identifier;
        collection.add(vegetables).unwrap();

        let roots = named(Some(vegetables_id), "Root vegetables");
        let roots_id = roots.identifier;
        collection.add(roots).unwrap();

        let carrots = named(Some(roots_id), "Carrots");
        let carrots_id = carrots.identifier;
        collection.add(carrots).unwrap();

        let cabbages = named(Some(vegetables_id), "Cabbages");
        let cabbages_id = cabbages.identifier;
        collection.add(cabbages).unwrap();

        let dairy = named(None, "Dairy");
        let dairy_id = dairy.identifier;
        collection.add(dairy).unwrap();

        (collection, vegetables_id, roots_id, carrots_id, cabbages_id, dairy_id)
    }

    #[test]
    fn test_hierarchy_queries() {
        let (collection, vegetables, roots, carrots, _, _) = sample();

        assert_eq!(collection.len(), 5);
        assert_eq!(collection.roots().len(), 2);
        assert_eq!(collection.children(vegetables).len(), 2);
        assert_eq!(collection.parent(carrots).unwrap().identifier, roots);
        assert_eq!(collection.depth(vegetables), 0);
        assert_eq!(collection.depth(carrots), 2);
        assert_eq!(collection.descendants(vegetables).len(), 3);
        assert!(collection.is_ancestor(vegetables, carrots));
        assert!(!collection.is_ancestor(carrots, vegetables));
        assert!(collection.is_ancestor(carrots, carrots));
    }

    #[test]
    fn test_translated_path() {
        let (collection, _, _, carrots, _, _) = sample();
        assert_eq!(
            collection.translated_path(carrots, "en-US"),
            vec!["Vegetables", "Root vegetables", "Carrots"]
        );
    }

    #[test]
    fn test_add_requires_known_parent() {
        let mut collection = FoodGroupCollection::new();
        let orphan = FoodGroup::new(Some(Uuid::new_v4()));
        assert!(matches!(collection.add(orphan), Err(IntranetError::NotFound { .. })));

        let group = FoodGroup::new(None);
        collection.add(group.clone()).unwrap();
        assert!(matches!(collection.add(group), Err(IntranetError::Business(_))));
    }

    #[test]
    fn test_set_parent_rejects_self() {
        let (mut collection, vegetables, _, _, _, _) = sample();
        assert!(matches!(
            collection.set_parent(vegetables, Some(vegetables)),
            Err(IntranetError::Business(_))
        ));
    }

    #[test]
    fn test_set_parent_rejects_cycle() {
        let (mut collection, vegetables, roots, carrots, _, _) = sample();

        let result = collection.set_parent(vegetables, Some(carrots));
        assert!(matches!(result, Err(IntranetError::Business(_))));
        assert!(collection.get(vegetables).unwrap().is_root());

        let result = collection.set_parent(roots, Some(carrots));
        assert!(result.is_err());
    }

    #[test]
    fn test_set_parent_moves_subtree() {
        let (mut collection, vegetables, roots, carrots, _, dairy) = sample();

        collection.set_parent(roots, Some(dairy)).unwrap();
        assert!(collection.is_ancestor(dairy, carrots));
        assert!(!collection.is_ancestor(vegetables, carrots));

        collection.set_parent(roots, None).unwrap();
        assert_eq!(collection.roots().len(), 3);
    }

    #[test]
    fn test_from_groups_detects_cycles() {
        let mut a = FoodGroup::new(None);
        let mut b = FoodGroup::new(None);
        a.parent = Some(b.identifier);
        b.parent = Some(a.identifier);
        assert!(FoodGroupCollection::from_groups(vec![a, b]).is_err());

        let (collection, _, _, carrots, _, _) = sample();
        let reloaded = FoodGroupCollection::from_groups(collection.all().to_vec()).unwrap();
        assert_eq!(reloaded.depth(carrots), 2);
    }

    #[test]
    fn test_inactive_ancestor_deactivates_subtree() {
        let (mut collection, _, roots, carrots, cabbages, _) = sample();
        collection.get_mut(roots).unwrap().is_active = false;

        assert!(!collection.is_effectively_active(carrots));
        assert!(collection.is_effectively_active(cabbages));

        assert_eq!(collection.remove_inactive(), 2);
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_remove_only_leaves() {
        let (mut collection, vegetables, _, carrots, _, _) = sample();
        assert!(collection.remove(vegetables).is_err());
        collection.remove(carrots).unwrap();
        assert!(collection.get(carrots).is_none());
    }

    #[test]
    fn test_foreign_keys() {
        let provider = DataProvider::new("Provider", false).unwrap();
        let mut group = FoodGroup::new(None);

        let key = ForeignKey::new(&provider, group.identifier, "FoodGroup", "17").unwrap();
        group.add_foreign_key(key).unwrap();
        assert_eq!(group.foreign_key_for(provider.identifier).unwrap().foreign_key_value(), "17");

        let again = ForeignKey::new(&provider, group.identifier, "FoodGroup", "18").unwrap();
        assert!(group.add_foreign_key(again).is_err());

        let elsewhere = ForeignKey::new(&provider, Uuid::new_v4(), "FoodGroup", "19").unwrap();
        assert!(group.add_foreign_key(elsewhere).is_err());
    }
}
