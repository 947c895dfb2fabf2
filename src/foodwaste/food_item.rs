// Food items belong to one primary food group and any number of others

use super::data_provider::ForeignKey;
use super::translation::{Translatable, Translation};
use crate::error::{IntranetError, IntranetResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub identifier: Uuid,
    primary_food_group: Uuid,
    food_groups: Vec<Uuid>,
    pub is_active: bool,
    foreign_keys: Vec<ForeignKey>,
    translations: Vec<Translation>,
}

impl FoodItem {
    pub fn new(primary_food_group: Uuid) -> Self {
        FoodItem {
            identifier: Uuid::new_v4(),
            primary_food_group,
            food_groups: vec![primary_food_group],
            is_active: true,
            foreign_keys: Vec::new(),
            translations: Vec::new(),
        }
    }

    pub fn primary_food_group(&self) -> Uuid {
        self.primary_food_group
    }

    /// The primary group is always included
    pub fn food_groups(&self) -> &[Uuid] {
        &self.food_groups
    }

    pub fn belongs_to(&self, food_group: Uuid) -> bool {
        self.food_groups.contains(&food_group)
    }

    pub fn set_primary_food_group(&mut self, food_group: Uuid) {
        if !self.belongs_to(food_group) {
            self.food_groups.push(food_group);
        }
        self.primary_food_group = food_group;
    }

    pub fn add_food_group(&mut self, food_group: Uuid) -> IntranetResult<()> {
        if self.belongs_to(food_group) {
            return Err(IntranetError::business(format!(
                "food item {} already belongs to food group {}",
                self.identifier, food_group
            )));
        }
        self.food_groups.push(food_group);
        Ok(())
    }

    pub fn remove_food_group(&mut self, food_group: Uuid) -> IntranetResult<()> {
        if food_group == self.primary_food_group {
            return Err(IntranetError::business(format!(
                "food group {} is the primary food group of {}",
                food_group, self.identifier
            )));
        }
        let before = self.food_groups.len();
        self.food_groups.retain(|g| *g != food_group);
        if self.food_groups.len() == before {
            return Err(IntranetError::not_found("FoodGroup", food_group));
        }
        Ok(())
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    pub fn add_foreign_key(&mut self, key: ForeignKey) -> IntranetResult<()> {
        if key.foreign_key_for != self.identifier {
            return Err(IntranetError::business(format!(
                "foreign key {} does not point at food item {}",
                key.identifier, self.identifier
            )));
        }
        self.foreign_keys.push(key);
        Ok(())
    }
}

impl Translatable for FoodItem {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foodwaste::DataProvider;

    #[test]
    fn test_primary_group_is_member() {
        let dairy = Uuid::new_v4();
        let item = FoodItem::new(dairy);
        assert_eq!(item.primary_food_group(), dairy);
        assert_eq!(item.food_groups(), &[dairy]);
        assert!(item.is_active);
    }

    #[test]
    fn test_food_group_membership() {
        let dairy = Uuid::new_v4();
        let breakfast = Uuid::new_v4();
        let mut item = FoodItem::new(dairy);

        item.add_food_group(breakfast).unwrap();
        assert!(item.add_food_group(breakfast).is_err());
        assert!(item.belongs_to(breakfast));

        assert!(matches!(item.remove_food_group(dairy), Err(IntranetError::Business(_))));
        item.remove_food_group(breakfast).unwrap();
        assert!(matches!(
            item.remove_food_group(breakfast),
            Err(IntranetError::NotFound { .. })
        ));
    }

    #[test]
    fn test_change_primary_group() {
        let dairy = Uuid::new_v4();
        let cheese = Uuid::new_v4();
        let mut item = FoodItem::new(dairy);

        item.set_primary_food_group(cheese);
        assert_eq!(item.primary_food_group(), cheese);
        assert_eq!(item.food_groups().len(), 2);

        // The old primary group is now an ordinary membership
        item.remove_food_group(dairy).unwrap();
        assert_eq!(item.food_groups(), &[cheese]);
    }

    #[test]
    fn test_foreign_key_must_target_item() {
        let provider = DataProvider::new("Provider", false).unwrap();
        let mut item = FoodItem::new(Uuid::new_v4());

        let key = ForeignKey::new(&provider, item.identifier, "FoodItem", "A-1").unwrap();
        item.add_foreign_key(key).unwrap();

        let wrong = ForeignKey::new(&provider, Uuid::new_v4(), "FoodItem", "A-2").unwrap();
        assert!(item.add_foreign_key(wrong).is_err());
        assert_eq!(item.foreign_keys().len(), 1);
    }
}
