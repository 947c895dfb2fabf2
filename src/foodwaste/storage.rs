// Storage types and the storages a household keeps

use super::translation::{Translatable, Translation};
use crate::error::{IntranetError, IntranetResult};
use crate::validation::{optional_text, DomainObjectValidations, Range};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const MIN_SORT_ORDER: u8 = 1;
const MAX_SORT_ORDER: u8 = 100;

fn validate_sort_order(sort_order: u8) -> IntranetResult<u8> {
    if !(MIN_SORT_ORDER..=MAX_SORT_ORDER).contains(&sort_order) {
        return Err(IntranetError::illegal(
            "sort_order",
            format!("{} is outside {}..={}", sort_order, MIN_SORT_ORDER, MAX_SORT_ORDER),
        ));
    }
    Ok(sort_order)
}

fn validate_temperature(temperature: i32, range: &Range<i32>) -> IntranetResult<i32> {
    if !DomainObjectValidations::create().in_range(temperature, range) {
        return Err(IntranetError::illegal(
            "temperature",
            format!("{} is outside {}..={}", temperature, range.start(), range.end()),
        ));
    }
    Ok(temperature)
}

// ============================================================================
// STORAGE TYPE
// ============================================================================

/// Kind of storage (refrigerator, freezer, kitchen cabinet...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageType {
    pub identifier: Uuid,
    sort_order: u8,
    temperature: i32,
    temperature_range: Range<i32>,
    pub creatable: bool,
    pub editable: bool,
    pub deletable: bool,
    translations: Vec<Translation>,
}

impl StorageType {
    pub fn new(
        sort_order: u8,
        temperature: i32,
        temperature_range: Range<i32>,
        creatable: bool,
        editable: bool,
        deletable: bool,
    ) -> IntranetResult<Self> {
        Ok(StorageType {
            identifier: Uuid::new_v4(),
            sort_order: validate_sort_order(sort_order)?,
            temperature: validate_temperature(temperature, &temperature_range)?,
            temperature_range,
            creatable,
            editable,
            deletable,
            translations: Vec::new(),
        })
    }

    pub fn sort_order(&self) -> u8 {
        self.sort_order
    }

    /// Default temperature for new storages of this type
    pub fn temperature(&self) -> i32 {
        self.temperature
    }

    pub fn temperature_range(&self) -> &Range<i32> {
        &self.temperature_range
    }
}

impl Translatable for StorageType {
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
// STORAGE
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storage {
    pub identifier: Uuid,
    household: Uuid,
    sort_order: u8,
    storage_type: Uuid,
    temperature_range: Range<i32>,
    description: Option<String>,
    temperature: i32,
    pub creation_time: DateTime<Utc>,
}

impl Storage {
    pub fn new(
        household: Uuid,
        sort_order: u8,
        storage_type: &StorageType,
        description: Option<&str>,
        temperature: i32,
    ) -> IntranetResult<Self> {
        if !storage_type.creatable {
            return Err(IntranetError::business(format!(
                "storages of type {} cannot be created",
                storage_type.identifier
            )));
        }

        Ok(Storage {
            identifier: Uuid::new_v4(),
            household,
            sort_order: validate_sort_order(sort_order)?,
            storage_type: storage_type.identifier,
            temperature_range: storage_type.temperature_range,
            description: optional_text(description),
            temperature: validate_temperature(temperature, &storage_type.temperature_range)?,
            creation_time: Utc::now(),
        })
    }

    pub fn household(&self) -> Uuid {
        self.household
    }

    pub fn sort_order(&self) -> u8 {
        self.sort_order
    }

    pub fn storage_type(&self) -> Uuid {
        self.storage_type
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = optional_text(description);
    }

    pub fn temperature(&self) -> i32 {
        self.temperature
    }

    pub fn set_temperature(&mut self, temperature: i32) -> IntranetResult<()> {
        self.temperature = validate_temperature(temperature, &self.temperature_range)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foodwaste::TranslationInfo;

    fn freezer() -> StorageType {
        StorageType::new(2, -18, Range::new(-24, -12).unwrap(), true, true, false).unwrap()
    }

    #[test]
    fn test_storage_type_validation() {
        let range = Range::new(2, 8).unwrap();
        assert!(StorageType::new(0, 5, range, true, true, true).is_err());
        assert!(StorageType::new(101, 5, range, true, true, true).is_err());
        assert!(StorageType::new(1, 20, range, true, true, true).is_err());

        let fridge = StorageType::new(1, 5, range, true, true, true).unwrap();
        assert_eq!(fridge.temperature(), 5);
        assert_eq!(fridge.temperature_range().end(), 8);
    }

    #[test]
    fn test_storage_type_translations() {
        let mut t = freezer();
        let info = TranslationInfo::new("da-DK").unwrap();
        t.add_translation(Translation::new(t.identifier, info, "Fryser").unwrap())
            .unwrap();
        assert_eq!(t.translated_value("da-DK"), Some("Fryser"));
    }

    #[test]
    fn test_storage_temperature_within_type_range() {
        let household = Uuid::new_v4();
        let t = freezer();

        let mut storage = Storage::new(household, 1, &t, Some(" Garage "), -18).unwrap();
        assert_eq!(storage.description(), Some("Garage"));
        assert_eq!(storage.storage_type(), t.identifier);

        storage.set_temperature(-24).unwrap();
        assert!(matches!(
            storage.set_temperature(0),
            Err(IntranetError::IllegalValue { field: "temperature", .. })
        ));
        assert_eq!(storage.temperature(), -24);

        assert!(Storage::new(household, 1, &t, None, 4).is_err());
        assert!(Storage::new(household, 0, &t, None, -18).is_err());
    }

    #[test]
    fn test_storage_requires_creatable_type() {
        let fixed = StorageType::new(3, 20, Range::new(10, 25).unwrap(), false, true, false).unwrap();
        assert!(matches!(
            Storage::new(Uuid::new_v4(), 1, &fixed, None, 20),
            Err(IntranetError::Business(_))
        ));
    }
}
