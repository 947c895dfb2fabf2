// Data providers and the foreign keys they own

use super::translation::{Translatable, Translation};
use crate::error::IntranetResult;
use crate::validation::require_text;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External source of food data, optionally a payment handler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProvider {
    pub identifier: Uuid,
    name: String,
    pub handles_payments: bool,
    /// Translations of the data source statement point at this identifier
    pub data_source_statement_identifier: Uuid,
    translations: Vec<Translation>,
}

impl DataProvider {
    pub fn new(name: &str, handles_payments: bool) -> IntranetResult<Self> {
        Ok(DataProvider {
            identifier: Uuid::new_v4(),
            name: require_text("name", name)?,
            handles_payments,
            data_source_statement_identifier: Uuid::new_v4(),
            translations: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> IntranetResult<()> {
        self.name = require_text("name", name)?;
        Ok(())
    }
}

impl Translatable for DataProvider {
    fn translation_of_identifier(&self) -> Uuid {
        self.data_source_statement_identifier
    }

    fn translations(&self) -> &[Translation] {
        &self.translations
    }

    fn translations_mut(&mut self) -> &mut Vec<Translation> {
        &mut self.translations
    }
}

/// Key an external provider uses for one of our domain objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub identifier: Uuid,
    pub data_provider: Uuid,
    pub foreign_key_for: Uuid,
    pub foreign_key_for_type: String,
    foreign_key_value: String,
}

impl ForeignKey {
    pub fn new(
        data_provider: &DataProvider,
        foreign_key_for: Uuid,
        foreign_key_for_type: &str,
        foreign_key_value: &str,
    ) -> IntranetResult<Self> {
        Ok(ForeignKey {
            identifier: Uuid::new_v4(),
            data_provider: data_provider.identifier,
            foreign_key_for,
            foreign_key_for_type: require_text("foreign_key_for_type", foreign_key_for_type)?,
            foreign_key_value: require_text("foreign_key_value", foreign_key_value)?,
        })
    }

    pub fn foreign_key_value(&self) -> &str {
        &self.foreign_key_value
    }

    pub fn set_foreign_key_value(&mut self, value: &str) -> IntranetResult<()> {
        self.foreign_key_value = require_text("foreign_key_value", value)?;
        Ok(())
    }
}
