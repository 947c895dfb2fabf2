// Translations for food-waste domain objects
//
// A translatable object owns one translation per culture. Lookup falls back
// from the exact culture to the language, then to the default culture, then
// to whatever translation exists.

use crate::error::{IntranetError, IntranetResult};
use crate::validation::require_text;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_CULTURE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationInfo {
    pub identifier: Uuid,
    culture_name: String,
}

impl TranslationInfo {
    pub fn new(culture_name: &str) -> IntranetResult<Self> {
        Ok(TranslationInfo {
            identifier: Uuid::new_v4(),
            culture_name: require_text("culture_name", culture_name)?,
        })
    }

    pub fn culture_name(&self) -> &str {
        &self.culture_name
    }

    /// Two-letter language part, "da" for "da-DK"
    pub fn language(&self) -> &str {
        language_of(&self.culture_name)
    }
}

fn language_of(culture: &str) -> &str {
    culture.split(['-', '_']).next().unwrap_or(culture)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub identifier: Uuid,
    translation_of: Uuid,
    info: TranslationInfo,
    value: String,
}

impl Translation {
    pub fn new(translation_of: Uuid, info: TranslationInfo, value: &str) -> IntranetResult<Self> {
        Ok(Translation {
            identifier: Uuid::new_v4(),
            translation_of,
            info,
            value: require_text("value", value)?,
        })
    }

    pub fn translation_of(&self) -> Uuid {
        self.translation_of
    }

    pub fn info(&self) -> &TranslationInfo {
        &self.info
    }

    pub fn culture_name(&self) -> &str {
        self.info.culture_name()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: &str) -> IntranetResult<()> {
        self.value = require_text("value", value)?;
        Ok(())
    }
}

pub trait Translatable {
    /// Identifier the translations must point at
    fn translation_of_identifier(&self) -> Uuid;

    fn translations(&self) -> &[Translation];

    fn translations_mut(&mut self) -> &mut Vec<Translation>;

    fn add_translation(&mut self, translation: Translation) -> IntranetResult<()> {
        if translation.translation_of() != self.translation_of_identifier() {
            return Err(IntranetError::business(format!(
                "translation {} does not belong to {}",
                translation.identifier,
                self.translation_of_identifier()
            )));
        }

        let culture = translation.culture_name().to_lowercase();
        if self
            .translations()
            .iter()
            .any(|t| t.culture_name().to_lowercase() == culture)
        {
            return Err(IntranetError::business(format!(
                "a translation for culture {} already exists",
                translation.culture_name()
            )));
        }

        self.translations_mut().push(translation);
        Ok(())
    }

    fn remove_translation(&mut self, culture: &str) -> Option<Translation> {
        let culture = culture.to_lowercase();
        let translations = self.translations_mut();
        let index = translations
            .iter()
            .position(|t| t.culture_name().to_lowercase() == culture)?;
        Some(translations.remove(index))
    }

    /// Best translation for a culture
    fn translate(&self, culture: &str) -> Option<&Translation> {
        let translations = self.translations();
        let wanted = culture.to_lowercase();
        let language = language_of(&wanted).to_string();

        translations
            .iter()
            .find(|t| t.culture_name().to_lowercase() == wanted)
            .or_else(|| {
                translations
                    .iter()
                    .find(|t| t.info().language().to_lowercase() == language)
            })
            .or_else(|| {
                translations
                    .iter()
                    .find(|t| t.culture_name().eq_ignore_ascii_case(DEFAULT_CULTURE))
            })
            .or_else(|| translations.first())
    }

    fn translated_value(&self, culture: &str) -> Option<&str> {
        self.translate(culture).map(Translation::value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Subject {
        id: Uuid,
        translations: Vec<Translation>,
    }

    impl Translatable for Subject {
        fn translation_of_identifier(&self) -> Uuid {
            self.id
        }

        fn translations(&self) -> &[Translation] {
            &self.translations
        }

        fn translations_mut(&mut self) -> &mut Vec<Translation> {
            &mut self.translations
        }
    }

    fn subject_with(cultures: &[(&str, &str)]) -> Subject {
        let mut subject = Subject {
            id: Uuid::new_v4(),
            translations: Vec::new(),
        };
        for (culture, value) in cultures {
            let info = TranslationInfo::new(culture).unwrap();
            let translation = Translation::new(subject.id, info, value).unwrap();
            subject.add_translation(translation).unwrap();
        }
        subject
    }

    #[test]
    fn test_translation_info_language() {
        let info = TranslationInfo::new("da-DK").unwrap();
        assert_eq!(info.culture_name(), "da-DK");
        assert_eq!(info.language(), "da");
        assert!(TranslationInfo::new(" ").is_err());
    }

    #[test]
    fn test_translation_rejects_blank_value() {
        let info = TranslationInfo::new("da-DK").unwrap();
        assert!(Translation::new(Uuid::new_v4(), info, "").is_err());
    }

    #[test]
    fn test_translate_exact_culture() {
        let subject = subject_with(&[("en-US", "Milk"), ("da-DK", "Mælk")]);
        assert_eq!(subject.translated_value("da-DK"), Some("Mælk"));
        assert_eq!(subject.translated_value("DA-dk"), Some("Mælk"));
    }

    #[test]
    fn test_translate_falls_back_to_language() {
        let subject = subject_with(&[("en-US", "Milk"), ("da-DK", "Mælk")]);
        assert_eq!(subject.translated_value("da"), Some("Mælk"));
        assert_eq!(subject.translated_value("en-GB"), Some("Milk"));
    }

    #[test]
    fn test_translate_falls_back_to_default_then_first() {
        let subject = subject_with(&[("da-DK", "Mælk"), ("en-US", "Milk")]);
        assert_eq!(subject.translated_value("de-DE"), Some("Milk"));

        let subject = subject_with(&[("da-DK", "Mælk")]);
        assert_eq!(subject.translated_value("de-DE"), Some("Mælk"));

        let empty = subject_with(&[]);
        assert_eq!(empty.translated_value("da-DK"), None);
    }

    #[test]
    fn test_add_translation_rules() {
        let mut subject = subject_with(&[("da-DK", "Mælk")]);

        let duplicate = Translation::new(subject.id, TranslationInfo::new("DA-DK").unwrap(), "Mælk").unwrap();
        assert!(matches!(subject.add_translation(duplicate), Err(IntranetError::Business(_))));

        let foreign = Translation::new(Uuid::new_v4(), TranslationInfo::new("en-US").unwrap(), "Milk").unwrap();
        assert!(subject.add_translation(foreign).is_err());

        assert!(subject.remove_translation("da-dk").is_some());
        assert!(subject.translations().is_empty());
    }
}
