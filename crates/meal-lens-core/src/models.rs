//! Core data models used throughout Meal Lens.
//!
//! These types represent the analysis results that flow from the inference
//! client through normalization and caching to the caller. Everything here
//! is serde-shaped to match the inference service's structured output.

use serde::{Deserialize, Serialize};

/// Supported display languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    En,
    /// Bengali.
    Bn,
    /// Hindi.
    Hi,
    /// Assamese.
    As,
}

impl Language {
    /// Every supported language, in canonical order.
    pub const ALL: [Language; 4] = [Language::En, Language::Bn, Language::Hi, Language::As];

    /// The ISO 639-1 code used on the wire and in config.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Bn => "bn",
            Language::Hi => "hi",
            Language::As => "as",
        }
    }

    /// Parse a language code, case-insensitively.
    pub fn parse(code: &str) -> Option<Language> {
        match code.to_ascii_lowercase().as_str() {
            "en" => Some(Language::En),
            "bn" => Some(Language::Bn),
            "hi" => Some(Language::Hi),
            "as" => Some(Language::As),
            _ => None,
        }
    }
}

/// One logical piece of display text in every supported language.
///
/// A normalized value has every field non-empty (unless all were empty);
/// gaps are filled by [`LocalizedText::fill_gaps`] during normalization, so
/// downstream consumers can index any language without checking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub bn: String,
    #[serde(default)]
    pub hi: String,
    // `as` is a Rust keyword; the wire key stays "as".
    #[serde(default, rename = "as")]
    pub asm: String,
}

impl LocalizedText {
    /// Build a value with only the English text set.
    ///
    /// Models sometimes emit a bare string where a localized object is
    /// expected; the string is taken as English and the rest is filled by
    /// the fallback chain.
    pub fn from_en(text: impl Into<String>) -> Self {
        Self {
            en: text.into(),
            ..Self::default()
        }
    }

    /// The text for one language.
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Bn => &self.bn,
            Language::Hi => &self.hi,
            Language::As => &self.asm,
        }
    }

    /// Fill empty languages using the fallback chain: English first, then
    /// any present value, then the empty string.
    pub fn fill_gaps(&mut self) {
        let fallback = if !self.en.is_empty() {
            self.en.clone()
        } else {
            [&self.bn, &self.hi, &self.asm]
                .into_iter()
                .find(|text| !text.is_empty())
                .cloned()
                .unwrap_or_default()
        };

        for field in [&mut self.en, &mut self.bn, &mut self.hi, &mut self.asm] {
            if field.is_empty() {
                *field = fallback.clone();
            }
        }
    }
}

/// Tri-state verification of how nutritionally sound an item is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    Pass,
    Warning,
    Fail,
}

impl ItemStatus {
    /// Parse a status label, case-insensitively.
    pub fn parse(label: &str) -> Option<ItemStatus> {
        match label.to_ascii_uppercase().as_str() {
            "PASS" => Some(ItemStatus::Pass),
            "WARNING" => Some(ItemStatus::Warning),
            "FAIL" => Some(ItemStatus::Fail),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pass => "PASS",
            ItemStatus::Warning => "WARNING",
            ItemStatus::Fail => "FAIL",
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Warning
    }
}

/// One detected item on the plate.
///
/// Created only as part of an [`AnalysisResult`] and immutable thereafter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: LocalizedText,
    pub portion: LocalizedText,
    /// Calories in kcal; never negative after normalization.
    #[serde(default)]
    pub calories: f64,
    /// Protein in grams.
    #[serde(default)]
    pub protein: f64,
    /// Carbohydrates in grams.
    #[serde(default)]
    pub carbs: f64,
    /// Fats in grams.
    #[serde(default)]
    pub fats: f64,
    pub notes: LocalizedText,
    #[serde(default)]
    pub status: ItemStatus,
}

/// A full meal analysis — the unit of work and the unit of caching.
///
/// Raw values of this shape coming off the inference service are untrusted
/// until they have passed through [`crate::normalize`]; cached entries were
/// normalized at write time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Detected items, in presentation order.
    #[serde(default)]
    pub items: Vec<FoodItem>,
    #[serde(default)]
    pub total_calories: f64,
    #[serde(default)]
    pub total_protein: f64,
    #[serde(default)]
    pub total_carbs: f64,
    #[serde(default)]
    pub total_fats: f64,
    /// How balanced the meal is, conventionally 0–10.
    #[serde(default)]
    pub health_rating: f64,
    pub advice: LocalizedText,
}

/// Envelope stored in the result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix milliseconds at write time.
    pub timestamp: i64,
    pub data: AnalysisResult,
}

/// Activity level used for daily energy expenditure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl ActivityLevel {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::LightlyActive => 1.375,
            ActivityLevel::ModeratelyActive => 1.55,
            ActivityLevel::VeryActive => 1.725,
            ActivityLevel::ExtraActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// Profile captured by the intake form; read-only for display alongside a
/// report. Not consumed by the analysis pipeline itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub age: u32,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub activity_level: ActivityLevel,
    /// Total daily energy expenditure in kcal, as saved by the form.
    pub tdee: f64,
}

impl UserProfile {
    /// Mifflin-St Jeor daily energy expenditure, rounded to whole kcal.
    pub fn computed_tdee(&self) -> f64 {
        let bmr = 10.0 * self.weight_kg + 6.25 * self.height_cm - 5.0 * f64::from(self.age);
        let bmr = match self.gender {
            Gender::Male => bmr + 5.0,
            Gender::Female => bmr - 161.0,
        };
        (bmr * self.activity_level.multiplier()).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_round_trip() {
        for language in Language::ALL {
            assert_eq!(Language::parse(language.code()), Some(language));
        }
        assert_eq!(Language::parse("HI"), Some(Language::Hi));
        assert_eq!(Language::parse("fr"), None);
    }

    #[test]
    fn localized_text_serializes_as_wire_codes() {
        let text = LocalizedText {
            en: "Rice".into(),
            bn: "ভাত".into(),
            hi: "चावल".into(),
            asm: "ভাত".into(),
        };
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["as"], "ভাত");
        assert!(json.get("asm").is_none());
    }

    #[test]
    fn fill_gaps_prefers_english() {
        let mut text = LocalizedText::from_en("Dal");
        text.bn = "ডাল".into();
        text.fill_gaps();
        assert_eq!(text.hi, "Dal");
        assert_eq!(text.asm, "Dal");
        assert_eq!(text.bn, "ডাল");
    }

    #[test]
    fn fill_gaps_falls_back_to_any_present_value() {
        let mut text = LocalizedText {
            hi: "लूची".into(),
            ..LocalizedText::default()
        };
        text.fill_gaps();
        assert_eq!(text.en, "लूची");
        assert_eq!(text.asm, "लूची");
    }

    #[test]
    fn fill_gaps_on_fully_empty_text_stays_empty() {
        let mut text = LocalizedText::default();
        text.fill_gaps();
        assert_eq!(text, LocalizedText::default());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(ItemStatus::parse("pass"), Some(ItemStatus::Pass));
        assert_eq!(ItemStatus::parse("WARNING"), Some(ItemStatus::Warning));
        assert_eq!(ItemStatus::parse("ok"), None);
    }

    #[test]
    fn tdee_matches_mifflin_st_jeor() {
        let profile = UserProfile {
            age: 30,
            gender: Gender::Male,
            weight_kg: 65.0,
            height_cm: 170.0,
            activity_level: ActivityLevel::Sedentary,
            tdee: 0.0,
        };
        // (10*65 + 6.25*170 - 5*30 + 5) * 1.2 = 1881.0
        assert_eq!(profile.computed_tdee(), 1881.0);
    }
}
