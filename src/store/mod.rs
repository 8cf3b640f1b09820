use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameter document as it lives on disk. Percentage-valued fields are
/// stored as whole numbers (6.0 means 6%); conversion to fractions happens
/// at the simulation boundary in the api layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamsDocument {
    pub starting_corpus: f64,
    pub salary: f64,
    pub salary_growth_rate: f64,
    pub pre_retirement_investment_growth_rate: f64,
    pub post_retirement_investment_growth_rate: f64,
    pub inflation_rate: f64,
    pub pre_retirement_expenses: f64,
    pub post_retirement_expenses: f64,
    pub retirement_age: u32,
    pub current_age: u32,
    pub life_expectancy: u32,
    #[serde(rename = "extra_expenses_str")]
    pub extra_expenses: String,
    pub adjust_for_inflation: bool,
}

impl Default for ParamsDocument {
    fn default() -> Self {
        Self {
            starting_corpus: 10_000_000.0,
            salary: 3_000_000.0,
            salary_growth_rate: 6.0,
            pre_retirement_investment_growth_rate: 10.0,
            post_retirement_investment_growth_rate: 7.0,
            inflation_rate: 5.0,
            pre_retirement_expenses: 1_000_000.0,
            post_retirement_expenses: 1_000_000.0,
            retirement_age: 55,
            current_age: 27,
            life_expectancy: 85,
            extra_expenses: String::new(),
            adjust_for_inflation: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes the document as JSON text, appending `.json` to file names that
/// lack it. Returns the path actually written.
pub fn save_params(path: &str, document: &ParamsDocument) -> Result<PathBuf, StoreError> {
    let path = ensure_json_extension(path);
    let text = serde_json::to_string_pretty(document)?;
    fs::write(&path, text)?;
    Ok(path)
}

/// Reads a document back. An unreadable or malformed file is never an error:
/// the built-in defaults are substituted and a warning describes what
/// happened.
pub fn load_params(path: &str) -> (ParamsDocument, Option<String>) {
    match try_load(path) {
        Ok(document) => (document, None),
        Err(e) => (
            ParamsDocument::default(),
            Some(format!(
                "Could not load parameters from {path}: {e}; using defaults"
            )),
        ),
    }
}

fn try_load(path: &str) -> Result<ParamsDocument, StoreError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn ensure_json_extension(path: &str) -> PathBuf {
    if path.to_lowercase().ends_with(".json") {
        PathBuf::from(path)
    } else {
        PathBuf::from(format!("{path}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("fincast_{}_{name}", std::process::id()))
    }

    #[test]
    fn default_document_matches_reference_defaults() {
        let document = ParamsDocument::default();
        assert_eq!(document.starting_corpus, 10_000_000.0);
        assert_eq!(document.salary, 3_000_000.0);
        assert_eq!(document.salary_growth_rate, 6.0);
        assert_eq!(document.pre_retirement_investment_growth_rate, 10.0);
        assert_eq!(document.post_retirement_investment_growth_rate, 7.0);
        assert_eq!(document.inflation_rate, 5.0);
        assert_eq!(document.retirement_age, 55);
        assert_eq!(document.current_age, 27);
        assert_eq!(document.life_expectancy, 85);
        assert!(document.extra_expenses.is_empty());
        assert!(document.adjust_for_inflation);
    }

    #[test]
    fn save_appends_json_extension_and_round_trips() {
        let path = temp_path("roundtrip");
        let mut document = ParamsDocument::default();
        document.salary_growth_rate = 6.5;
        document.retirement_age = 60;
        document.extra_expenses = "40:1000000, 50:2500000".to_string();
        document.adjust_for_inflation = false;

        let written = save_params(path.to_str().unwrap(), &document).expect("save should succeed");
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some("json"));

        let (loaded, warning) = load_params(written.to_str().unwrap());
        assert!(warning.is_none());
        assert_eq!(loaded, document);

        fs::remove_file(written).expect("cleanup");
    }

    #[test]
    fn load_missing_file_degrades_to_defaults_with_warning() {
        let path = temp_path("does_not_exist.json");
        let (document, warning) = load_params(path.to_str().unwrap());
        assert_eq!(document, ParamsDocument::default());
        assert!(warning.is_some());
    }

    #[test]
    fn load_malformed_file_degrades_to_defaults_with_warning() {
        let path = temp_path("malformed.json");
        fs::write(&path, "{ not json at all").expect("write fixture");

        let (document, warning) = load_params(path.to_str().unwrap());
        assert_eq!(document, ParamsDocument::default());
        assert!(
            warning
                .as_deref()
                .is_some_and(|w| w.contains("using defaults"))
        );

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn partial_document_fills_missing_fields_with_defaults() {
        let path = temp_path("partial.json");
        fs::write(&path, r#"{"salary": 4000000.0, "retirement_age": 50}"#).expect("write fixture");

        let (document, warning) = load_params(path.to_str().unwrap());
        assert!(warning.is_none());
        assert_eq!(document.salary, 4_000_000.0);
        assert_eq!(document.retirement_age, 50);
        assert_eq!(document.current_age, 27);
        assert_eq!(document.inflation_rate, 5.0);

        fs::remove_file(path).expect("cleanup");
    }
}
