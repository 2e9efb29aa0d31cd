use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

const MAX_TRAIN_NO_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Train {
    pub number: String,
    pub name: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a train.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrain {
    pub name: String,
    pub number: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

impl NewTrain {
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            number: number.into(),
            origin: None,
            destination: None,
        }
    }

    pub fn with_route(mut self, origin: impl Into<String>, destination: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self.destination = Some(destination.into());
        self
    }

    /// Trims the input and rejects anything that cannot be stored as-is.
    /// Blank route endpoints collapse to `None`.
    pub fn normalized(self) -> CoreResult<Self> {
        let number = normalize_train_no(&self.number)?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::ValidationError("Train name is required".to_string()));
        }

        Ok(Self {
            name,
            number,
            origin: blank_to_none(self.origin),
            destination: blank_to_none(self.destination),
        })
    }
}

/// Train numbers are short identifiers made of ASCII letters, digits, `-` and `_`.
pub fn normalize_train_no(raw: &str) -> CoreResult<String> {
    let number = raw.trim();
    if number.is_empty() {
        return Err(CoreError::ValidationError("Train number is required".to_string()));
    }
    if number.len() > MAX_TRAIN_NO_LEN {
        return Err(CoreError::ValidationError(format!(
            "Train number must be at most {} characters",
            MAX_TRAIN_NO_LEN
        )));
    }
    if !number.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(CoreError::ValidationError(format!("Invalid train number: {}", number)));
    }
    Ok(number.to_string())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_drops_blank_route() {
        let train = NewTrain::new("  Rajdhani Express ", " 12951 ")
            .with_route("Mumbai Central", "  ")
            .normalized()
            .unwrap();

        assert_eq!(train.number, "12951");
        assert_eq!(train.name, "Rajdhani Express");
        assert_eq!(train.origin.as_deref(), Some("Mumbai Central"));
        assert_eq!(train.destination, None);
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(normalize_train_no("").is_err());
        assert!(normalize_train_no("12 951").is_err());
        assert!(normalize_train_no("1; DROP TABLE trains").is_err());
        assert!(normalize_train_no(&"9".repeat(33)).is_err());
        assert_eq!(normalize_train_no("SF-101_a").unwrap(), "SF-101_a");
    }

    #[test]
    fn test_rejects_missing_name() {
        let err = NewTrain::new(" ", "101").normalized().unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }
}
