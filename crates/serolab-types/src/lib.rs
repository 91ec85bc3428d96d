//! Validated primitive types shared by the serolab crates.
//!
//! These wrappers are constructed once at the edge (CLI arguments, gateway request bodies) so the
//! registration and edit workflows can rely on already-validated values.

use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not one of the recognised gender codes
    #[error("gender must be 'M' or 'F', got '{0}'")]
    InvalidGender(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Patient gender as stored by the lab backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Single-letter code used on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "M" | "m" => Ok(Gender::Male),
            "F" | "f" => Ok(Gender::Female),
            "" => Err(TextError::Empty),
            other => Err(TextError::InvalidGender(other.to_owned())),
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Jane Doe \n").expect("valid text");
        assert_eq!(text.as_str(), "Jane Doe");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn non_empty_text_deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\" \"").expect_err("blank rejected");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn gender_parses_codes() {
        assert_eq!("M".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!(" f ".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("".parse::<Gender>(), Err(TextError::Empty));
        assert!(matches!("X".parse::<Gender>(), Err(TextError::InvalidGender(g)) if g == "X"));
    }

    #[test]
    fn gender_serialises_as_code() {
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"F\"");
    }
}
