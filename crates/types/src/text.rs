/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Minimum number of characters a query needs before suggestions are requested.
pub const MIN_SUGGESTION_CHARS: usize = 2;

/// A search query that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction,
/// so the wrapped value is exactly what gets sent as the `q` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchText(String);

impl SearchText {
    /// Creates a new `SearchText` from the given input.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(SearchText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
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

    /// Number of characters (not bytes) in the query.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether the query is long enough to be worth an autocomplete round trip.
    pub fn is_suggestible(&self) -> bool {
        self.char_len() >= MIN_SUGGESTION_CHARS
    }
}

impl std::fmt::Display for SearchText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SearchText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for SearchText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for SearchText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for SearchText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SearchText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = SearchText::new("  jvara \n").unwrap();
        assert_eq!(text.as_str(), "jvara");
    }

    #[test]
    fn rejects_blank_input() {
        assert!(matches!(SearchText::new("   "), Err(TextError::Empty)));
        assert!(matches!(SearchText::new(""), Err(TextError::Empty)));
    }

    #[test]
    fn suggestible_counts_characters_not_bytes() {
        assert!(!SearchText::new("a").unwrap().is_suggestible());
        assert!(SearchText::new("ab").unwrap().is_suggestible());
        // two Devanagari characters, six bytes
        assert!(SearchText::new("ज्").unwrap().is_suggestible());
    }

    #[test]
    fn deserialize_rejects_empty_string() {
        let err = serde_json::from_str::<SearchText>("\"  \"");
        assert!(err.is_err());
    }
}
