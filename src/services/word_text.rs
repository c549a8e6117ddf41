//! Word text normalization. Two submissions are the same word only after
//! trimming and lowercasing; the normalized form must be 2-30 characters of
//! letters, digits and hyphens.

pub const MIN_WORD_LEN: usize = 2;
pub const MAX_WORD_LEN: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordTextError {
    #[error("Word must be at least {MIN_WORD_LEN} characters")]
    TooShort,
    #[error("Word must be at most {MAX_WORD_LEN} characters")]
    TooLong,
    #[error("Word must contain only letters, numbers, and hyphens")]
    InvalidCharacters,
}

pub fn normalize_word_text(raw: &str) -> Result<String, WordTextError> {
    let normalized = raw.trim().to_lowercase();

    if normalized.chars().count() < MIN_WORD_LEN {
        return Err(WordTextError::TooShort);
    }
    if normalized.chars().count() > MAX_WORD_LEN {
        return Err(WordTextError::TooLong);
    }
    if !normalized
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(WordTextError::InvalidCharacters);
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize_word_text("  Hello "), Ok("hello".to_string()));
        assert_eq!(
            normalize_word_text("WELL-KNOWN"),
            Ok("well-known".to_string())
        );
    }

    #[test]
    fn same_word_after_normalization() {
        assert_eq!(
            normalize_word_text(" Apple"),
            normalize_word_text("APPLE  ")
        );
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        assert_eq!(normalize_word_text("a"), Err(WordTextError::TooShort));
        assert_eq!(normalize_word_text("   x  "), Err(WordTextError::TooShort));
        let long = "a".repeat(31);
        assert_eq!(normalize_word_text(&long), Err(WordTextError::TooLong));
        assert!(normalize_word_text(&"a".repeat(30)).is_ok());
    }

    #[test]
    fn rejects_invalid_characters() {
        assert_eq!(
            normalize_word_text("hello world"),
            Err(WordTextError::InvalidCharacters)
        );
        assert_eq!(
            normalize_word_text("café"),
            Err(WordTextError::InvalidCharacters)
        );
        assert_eq!(
            normalize_word_text("it's"),
            Err(WordTextError::InvalidCharacters)
        );
    }
}
