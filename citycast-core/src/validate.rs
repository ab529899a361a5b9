//! Input checks applied before a city name may reach the provider.

use crate::error::ValidationError;

/// Minimum number of characters (after trimming) for a search or suggestion query.
pub const MIN_QUERY_CHARS: usize = 2;

/// Validate a submitted city name.
///
/// Checks run in a fixed order: emptiness, length, then character class.
/// Letters are any Unicode alphabetic character so names like "São Paulo"
/// pass; digits and punctuation other than `-` and `'` do not.
pub fn validate_city(input: &str) -> Result<(), ValidationError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Err(ValidationError::TooShort);
    }

    if !trimmed.chars().all(is_city_char) {
        return Err(ValidationError::InvalidCharacters);
    }

    Ok(())
}

/// Looser gate used for autocomplete: only the trimmed length matters.
pub fn is_suggestible(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

fn is_city_char(c: char) -> bool {
    c.is_alphabetic() || c.is_whitespace() || c == '-' || c == '\''
}
