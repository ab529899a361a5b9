use thiserror::Error;

/// Why a submitted city name was rejected before any network access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a city name")]
    Empty,

    #[error("City name must be at least 2 characters long")]
    TooShort,

    #[error("City name contains invalid characters")]
    InvalidCharacters,
}

/// Failure of a provider call, classified for display.
///
/// The `Display` output is the user-facing reason string; the fields carry
/// diagnostics for logs. `Clone` lets one coalesced result reach every
/// waiter on the same city.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Provider answered 404 for the requested city.
    #[error("City not found. Please check the spelling and try again.")]
    NotFound { city: String },

    /// Any other non-2xx answer, or a 2xx body that could not be parsed.
    #[error("Unable to fetch weather data. Please try again.")]
    Provider { status: u16, detail: String },

    /// The request never completed (offline, DNS, timeout).
    #[error("Network error. Please check your connection and try again.")]
    Network { detail: String },
}

impl FetchError {
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}
