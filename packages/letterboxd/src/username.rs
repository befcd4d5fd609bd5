//! Username sanitizing.
//!
//! Usernames end up in request paths, so everything outside
//! `[A-Za-z0-9_-]` is stripped before any URL is built.

/// Error returned when nothing usable is left after sanitizing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid username {raw:?}: no characters left after sanitizing")]
pub struct InvalidUsername {
    /// The input as received.
    pub raw: String,
}

/// A sanitized, non-empty username.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    /// Strips disallowed characters from `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUsername`] if the result is empty.
    pub fn parse(raw: &str) -> Result<Self, InvalidUsername> {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();

        if cleaned.is_empty() {
            return Err(InvalidUsername {
                raw: raw.to_string(),
            });
        }

        Ok(Self(cleaned))
    }

    /// The sanitized username.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(Username::parse("bad user!").unwrap().as_str(), "baduser");
        assert_eq!(Username::parse("../etc/passwd").unwrap().as_str(), "etcpasswd");
    }

    #[test]
    fn keeps_underscore_and_dash() {
        assert_eq!(Username::parse("film_fan-42").unwrap().as_str(), "film_fan-42");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(Username::parse("josé").unwrap().as_str(), "jos");
    }

    #[test]
    fn rejects_empty_result() {
        assert!(Username::parse("").is_err());
        assert!(Username::parse("!!! ???").is_err());
    }
}
