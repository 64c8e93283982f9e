use std::fmt;

use thiserror::Error;

/// Local input rejection. Display is the sentence shown to the user.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter your email address")]
    Empty,

    #[error("Please enter a valid email address")]
    Malformed,
}

/// Normalized (trimmed, lowercased) email. The canonical key for lookups and
/// inserts; only constructible through `parse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaitlistEmail(String);

impl WaitlistEmail {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim_matches(is_blank);
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }

        let normalized = trimmed.to_lowercase();
        if !is_well_formed(&normalized) {
            return Err(ValidationError::Malformed);
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for WaitlistEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WaitlistEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whitespace plus the zero-width no-break space (BOM) that pasted text
/// sometimes carries.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || c == '\u{FEFF}'
}

/// `local "@" domain "." tld`, each part non-empty, one '@', no whitespace.
fn is_well_formed(email: &str) -> bool {
    if email.chars().any(is_blank) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Any dot with at least one character on each side will do.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
