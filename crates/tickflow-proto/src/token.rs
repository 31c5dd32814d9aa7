//! Session credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque credential exchanged for a [`Permission`](crate::Permission)
/// during authentication.
///
/// Tokens are minted by the store and compared for exact equality; the raw
/// value has no structure.
///
/// # Security
///
/// The `Debug` impl redacts the token value so credentials never end up in
/// logs. Keep any custom formatting of this type redacted as well.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(u128);

impl SessionToken {
    /// Wrap a raw token value.
    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// The raw token value.
    pub fn into_raw(self) -> u128 {
        self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_is_redacted() {
        let token = SessionToken::new(0xdead_beef);
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("deadbeef"));
        assert!(!rendered.contains("3735928559"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn tokens_compare_by_value() {
        assert_eq!(SessionToken::new(1), SessionToken::new(1));
        assert_ne!(SessionToken::new(1), SessionToken::new(2));
    }
}
