//! Password string with automatic zeroization
//!
//! Provides [`SecretString`], used for every password the service hands out.
//! The value is only reachable inside a closure and is wiped on drop.

use serde::Serialize;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Secret string with automatic memory zeroization
///
/// # Examples
///
/// ```
/// use dbauth_credential::SecretString;
///
/// let password = SecretString::new("s3cr3t");
/// assert_eq!(password.expose_secret(|value| value.len()), 6);
/// assert_eq!(format!("{password:?}"), "[REDACTED]");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self { inner: s.into() }
    }

    /// Accesses the secret value within a closure scope
    pub fn expose_secret<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&str) -> R,
    {
        f(&self.inner)
    }

    /// Constant-time comparison with another secret
    pub fn matches(&self, other: &SecretString) -> bool {
        self.inner.as_bytes().ct_eq(other.inner.as_bytes()).into()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// Serialized output goes to logs and CLI JSON; never the plaintext.
impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expose_secret_gives_closure_access() {
        let secret = SecretString::new("my_secret");
        let upper = secret.expose_secret(str::to_uppercase);
        assert_eq!(upper, "MY_SECRET");
    }

    #[test]
    fn matches_compares_contents() {
        let a = SecretString::new("pw-1");
        assert!(a.matches(&SecretString::new("pw-1")));
        assert!(!a.matches(&SecretString::new("pw-2")));
        assert!(!a.matches(&SecretString::new("pw-10")));
    }

    #[test]
    fn debug_and_display_are_redacted() {
        let secret = SecretString::new("super_secret_password");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn serialize_is_redacted() {
        let json = serde_json::to_string(&SecretString::new("should_be_redacted")).unwrap();
        assert_eq!(json, "\"[REDACTED]\"");
    }

    #[test]
    fn len_and_is_empty() {
        assert_eq!(SecretString::new("12345").len(), 5);
        assert!(SecretString::new("").is_empty());
    }
}
