//! The local/remote configuration mode switch.

use std::env;
use std::fmt;

/// Env var that flips the whole bootstrap layer into local mode.
pub const USE_LOCAL_CONFIG: &str = "USE_LOCAL_CONFIG";

/// Where configuration and credentials come from.
///
/// Computed once at startup and passed explicitly to both the resolver and
/// the connection provider, so the two can never disagree about the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigMode {
    /// Environment-variable fallback; no AWS calls are made.
    Local,
    /// SSM parameter store plus RDS IAM auth.
    Remote,
}

impl ConfigMode {
    /// Read the mode from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the mode from an arbitrary lookup function.
    ///
    /// `"1"` and `"true"` (exact match) select [`ConfigMode::Local`]; any
    /// other value, including an unset variable, selects
    /// [`ConfigMode::Remote`].
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match get(USE_LOCAL_CONFIG).as_deref() {
            Some("1") | Some("true") => Self::Local,
            _ => Self::Remote,
        }
    }

    /// Whether this is the local fallback mode.
    pub fn is_local(self) -> bool {
        matches!(self, Self::Local)
    }
}

impl fmt::Display for ConfigMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(value: Option<&'static str>) -> impl Fn(&str) -> Option<String> {
        move |key| {
            assert_eq!(key, USE_LOCAL_CONFIG);
            value.map(str::to_string)
        }
    }

    #[test]
    fn one_and_true_select_local() {
        assert_eq!(ConfigMode::from_lookup(lookup(Some("1"))), ConfigMode::Local);
        assert_eq!(ConfigMode::from_lookup(lookup(Some("true"))), ConfigMode::Local);
    }

    #[test]
    fn anything_else_selects_remote() {
        for value in [Some("0"), Some("TRUE"), Some("yes"), Some(""), None] {
            assert_eq!(ConfigMode::from_lookup(lookup(value)), ConfigMode::Remote);
        }
    }
}
