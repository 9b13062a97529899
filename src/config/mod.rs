//! Run configuration: Azure credentials from the environment plus the optional
//! settings file.
//!
//! Credentials are read once per run, after `.env` has been merged into the
//! process environment. Both values must be non-empty.

pub mod settings;

use std::fmt;

use crate::error::{Error, Result};

pub use settings::{Settings, SpeechSettings, VideoSettings};

/// Environment variable holding the Azure Speech subscription key.
pub const KEY_VAR: &str = "AZURE_SPEECH_KEY";
/// Environment variable holding the Azure Speech region (e.g. `eastus`).
pub const REGION_VAR: &str = "AZURE_SPEECH_REGION";

/// Azure Speech subscription key and service region.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub region: String,
}

impl Credentials {
    /// Build credentials from explicit values, rejecting empty ones.
    pub fn new(key: impl Into<String>, region: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let region = region.into();

        if key.trim().is_empty() || region.trim().is_empty() {
            return Err(Error::MissingCredentials);
        }

        Ok(Self {
            key: key.trim().to_string(),
            region: region.trim().to_string(),
        })
    }

    /// Read credentials through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match (lookup(KEY_VAR), lookup(REGION_VAR)) {
            (Some(key), Some(region)) => Self::new(key, region),
            _ => Err(Error::MissingCredentials),
        }
    }

    /// Read credentials from the process environment.
    ///
    /// Call [`load_dotenv`] first if `.env` values should be visible.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

// Never print the subscription key.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"[redacted]")
            .field("region", &self.region)
            .finish()
    }
}

/// Merge a `.env` file from the working directory into the environment.
///
/// Variables already present in the environment keep their values. A missing
/// file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn reads_both_values() {
        let creds =
            Credentials::from_lookup(lookup(&[(KEY_VAR, "abc123"), (REGION_VAR, "westeurope")]))
                .unwrap();
        assert_eq!(creds.key, "abc123");
        assert_eq!(creds.region, "westeurope");
    }

    #[test]
    fn missing_key_is_rejected() {
        let err = Credentials::from_lookup(lookup(&[(REGION_VAR, "eastus")])).unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));
    }

    #[test]
    fn missing_region_is_rejected() {
        let err = Credentials::from_lookup(lookup(&[(KEY_VAR, "abc")])).unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));
    }

    #[test]
    fn empty_values_are_rejected() {
        let err = Credentials::from_lookup(lookup(&[(KEY_VAR, ""), (REGION_VAR, "eastus")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));

        let err = Credentials::from_lookup(lookup(&[(KEY_VAR, "abc"), (REGION_VAR, "   ")]))
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredentials));
    }

    #[test]
    fn debug_output_hides_key() {
        let creds = Credentials::new("super-secret", "eastus").unwrap();
        let printed = format!("{creds:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("eastus"));
    }

    #[test]
    fn missing_credentials_message() {
        assert_eq!(
            Error::MissingCredentials.to_string(),
            "Azure Speech subscription key or region is missing in .env file."
        );
    }
}
