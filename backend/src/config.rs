//! Environment snapshot and execution mode.

use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::fmt;

/// Flag set by the local emulator suite.
pub const EMULATOR_FLAG: &str = "FUNCTIONS_EMULATOR";
/// Project used when running against the emulators.
pub const DEV_PROJECT_ID: &str = "demo-spektif";
/// Storage bucket used when running against the emulators.
pub const DEV_STORAGE_BUCKET: &str = "demo-spektif.appspot.com";
/// Named Firestore database used in production.
pub const PRODUCTION_DATABASE: &str = "spektif";
/// Port served when `PORT` is not set. Clear of the emulator suite's ports.
pub const DEFAULT_PORT: u16 = 8081;

pub const DEFAULT_FIRESTORE_EMULATOR_HOST: &str = "127.0.0.1:8080";
pub const DEFAULT_STORAGE_EMULATOR_HOST: &str = "127.0.0.1:9199";

/// Every variable the bootstrap consults. Read together in one pass.
const VARS: &[&str] = &[
    EMULATOR_FLAG,
    "FIRESTORE_EMULATOR_HOST",
    "FIREBASE_STORAGE_EMULATOR_HOST",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "CLOUDSDK_CONFIG",
    "HOME",
    "K_SERVICE",
    "FUNCTION_TARGET",
    "GCE_METADATA_HOST",
    "FIREBASE_CONFIG",
    "GCLOUD_PROJECT",
    "GOOGLE_CLOUD_PROJECT",
    "PORT",
];

/// Where the process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    /// Local emulator suite, no credentials required.
    Emulator,
    /// Deployed, ambient credentials.
    Production,
}

impl EnvironmentMode {
    /// Only the exact string `"true"` selects the emulator.
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => EnvironmentMode::Emulator,
            _ => EnvironmentMode::Production,
        }
    }

    /// The diagnostic line logged once at startup.
    pub fn banner(self) -> &'static str {
        match self {
            EnvironmentMode::Emulator => {
                "Running in emulator mode, using the default Firestore database"
            }
            EnvironmentMode::Production => {
                "Running in production mode, using the \"spektif\" Firestore database"
            }
        }
    }
}

impl fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentMode::Emulator => f.write_str("emulator"),
            EnvironmentMode::Production => f.write_str("production"),
        }
    }
}

/// Immutable snapshot of the process environment taken at startup.
///
/// The mode is resolved when the snapshot is taken and never re-read, so
/// every handle built from the same snapshot targets the same backend.
#[derive(Debug, Clone)]
pub struct Environment {
    vars: HashMap<String, String>,
    mode: EnvironmentMode,
}

impl Environment {
    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(
            VARS.iter()
                .filter_map(|key| env::var(key).ok().map(|value| (*key, value))),
        )
    }

    /// Build a snapshot from explicit key/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mode = EnvironmentMode::from_flag(vars.get(EMULATOR_FLAG).map(String::as_str));

        Self { vars, mode }
    }

    pub fn mode(&self) -> EnvironmentMode {
        self.mode
    }

    /// Value of a variable, treating empty strings as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn firestore_emulator_host(&self) -> &str {
        self.get("FIRESTORE_EMULATOR_HOST")
            .unwrap_or(DEFAULT_FIRESTORE_EMULATOR_HOST)
    }

    pub fn storage_emulator_host(&self) -> &str {
        self.get("FIREBASE_STORAGE_EMULATOR_HOST")
            .unwrap_or(DEFAULT_STORAGE_EMULATOR_HOST)
    }

    /// True when a managed Google runtime is detected.
    pub fn on_managed_runtime(&self) -> bool {
        ["K_SERVICE", "FUNCTION_TARGET", "GCE_METADATA_HOST"]
            .iter()
            .any(|key| self.get(key).is_some())
    }

    pub fn port(&self) -> u16 {
        self.get("PORT")
            .and_then(|port| port.parse().ok())
            .unwrap_or(DEFAULT_PORT)
    }
}
