//! Admin app: project, default bucket and credential shared by every handle.

use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::{Environment, DEV_PROJECT_ID, DEV_STORAGE_BUCKET};
use crate::credentials::{AccessToken, Credential};
use crate::{Error, Result};

/// Subset of `FIREBASE_CONFIG` the admin app reads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirebaseConfig {
    project_id: Option<String>,
    storage_bucket: Option<String>,
}

impl FirebaseConfig {
    /// `FIREBASE_CONFIG` holds either inline JSON or a path to a JSON file.
    fn from_env(env: &Environment) -> Result<Self> {
        let Some(value) = env.get("FIREBASE_CONFIG") else {
            return Ok(Self::default());
        };

        let contents = if value.trim_start().starts_with('{') {
            value.to_string()
        } else {
            std::fs::read_to_string(value).map_err(|e| {
                Error::Config(format!("Failed to read FIREBASE_CONFIG file {}: {}", value, e))
            })?
        };

        serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Invalid FIREBASE_CONFIG: {}", e)))
    }
}

/// Authenticated connection to the backend platform.
#[derive(Debug)]
pub struct AdminApp {
    project_id: String,
    storage_bucket: Option<String>,
    credential: Credential,
    http: reqwest::Client,
    token: RwLock<Option<AccessToken>>,
}

impl AdminApp {
    /// App bound to the fixed development project; no credential material.
    pub fn initialize_emulator() -> Result<Self> {
        Self::new(
            DEV_PROJECT_ID.to_string(),
            Some(DEV_STORAGE_BUCKET.to_string()),
            Credential::Emulator,
        )
    }

    /// App built entirely from ambient configuration.
    pub fn initialize_default(env: &Environment) -> Result<Self> {
        let credential = Credential::discover(env)?;
        let firebase_config = FirebaseConfig::from_env(env)?;

        let project_id = firebase_config
            .project_id
            .or_else(|| env.get("GCLOUD_PROJECT").map(str::to_string))
            .or_else(|| env.get("GOOGLE_CLOUD_PROJECT").map(str::to_string))
            .or_else(|| credential.project_id().map(str::to_string))
            .ok_or_else(|| Error::Config("Unable to determine the project id".to_string()))?;

        Self::new(project_id, firebase_config.storage_bucket, credential)
    }

    fn new(project_id: String, storage_bucket: Option<String>, credential: Credential) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            project_id,
            storage_bucket,
            credential,
            http,
            token: RwLock::new(None),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn storage_bucket(&self) -> Option<&str> {
        self.storage_bucket.as_deref()
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Bearer token for outbound calls, minted on first use and cached.
    pub async fn access_token(&self) -> Result<String> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
                return Ok(token.token.clone());
            }
        }

        let mut cached = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.token.clone());
        }

        let token = self.credential.fetch_token(&self.http).await?;
        let value = token.token.clone();
        *cached = Some(token);

        Ok(value)
    }
}
