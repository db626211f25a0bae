//! Application Default Credentials discovery and access token minting.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::Environment;
use crate::{Error, Result};

const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_METADATA_HOST: &str = "metadata.google.internal";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const SCOPES: &str =
    "https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/userinfo.email";
/// Token accepted by the local emulators in place of a real bearer token.
const EMULATOR_TOKEN: &str = "owner";

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

/// Service account key file contents.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    pub private_key_id: Option<String>,
    pub project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

/// `gcloud auth application-default login` output.
#[derive(Clone, Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub quota_project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CredentialFile {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

/// Credential the admin app authenticates with.
#[derive(Clone)]
pub enum Credential {
    /// No key material; the emulators accept a fixed token.
    Emulator,
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
    /// Tokens come from the runtime's metadata server.
    MetadataServer { host: String },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Emulator => f.write_str("Emulator"),
            Credential::ServiceAccount(key) => f
                .debug_struct("ServiceAccount")
                .field("client_email", &key.client_email)
                .finish_non_exhaustive(),
            Credential::AuthorizedUser(user) => f
                .debug_struct("AuthorizedUser")
                .field("client_id", &user.client_id)
                .finish_non_exhaustive(),
            Credential::MetadataServer { host } => f
                .debug_struct("MetadataServer")
                .field("host", host)
                .finish(),
        }
    }
}

impl Credential {
    /// Discover ambient credentials.
    ///
    /// Order: `GOOGLE_APPLICATION_CREDENTIALS`, the gcloud well-known file,
    /// then the metadata server when a managed runtime is detected. An
    /// explicitly configured file that cannot be loaded is an error, not a
    /// reason to fall through.
    pub fn discover(env: &Environment) -> Result<Self> {
        if let Some(path) = env.get("GOOGLE_APPLICATION_CREDENTIALS") {
            debug!(path, "Loading credentials from GOOGLE_APPLICATION_CREDENTIALS");
            return Self::from_file(Path::new(path));
        }

        if let Some(path) = well_known_file(env).filter(|path| path.is_file()) {
            debug!(path = %path.display(), "Loading gcloud application default credentials");
            return Self::from_file(&path);
        }

        if env.on_managed_runtime() {
            let host = env
                .get("GCE_METADATA_HOST")
                .unwrap_or(DEFAULT_METADATA_HOST)
                .to_string();
            return Ok(Credential::MetadataServer { host });
        }

        Err(Error::Credentials(
            "Could not discover default credentials: set GOOGLE_APPLICATION_CREDENTIALS or run on a managed runtime".to_string(),
        ))
    }

    /// Load a service account or authorized user JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Credentials(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
            .map_err(|e| Error::Credentials(format!("Invalid credential file {}: {}", path.display(), e)))
    }

    pub fn from_json(contents: &str) -> std::result::Result<Self, serde_json::Error> {
        Ok(match serde_json::from_str(contents)? {
            CredentialFile::ServiceAccount(key) => Credential::ServiceAccount(key),
            CredentialFile::AuthorizedUser(user) => Credential::AuthorizedUser(user),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Credential::Emulator => "emulator",
            Credential::ServiceAccount(_) => "service_account",
            Credential::AuthorizedUser(_) => "authorized_user",
            Credential::MetadataServer { .. } => "metadata_server",
        }
    }

    /// Project carried by the credential itself, if any.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            Credential::ServiceAccount(key) => key.project_id.as_deref(),
            Credential::AuthorizedUser(user) => user.quota_project_id.as_deref(),
            _ => None,
        }
    }

    /// Mint a fresh access token. Performs network I/O for real credentials.
    pub(crate) async fn fetch_token(&self, http: &reqwest::Client) -> Result<AccessToken> {
        let response = match self {
            Credential::Emulator => {
                return Ok(AccessToken {
                    token: EMULATOR_TOKEN.to_string(),
                    expires_at: DateTime::<Utc>::MAX_UTC,
                })
            }
            Credential::ServiceAccount(key) => {
                let assertion = sign_assertion(key, Utc::now())?;
                http.post(&key.token_uri)
                    .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
                    .send()
                    .await?
            }
            Credential::AuthorizedUser(user) => {
                http.post(&user.token_uri)
                    .form(&[
                        ("grant_type", "refresh_token"),
                        ("client_id", user.client_id.as_str()),
                        ("client_secret", user.client_secret.as_str()),
                        ("refresh_token", user.refresh_token.as_str()),
                    ])
                    .send()
                    .await?
            }
            Credential::MetadataServer { host } => {
                let url = format!(
                    "http://{}/computeMetadata/v1/instance/service-accounts/default/token",
                    host
                );
                http.get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await?
            }
        };

        let body: TokenResponse = response.error_for_status()?.json().await?;
        if body.expires_in <= 0 {
            return Err(Error::Credentials(format!(
                "Token endpoint returned non-positive expires_in: {}",
                body.expires_in
            )));
        }
        let expires_at = Duration::try_seconds(body.expires_in)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                Error::Credentials(format!("Token lifetime out of range: {}s", body.expires_in))
            })?;

        Ok(AccessToken {
            token: body.access_token,
            expires_at,
        })
    }
}

fn well_known_file(env: &Environment) -> Option<PathBuf> {
    let dir = match env.get("CLOUDSDK_CONFIG") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env.get("HOME")?).join(".config").join("gcloud"),
    };
    Some(dir.join("application_default_credentials.json"))
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

fn sign_assertion(key: &ServiceAccountKey, now: DateTime<Utc>) -> Result<String> {
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: SCOPES,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: (now + Duration::hours(1)).timestamp(),
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();
    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;

    Ok(encode(&header, &claims, &signing_key)?)
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Bearer token with its expiry.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Tokens are refreshed a minute before they expire.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(60) < self.expires_at
    }
}
