//! Cloud Storage handle.

use std::sync::Arc;

use crate::app::AdminApp;
use crate::config::{Environment, EnvironmentMode};
use crate::{Error, Result};

const STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// Handle to the app's default bucket, shared by all handlers.
#[derive(Debug, Clone)]
pub struct Storage {
    app: Arc<AdminApp>,
    endpoint: String,
}

impl Storage {
    pub fn for_mode(app: Arc<AdminApp>, mode: EnvironmentMode, env: &Environment) -> Self {
        let endpoint = match mode {
            EnvironmentMode::Emulator => format!("http://{}", env.storage_emulator_host()),
            EnvironmentMode::Production => STORAGE_ENDPOINT.to_string(),
        };
        Self { app, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Default bucket; an error when the app was initialized without one.
    pub fn bucket(&self) -> Result<&str> {
        self.app.storage_bucket().ok_or_else(|| {
            Error::Config("No storage bucket configured (set storageBucket in FIREBASE_CONFIG)".to_string())
        })
    }

    /// JSON API URL of an object in the default bucket.
    pub fn object_url(&self, name: &str) -> Result<String> {
        Ok(format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            self.bucket()?,
            urlencoding::encode(name)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emulator_object_url() {
        let env = Environment::from_vars([("FIREBASE_STORAGE_EMULATOR_HOST", "localhost:9199")]);
        let app = Arc::new(AdminApp::initialize_emulator().unwrap());
        let storage = Storage::for_mode(app, EnvironmentMode::Emulator, &env);

        assert_eq!(storage.bucket().unwrap(), "demo-spektif.appspot.com");
        assert_eq!(
            storage.object_url("boards/b1/cover image.png").unwrap(),
            "http://localhost:9199/storage/v1/b/demo-spektif.appspot.com/o/boards%2Fb1%2Fcover%20image.png"
        );
    }

    #[test]
    fn test_missing_bucket_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let key = dir.path().join("key.json");
        std::fs::write(
            &key,
            r#"{"type":"service_account","project_id":"p","private_key":"k","client_email":"e@p.iam.gserviceaccount.com"}"#,
        )
        .unwrap();
        let env = Environment::from_vars([("GOOGLE_APPLICATION_CREDENTIALS", key.to_string_lossy().to_string())]);
        let app = Arc::new(AdminApp::initialize_default(&env).unwrap());
        let storage = Storage::for_mode(app, EnvironmentMode::Production, &env);

        assert_eq!(storage.endpoint(), STORAGE_ENDPOINT);
        assert!(matches!(storage.bucket(), Err(Error::Config(_))));
        assert!(storage.object_url("a").is_err());
    }
}
