//! Firestore database handle.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::app::AdminApp;
use crate::config::{Environment, EnvironmentMode, PRODUCTION_DATABASE};

const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com";

/// Logical database inside the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum DatabaseId {
    /// The implicit `(default)` database.
    Default,
    Named(String),
}

impl DatabaseId {
    pub fn as_str(&self) -> &str {
        match self {
            DatabaseId::Default => "(default)",
            DatabaseId::Named(name) => name,
        }
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DatabaseId> for String {
    fn from(id: DatabaseId) -> Self {
        id.as_str().to_string()
    }
}

/// Handle to one Firestore database, shared read-only by all handlers.
#[derive(Debug, Clone)]
pub struct Firestore {
    app: Arc<AdminApp>,
    database: DatabaseId,
    endpoint: String,
}

impl Firestore {
    /// Emulator binds to the default database, production to `spektif`.
    pub fn for_mode(app: Arc<AdminApp>, mode: EnvironmentMode, env: &Environment) -> Self {
        match mode {
            EnvironmentMode::Emulator => Self {
                app,
                database: DatabaseId::Default,
                endpoint: format!("http://{}", env.firestore_emulator_host()),
            },
            EnvironmentMode::Production => Self {
                app,
                database: DatabaseId::Named(PRODUCTION_DATABASE.to_string()),
                endpoint: FIRESTORE_ENDPOINT.to_string(),
            },
        }
    }

    pub fn app(&self) -> &AdminApp {
        &self.app
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fully qualified resource name, `projects/{p}/databases/{d}`.
    pub fn database_name(&self) -> String {
        format!("projects/{}/databases/{}", self.app.project_id(), self.database)
    }

    /// REST URL of a document or collection path.
    pub fn documents_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/documents/{}",
            self.endpoint,
            self.database_name(),
            path.trim_start_matches('/')
        )
    }
}
