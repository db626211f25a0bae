//! Composition root: builds every shared handle once at process start.

use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::app::AdminApp;
use crate::config::{Environment, EnvironmentMode};
use crate::db::Firestore;
use crate::http::cors_layer;
use crate::options::GlobalOptions;
use crate::storage::Storage;
use crate::Result;

/// Shared, read-only handles injected into every handler.
#[derive(Debug, Clone)]
pub struct Backend {
    mode: EnvironmentMode,
    options: GlobalOptions,
    app: Arc<AdminApp>,
    db: Firestore,
    storage: Storage,
    cors: CorsLayer,
}

impl Backend {
    /// Resolve the mode and build the admin app, database, storage and CORS
    /// layer for it. No network I/O happens here.
    ///
    /// In production a credential or project discovery failure is returned
    /// as an error; callers treat it as fatal.
    pub fn bootstrap(env: &Environment) -> Result<Self> {
        let mode = env.mode();

        let app = Arc::new(match mode {
            EnvironmentMode::Emulator => AdminApp::initialize_emulator()?,
            EnvironmentMode::Production => AdminApp::initialize_default(env)?,
        });
        let db = Firestore::for_mode(app.clone(), mode, env);
        let storage = Storage::for_mode(app.clone(), mode, env);

        info!(
            mode = %mode,
            project_id = app.project_id(),
            database = %db.database(),
            credential = app.credential().kind(),
            "{}",
            mode.banner()
        );

        Ok(Self {
            mode,
            options: GlobalOptions::default(),
            app,
            db,
            storage,
            cors: cors_layer(),
        })
    }

    pub fn mode(&self) -> EnvironmentMode {
        self.mode
    }

    pub fn options(&self) -> &GlobalOptions {
        &self.options
    }

    pub fn app(&self) -> &AdminApp {
        &self.app
    }

    pub fn db(&self) -> &Firestore {
        &self.db
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn cors(&self) -> &CorsLayer {
        &self.cors
    }
}
