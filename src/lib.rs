pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod services;
pub mod utils;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use crate::api::CrmClient;
use crate::auth::{
    CredentialStore, FileStore, GuardState, HistoryNavigator, Identity, Role, RouteGuard, Session,
    SessionController,
};
use crate::config::Config;
use crate::error::AppError;
use crate::notify::Notifier;

/// Everything a command needs: one session, one backend client, one navigator.
pub struct AppContext {
    pub config: Config,
    pub client: CrmClient,
    pub navigator: Arc<HistoryNavigator>,
    pub notifier: Arc<dyn Notifier>,
    pub controller: SessionController<CrmClient>,
}

impl AppContext {
    /// File-backed credential storage at the configured path.
    pub fn new(config: Config, notifier: Arc<dyn Notifier>) -> Result<Self, AppError> {
        let store: Arc<dyn CredentialStore> = Arc::new(FileStore::new(config.storage_path.clone()));
        Self::with_store(config, store, notifier)
    }

    pub fn with_store(
        config: Config,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, AppError> {
        let client = CrmClient::with_settings(
            &config.api_url,
            store.clone(),
            Duration::from_secs(config.http_timeout_secs),
            config.circuit_failures,
            config.circuit_reset_secs,
        )?;
        let session = Arc::new(Session::new(store));
        let navigator = Arc::new(HistoryNavigator::new());
        let controller = SessionController::new(
            session,
            client.clone(),
            navigator.clone(),
            notifier.clone(),
        );
        controller.initialize();

        Ok(Self {
            config,
            client,
            navigator,
            notifier,
            controller,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        self.controller.session()
    }

    /// Run the route guard for `allowed` and return the authorized identity.
    pub async fn require(&self, allowed: &[Role]) -> Result<Identity, AppError> {
        let mut guard = RouteGuard::new(allowed, self.navigator.clone());
        let state = guard.evaluate(self.session(), Some(&self.controller)).await;
        match state {
            GuardState::Authorized => self.session().identity().ok_or(AppError::Unauthenticated),
            GuardState::Unauthorized => Err(AppError::Unauthorized),
            GuardState::Unauthenticated | GuardState::Checking => Err(AppError::Unauthenticated),
        }
    }
}
