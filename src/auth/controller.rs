//! User-initiated credential operations: login, register, logout, refresh.

use std::sync::Arc;

use async_trait::async_trait;

use super::backend::{AuthBackend, AuthResponse, LoginRequest, RegisterRequest};
use super::decoder;
use super::guard::ProfileRefresher;
use super::identity::Identity;
use super::navigation::{Navigator, Route};
use super::role::Role;
use super::session::{Session, SessionSnapshot};
use crate::api::ApiError;
use crate::error::AppError;
use crate::notify::Notifier;
use crate::validation::{LoginForm, RegistrationForm};

pub struct SessionController<B> {
    session: Arc<Session>,
    backend: B,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl<B: AuthBackend> SessionController<B> {
    pub fn new(
        session: Arc<Session>,
        backend: B,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            backend,
            navigator,
            notifier,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Startup decode of whatever credential is already stored.
    pub fn initialize(&self) -> SessionSnapshot {
        let snapshot = self.session.restore();
        match &snapshot.identity {
            Some(identity) => tracing::info!("Restored session for {}", identity.email),
            None => tracing::debug!("No stored session"),
        }
        snapshot
    }

    /// Sign in and navigate to the role's landing screen.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<Route, AppError> {
        let form = LoginForm {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        if let Err(e) = form.validate() {
            self.notifier.error("Email and password are required!");
            return Err(e.into());
        }

        let request = LoginRequest {
            email: form.email,
            password: form.password,
            role,
        };
        let response = match self.backend.login(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Login failed for {}: {}", request.email, e);
                self.notifier.error(&e.user_message("Login failed"));
                return Err(e.into());
            }
        };

        let route = self.establish(response, "Login failed")?;
        self.notifier.success("Login successful!");
        Ok(route)
    }

    /// Create an account; on success behaves like [`SessionController::login`].
    pub async fn register(&self, form: &RegistrationForm) -> Result<Route, AppError> {
        let role = match form.validate() {
            Ok(role) => role,
            Err(e) => {
                self.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let request = RegisterRequest {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
            role,
        };
        let response = match self.backend.register(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Registration failed for {}: {}", request.email, e);
                self.notifier.error(&e.user_message("Registration failed"));
                return Err(e.into());
            }
        };

        let route = self.establish(response, "Registration failed")?;
        self.notifier.success("Registration successful!");
        Ok(route)
    }

    /// Sign out locally even if the backend call fails. Safe to repeat.
    pub async fn logout(&self) -> Result<(), AppError> {
        if self.session.credential().is_some() {
            if let Err(e) = self.backend.logout().await {
                tracing::warn!("Backend logout failed, clearing local session anyway: {}", e);
            }
        }

        let cleared = self.session.clear();
        self.navigator.replace(Route::Entry);
        if let Err(e) = cleared {
            tracing::error!("Failed to purge stored credential: {}", e);
            self.notifier.error("Could not remove the stored credential");
            return Err(e.into());
        }

        tracing::info!("Signed out");
        Ok(())
    }

    /// Persist the credential, publish the identity, navigate.
    ///
    /// A response with neither a profile nor a decodable credential is a
    /// failure; nothing is stored.
    fn establish(&self, response: AuthResponse, failure: &str) -> Result<Route, AppError> {
        let from_token = response
            .token
            .as_deref()
            .and_then(|token| decoder::decode(token).ok());
        let identity = match (response.user, from_token) {
            (Some(profile), decoded) => {
                let mut identity = Identity::from(profile);
                identity.exp = decoded.and_then(|d| d.exp);
                identity
            }
            (None, Some(decoded)) => decoded,
            (None, None) => {
                tracing::warn!("{}: response carried no profile and no usable credential", failure);
                self.notifier.error(failure);
                return Err(ApiError::InvalidResponse(
                    "no user profile or usable credential".to_string(),
                )
                .into());
            }
        };

        if let Some(token) = &response.token {
            if let Err(e) = self.session.persist_credential(token) {
                self.notifier.error("Could not store the credential");
                return Err(e.into());
            }
        }

        let route = Route::landing_for(identity.role);
        tracing::info!("Signed in as {} ({:?})", identity.email, identity.role);
        self.session.set_identity(Some(identity));
        self.navigator.replace(route);
        Ok(route)
    }

    async fn fetch_profile(&self) -> Option<Identity> {
        self.session.credential()?;
        match self.backend.profile().await {
            Ok(response) => response.user.map(Identity::from),
            Err(e) => {
                tracing::warn!("Profile refresh failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl<B: AuthBackend> ProfileRefresher for SessionController<B> {
    /// Re-fetch the identity from the backend. Failures clear it.
    async fn refresh_profile(&self) -> Option<Identity> {
        self.session.begin_loading();
        let identity = self.fetch_profile().await;
        self.session.set_identity(identity.clone());
        identity
    }
}
