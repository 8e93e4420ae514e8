//! Role-based protection for restricted screens.

use std::sync::Arc;

use async_trait::async_trait;

use super::identity::Identity;
use super::navigation::{Navigator, Route};
use super::role::Role;
use super::session::Session;

/// Something able to re-fetch the identity when none is known locally.
#[async_trait]
pub trait ProfileRefresher: Send + Sync {
    async fn refresh_profile(&self) -> Option<Identity>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Unauthenticated,
    Unauthorized,
    Authorized,
}

/// What the protected screen should show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    /// Neutral loading indicator while the session resolves.
    Loading,
    /// A redirect has been dispatched; show nothing.
    Nothing,
    Content(T),
}

pub struct RouteGuard {
    allowed: Vec<Role>,
    navigator: Arc<dyn Navigator>,
    state: GuardState,
    refresh_attempted: bool,
}

impl RouteGuard {
    pub fn new(allowed: &[Role], navigator: Arc<dyn Navigator>) -> Self {
        Self {
            allowed: allowed.to_vec(),
            navigator,
            state: GuardState::Checking,
            refresh_attempted: false,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn allowed(&self) -> &[Role] {
        &self.allowed
    }

    /// Swap the allow-list; takes effect on the next [`RouteGuard::evaluate`].
    pub fn set_allowed(&mut self, allowed: &[Role]) {
        self.allowed = allowed.to_vec();
    }

    /// Unrecognised roles are never allowed.
    pub fn allows(&self, role: Option<Role>) -> bool {
        role.map_or(false, |role| self.allowed.contains(&role))
    }

    /// Recompute the guard state from the current session.
    ///
    /// With no identity, one profile refresh is attempted over the guard's
    /// lifetime. A redirect is dispatched only when the state changes into
    /// `Unauthenticated` or `Unauthorized`.
    pub async fn evaluate(
        &mut self,
        session: &Session,
        refresher: Option<&dyn ProfileRefresher>,
    ) -> GuardState {
        let snapshot = session.snapshot();
        let next = if snapshot.loading {
            GuardState::Checking
        } else {
            let identity = match &snapshot.identity {
                Some(identity) => Some(identity.clone()),
                None => match refresher {
                    Some(refresher) if !self.refresh_attempted => {
                        self.refresh_attempted = true;
                        refresher.refresh_profile().await
                    }
                    _ => None,
                },
            };
            self.classify(identity.as_ref())
        };

        self.transition(next);
        self.state
    }

    fn classify(&self, identity: Option<&Identity>) -> GuardState {
        match identity {
            None => GuardState::Unauthenticated,
            Some(identity) if self.allows(identity.role) => GuardState::Authorized,
            Some(_) => GuardState::Unauthorized,
        }
    }

    fn transition(&mut self, next: GuardState) {
        if next == self.state {
            return;
        }
        match next {
            GuardState::Unauthenticated => {
                tracing::info!("No session; redirecting to {}", Route::Entry);
                self.navigator.replace(Route::Entry);
            }
            GuardState::Unauthorized => {
                tracing::info!("Role not permitted; redirecting to {}", Route::Unauthorized);
                self.navigator.replace(Route::Unauthorized);
            }
            GuardState::Checking | GuardState::Authorized => {}
        }
        self.state = next;
    }

    /// Build the protected content only when authorized.
    pub fn render<T, F>(&self, content: F) -> Rendered<T>
    where
        F: FnOnce() -> T,
    {
        match self.state {
            GuardState::Checking => Rendered::Loading,
            GuardState::Unauthenticated | GuardState::Unauthorized => Rendered::Nothing,
            GuardState::Authorized => Rendered::Content(content()),
        }
    }
}
