use std::sync::Mutex;

use super::role::Role;

/// Screens the application can send a visitor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Login / registration entry screen.
    Entry,
    Unauthorized,
    /// Administrator dashboard.
    Dashboard,
    /// Public property listing for agents and users.
    Listings,
    Properties,
    Agents,
    Leads,
    Transactions,
    Profile,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Entry => "/",
            Route::Unauthorized => "/unauthorized",
            Route::Dashboard => "/welcome",
            Route::Listings => "/properties/property",
            Route::Properties => "/properties",
            Route::Agents => "/agent",
            Route::Leads => "/lead",
            Route::Transactions => "/transactions",
            Route::Profile => "/profile",
        }
    }

    /// Where a freshly signed-in visitor lands.
    pub fn landing_for(role: Option<Role>) -> Route {
        match role {
            Some(Role::Admin) => Route::Dashboard,
            Some(Role::Agent) | Some(Role::User) => Route::Listings,
            None => Route::Entry,
        }
    }

    /// Target of the profile screen's back link.
    pub fn profile_back_link(role: Option<Role>) -> Route {
        match role {
            Some(Role::Admin) => Route::Properties,
            Some(Role::Agent) | Some(Role::User) | None => Route::Listings,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Replaces the current screen. Implementations must not block.
pub trait Navigator: Send + Sync {
    fn replace(&self, route: Route);
}

/// Keeps every navigation in order; the CLI reports the last one.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn current(&self) -> Option<Route> {
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .last()
            .copied()
    }
}

impl Navigator for HistoryNavigator {
    fn replace(&self, route: Route) {
        tracing::debug!("Navigating to {}", route);
        self.history
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(route);
    }
}
