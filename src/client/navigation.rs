use std::fmt;
use std::sync::Mutex;

/// Routes the session flow sends the user to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Landing page
    Home,
    Login,
    VerifyEmail,
    VerifyPhone,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/auth/login",
            Route::VerifyEmail => "/auth/verify-email",
            Route::VerifyPhone => "/auth/verify-phone",
        }
    }

    /// Verification route for a registration contact kind (`email` / `phone`)
    pub fn verify_for(kind: &str) -> Self {
        if kind == "phone" {
            Route::VerifyPhone
        } else {
            Route::VerifyEmail
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Router seam implemented by the hosting UI
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Logs navigation requests; for headless hosts
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!("[NAV] -> {}", route);
    }
}

/// Remembers every navigation request
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<Route> {
        self.visited
            .lock()
            .map(|visited| visited.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Route> {
        self.visited().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::Login.path(), "/auth/login");
        assert_eq!(Route::verify_for("email").path(), "/auth/verify-email");
        assert_eq!(Route::verify_for("phone").path(), "/auth/verify-phone");
    }

    #[test]
    fn test_recording_navigator() {
        let navigator = RecordingNavigator::new();
        navigator.navigate(Route::Login);
        navigator.navigate(Route::Home);
        assert_eq!(navigator.visited(), vec![Route::Login, Route::Home]);
        assert_eq!(navigator.last(), Some(Route::Home));
    }
}
