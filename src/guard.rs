// Route guards
// Decisions are made from token presence only; the backend is the one that rejects a stale token.

use crate::navigation::{Navigator, Route};
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGuard {
    /// Only for signed-in users.
    Protected,
    /// Only for anonymous users (login, register).
    PublicOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Render,
    Redirect(Route),
}

impl RouteGuard {
    pub fn evaluate(self, session: &SessionContext) -> GuardOutcome {
        match (self, session.is_authenticated()) {
            (RouteGuard::Protected, false) => GuardOutcome::Redirect(Route::Login),
            (RouteGuard::PublicOnly, true) => GuardOutcome::Redirect(Route::Home),
            _ => GuardOutcome::Render,
        }
    }
}

pub fn guard_for(route: &Route) -> Option<RouteGuard> {
    match route {
        Route::Checkout | Route::Profile | Route::Cart | Route::OrderList => Some(RouteGuard::Protected),
        Route::Login | Route::Register => Some(RouteGuard::PublicOnly),
        _ => None,
    }
}

/// Decide whether `route` may render, redirecting through `navigator` when it may not.
pub fn enforce(route: &Route, session: &SessionContext, navigator: &dyn Navigator) -> GuardOutcome {
    let outcome = match guard_for(route) {
        Some(guard) => guard.evaluate(session),
        None => GuardOutcome::Render,
    };
    if let GuardOutcome::Redirect(target) = &outcome {
        tracing::debug!(from = %route, to = %target, "route guarded");
        navigator.navigate(target.clone());
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::HistoryNavigator;
    use crate::storage::{keys, ClientStorage, MemoryStorage};
    use std::sync::Arc;
    use test_case::test_case;

    fn session(token: Option<&str>) -> SessionContext {
        let storage = MemoryStorage::new();
        if let Some(token) = token {
            storage.set(keys::AUTH_TOKEN, token).unwrap();
        }
        SessionContext::new(Arc::new(storage))
    }

    #[test_case(RouteGuard::Protected, None, GuardOutcome::Redirect(Route::Login) ; "protected anonymous")]
    #[test_case(RouteGuard::Protected, Some("abc"), GuardOutcome::Render ; "protected signed in")]
    #[test_case(RouteGuard::PublicOnly, None, GuardOutcome::Render ; "public only anonymous")]
    #[test_case(RouteGuard::PublicOnly, Some("abc"), GuardOutcome::Redirect(Route::Home) ; "public only signed in")]
    fn test_guard_decision(guard: RouteGuard, token: Option<&str>, expected: GuardOutcome) {
        assert_eq!(guard.evaluate(&session(token)), expected);
    }

    #[test]
    fn test_empty_token_counts_as_anonymous() {
        assert_eq!(
            RouteGuard::Protected.evaluate(&session(Some(""))),
            GuardOutcome::Redirect(Route::Login)
        );
    }

    #[test_case(Route::Cart, Some(RouteGuard::Protected))]
    #[test_case(Route::Checkout, Some(RouteGuard::Protected))]
    #[test_case(Route::OrderList, Some(RouteGuard::Protected))]
    #[test_case(Route::Register, Some(RouteGuard::PublicOnly))]
    #[test_case(Route::Packages, None)]
    #[test_case(Route::PackageDetail("7".to_string()), None)]
    fn test_route_table(route: Route, expected: Option<RouteGuard>) {
        assert_eq!(guard_for(&route), expected);
    }

    #[test]
    fn test_enforce_navigates_on_redirect_only() {
        let navigator = HistoryNavigator::new();
        let anonymous = session(None);

        assert_eq!(
            enforce(&Route::Profile, &anonymous, &navigator),
            GuardOutcome::Redirect(Route::Login)
        );
        assert_eq!(enforce(&Route::Packages, &anonymous, &navigator), GuardOutcome::Render);
        assert_eq!(navigator.history(), vec![Route::Login]);
    }

    #[test]
    fn test_guard_follows_logout() {
        let ctx = session(Some("abc"));
        assert_eq!(RouteGuard::Protected.evaluate(&ctx), GuardOutcome::Render);

        ctx.end().unwrap();
        assert_eq!(
            RouteGuard::Protected.evaluate(&ctx),
            GuardOutcome::Redirect(Route::Login)
        );
    }
}
