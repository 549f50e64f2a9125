// Routes of the storefront and the navigation seam the flows redirect through

use parking_lot::Mutex;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Register,
    Packages,
    PackageDetail(String),
    CarDetail,
    AirportTransit,
    CompanyProfile,
    Cart,
    Checkout,
    Profile,
    OrderList,
    AuthCallback,
    PaymentCallback,
    // Anything not in the route table, kept verbatim
    Other(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Packages => "/packages".to_string(),
            Route::PackageDetail(id) => format!("/package/{}", id),
            Route::CarDetail => "/car-detail".to_string(),
            Route::AirportTransit => "/airport-transit".to_string(),
            Route::CompanyProfile => "/company-profile".to_string(),
            Route::Cart => "/cart".to_string(),
            Route::Checkout => "/checkout".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::OrderList => "/order-list".to_string(),
            Route::AuthCallback => "/api/auth/callback".to_string(),
            Route::PaymentCallback => "/api/payment/callback".to_string(),
            Route::Other(path) => path.clone(),
        }
    }

    pub fn from_path(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or("");
        let trimmed = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        match trimmed {
            "" | "/" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/packages" => Route::Packages,
            "/car-detail" => Route::CarDetail,
            "/airport-transit" => Route::AirportTransit,
            "/company-profile" => Route::CompanyProfile,
            "/cart" => Route::Cart,
            "/checkout" => Route::Checkout,
            "/profile" => Route::Profile,
            "/order-list" => Route::OrderList,
            "/api/auth/callback" => Route::AuthCallback,
            "/api/payment/callback" => Route::PaymentCallback,
            other => {
                let detail = other
                    .strip_prefix("/package/")
                    .or_else(|| other.strip_prefix("/packages/"));
                match detail {
                    Some(id) if !id.is_empty() && !id.contains('/') => {
                        Route::PackageDetail(id.to_string())
                    }
                    _ => Route::Other(other.to_string()),
                }
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

// Whatever drives the UI implements this; flows never render, they only redirect.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: Route);
}

/// Navigator that records every navigation in order.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Route> {
        self.history.lock().last().cloned()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history.lock().clone()
    }

    pub fn count(&self, route: &Route) -> usize {
        self.history.lock().iter().filter(|r| *r == route).count()
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route) {
        tracing::debug!(to = %route, "navigate");
        self.history.lock().push(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("/", Route::Home)]
    #[test_case("/login", Route::Login)]
    #[test_case("/cart/", Route::Cart)]
    #[test_case("/package/42", Route::PackageDetail("42".to_string()))]
    #[test_case("/packages/7", Route::PackageDetail("7".to_string()))]
    #[test_case("/order-list?x=1", Route::OrderList)]
    #[test_case("/nowhere", Route::Other("/nowhere".to_string()))]
    fn test_from_path(path: &str, expected: Route) {
        assert_eq!(Route::from_path(path), expected);
    }

    #[test]
    fn test_path_round_trips_for_detail_route() {
        let route = Route::PackageDetail("bali-3d2n".to_string());
        assert_eq!(Route::from_path(&route.path()), route);
    }

    #[test]
    fn test_history_navigator_records_in_order() {
        let nav = HistoryNavigator::new();
        nav.navigate(Route::Cart);
        nav.navigate(Route::Checkout);
        assert_eq!(nav.current(), Some(Route::Checkout));
        assert_eq!(nav.history(), vec![Route::Cart, Route::Checkout]);
        assert_eq!(nav.count(&Route::Cart), 1);
    }
}
