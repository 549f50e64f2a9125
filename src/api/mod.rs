// Domain API modules: one per backend resource, each call is exactly one request.
// Errors are always propagated; an empty result and a failed request never look alike.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod payment;
pub mod user;

pub use auth::AuthApi;
pub use cart::CartApi;
pub use catalog::CatalogApi;
pub use payment::{CheckoutPayload, PaymentApi, PaymentInfo, PersonalInfo};
pub use user::UserApi;

use crate::http::HttpClient;
use std::sync::Arc;

/// REST implementation of every API trait over the shared [`HttpClient`].
#[derive(Debug, Clone)]
pub struct RestApi {
    http: Arc<HttpClient>,
}

impl RestApi {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }
}

// Escape an id before splicing it into a path
pub(crate) fn segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes()).collect()
}
