// Wires the session, HTTP client, API and flows together over one storage and one navigator

use crate::account::AccountFlow;
use crate::api::RestApi;
use crate::cart::CartFlow;
use crate::checkout::CheckoutFlow;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::guard::{self, GuardOutcome};
use crate::http::{HttpClient, ReqwestTransport, Transport};
use crate::navigation::{Navigator, Route};
use crate::order::PendingOrderStore;
use crate::session::SessionContext;
use crate::storage::ClientStorage;
use std::sync::Arc;

pub struct Storefront {
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    api: Arc<RestApi>,
    cart: CartFlow,
    checkout: CheckoutFlow,
    account: AccountFlow,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("session", &self.session)
            .field("cart", &self.cart)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Connect to the backend described by `config`.
    pub fn connect(
        config: ClientConfig,
        storage: Arc<dyn ClientStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::with_transport(Arc::new(transport), storage, navigator))
    }

    pub fn with_transport(
        transport: Arc<dyn Transport>,
        storage: Arc<dyn ClientStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = Arc::new(SessionContext::new(storage.clone()));
        let http = Arc::new(HttpClient::new(transport, session.clone(), navigator.clone()));
        let api = Arc::new(RestApi::new(http));
        let orders = PendingOrderStore::new(storage);

        let cart = CartFlow::new(api.clone(), orders.clone(), navigator.clone());
        let checkout = CheckoutFlow::new(api.clone(), orders, session.clone(), navigator.clone());
        let account = AccountFlow::new(
            api.clone(),
            api.clone(),
            api.clone(),
            session.clone(),
            navigator.clone(),
        );

        Self {
            session,
            navigator,
            api,
            cart,
            checkout,
            account,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn api(&self) -> &Arc<RestApi> {
        &self.api
    }

    pub fn cart(&self) -> &CartFlow {
        &self.cart
    }

    pub fn checkout(&self) -> &CheckoutFlow {
        &self.checkout
    }

    pub fn account(&self) -> &AccountFlow {
        &self.account
    }

    // Called before rendering a page
    pub fn enter(&self, route: &Route) -> GuardOutcome {
        guard::enforce(route, &self.session, self.navigator.as_ref())
    }
}
