// Client library for the tour booking storefront
// Typed REST calls plus the cart, checkout, account and route-guard flows built on them.

pub mod account;
pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod models;
pub mod navigation;
pub mod order;
pub mod session;
pub mod storage;
pub mod storefront;
pub mod validation;

// Re-export key types for convenience
pub use account::{AccountFlow, LoginForm, PaymentCallback, RegisterForm};
pub use api::{AuthApi, CartApi, CatalogApi, PaymentApi, RestApi, UserApi};
pub use cart::{ActionPhase, CartAction, CartError, CartFlow, PendingMutation};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutForm, CheckoutOutcome, CheckoutView, PaymentMethod};
pub use config::ClientConfig;
pub use error::{ApiError, ClientError, StorageError, ValidationError};
pub use guard::{GuardOutcome, RouteGuard};
pub use http::{ApiRequest, ApiResponse, Envelope, HttpClient, Method, ReqwestTransport, Transport};
pub use navigation::{HistoryNavigator, Navigator, Route};
pub use order::{DirectBooking, Order, OrderError, PendingOrderStore};
pub use session::{SessionContext, SessionSnapshot, SessionStatus, UserDisplay};
pub use storage::{ClientStorage, FileStorage, MemoryStorage};
pub use storefront::Storefront;
