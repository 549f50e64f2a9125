// Checkout flow
// Loads the pending order, validates the contact and payment form, and submits the
// combined payload once per click. Persisted state is only cleared after success,
// and a confirmed booking is reported as confirmed even if that clearing fails.

use crate::api::{CheckoutPayload, PaymentApi, PaymentInfo, PersonalInfo};
use crate::error::{ApiError, ValidationError};
use crate::models::CheckoutReceipt;
use crate::navigation::{Navigator, Route};
use crate::order::{Order, OrderError, PendingOrderStore};
use crate::session::SessionContext;
use crate::validation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckoutError {
    #[error("A booking is already being submitted")]
    InFlight,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Remote(#[from] ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    CreditCard,
    Paypal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckoutForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
    pub special_requests: String,
    pub payment_method: PaymentMethod,
    pub card_number: String,
    pub card_expiry: String,
    pub card_cvc: String,
}

impl CheckoutForm {
    /// Checks the form and splits it into the two payload sections.
    pub fn validate(&self) -> Result<(PersonalInfo, PaymentInfo), ValidationError> {
        validation::require(&[
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("nationality", &self.nationality),
        ])?;
        validation::check_email(&self.email)?;

        let payment = match self.payment_method {
            PaymentMethod::CreditCard => {
                validation::check_card(&self.card_number, &self.card_expiry, &self.card_cvc)?;
                PaymentInfo::CreditCard {
                    card_number: self.card_number.chars().filter(|c| c.is_ascii_digit()).collect(),
                    card_expiry: self.card_expiry.trim().to_string(),
                    card_cvc: self.card_cvc.trim().to_string(),
                }
            }
            PaymentMethod::Paypal => PaymentInfo::Paypal,
        };

        let special_requests = self.special_requests.trim();
        let personal = PersonalInfo {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            nationality: self.nationality.trim().to_string(),
            special_requests: (!special_requests.is_empty()).then(|| special_requests.to_string()),
        };
        Ok((personal, payment))
    }
}

// What the checkout page gets on mount
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutView {
    Ready { order: Order, form: CheckoutForm },
    // No form is ever rendered without an order
    Redirected(Route),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOutcome {
    pub message: Option<String>,
    pub receipt: CheckoutReceipt,
}

impl CheckoutOutcome {
    pub fn payment_url(&self) -> Option<String> {
        self.receipt.link.as_ref().map(|link| link.replace("\\/", "/"))
    }
}

pub struct CheckoutFlow {
    api: Arc<dyn PaymentApi>,
    orders: PendingOrderStore,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    submitting: AtomicBool,
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("submitting", &self.submitting.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

// Resets the in-flight flag however submit returns
struct SubmitGuard<'a>(&'a AtomicBool);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CheckoutFlow {
    pub fn new(
        api: Arc<dyn PaymentApi>,
        orders: PendingOrderStore,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            orders,
            session,
            navigator,
            submitting: AtomicBool::new(false),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub fn mount(&self) -> CheckoutView {
        let order = match self.orders.load() {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::info!("no pending order, leaving checkout");
                self.navigator.navigate(Route::Home);
                return CheckoutView::Redirected(Route::Home);
            }
            Err(e) => {
                tracing::warn!(error = %e, "pending order unreadable, back to cart");
                self.navigator.navigate(Route::Cart);
                return CheckoutView::Redirected(Route::Cart);
            }
        };

        if let Err(e) = order.validate() {
            tracing::warn!(error = %e, "pending order invalid, back to cart");
            self.navigator.navigate(Route::Cart);
            return CheckoutView::Redirected(Route::Cart);
        }

        let mut form = CheckoutForm::default();
        if let Some(user) = self.session.user() {
            form.name = user.name;
            form.email = user.email;
        }
        CheckoutView::Ready { order, form }
    }

    /// Submit the booking. Validation failures never reach the network.
    pub async fn submit(&self, order: &Order, form: &CheckoutForm) -> Result<CheckoutOutcome, CheckoutError> {
        if self
            .submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CheckoutError::InFlight);
        }
        let _guard = SubmitGuard(&self.submitting);

        order.validate()?;
        let (personal_info, payment_info) = form.validate()?;
        let payload = CheckoutPayload {
            order: order.clone(),
            total_amount: order.total(),
            personal_info,
            payment_info,
        };

        let envelope = self.api.process_checkout(&payload).await.map_err(|e| {
            tracing::warn!(error = %e, "checkout failed, pending order kept");
            e
        })?;

        tracing::info!(order_id = ?envelope.data.order_id, "booking confirmed");
        // Logged only: the booking already exists on the server
        if let Err(e) = self.orders.clear() {
            tracing::error!(error = %e, "booking confirmed but pending order could not be cleared");
        }

        let outcome = CheckoutOutcome {
            message: envelope.message,
            receipt: envelope.data,
        };
        // Without a gateway link the booking is done; show it in the order list
        if outcome.payment_url().is_none() {
            self.navigator.navigate(Route::OrderList);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RestApi;
    use crate::http::mock_backend::Reply;
    use crate::http::test_support::{failing_remove_harness, logged_in_harness, Harness};
    use crate::http::Method;
    use crate::models::{BookingDetails, CartItem};
    use crate::session::UserDisplay;
    use crate::storage::{keys, ClientStorage};
    use serde_json::json;
    use std::time::Duration;

    fn flow(h: &Harness) -> Arc<CheckoutFlow> {
        Arc::new(CheckoutFlow::new(
            Arc::new(RestApi::new(h.http.clone())),
            PendingOrderStore::new(h.session.storage().clone()),
            h.session.clone(),
            h.navigator.clone(),
        ))
    }

    fn cart_order() -> Order {
        Order::from_cart(vec![CartItem {
            id: "a".to_string(),
            item_id: Some("10".to_string()),
            title: "Ubud Day Tour".to_string(),
            price: 50.0,
            quantity: 2,
            booking: BookingDetails::TourPackage {
                tour_date: chrono::NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            },
        }])
        .unwrap()
    }

    fn filled_form() -> CheckoutForm {
        CheckoutForm {
            name: "Made Wirawan".to_string(),
            email: "made@example.com".to_string(),
            phone: "+62 812 0000".to_string(),
            nationality: "Indonesian".to_string(),
            payment_method: PaymentMethod::CreditCard,
            card_number: "4111 1111 1111 1111".to_string(),
            card_expiry: "12/29".to_string(),
            card_cvc: "123".to_string(),
            ..CheckoutForm::default()
        }
    }

    fn persist(h: &Harness, order: &Order) {
        let store = PendingOrderStore::new(h.session.storage().clone());
        store.save(order).unwrap();
        store.save_cart_mirror(&[]).unwrap();
    }

    #[tokio::test]
    async fn test_mount_without_order_redirects_home() {
        let h = logged_in_harness();
        let checkout = flow(&h);

        assert_eq!(checkout.mount(), CheckoutView::Redirected(Route::Home));
        assert_eq!(h.navigator.current(), Some(Route::Home));
    }

    #[tokio::test]
    async fn test_mount_with_corrupt_order_redirects_to_cart() {
        let h = logged_in_harness();
        h.storage.set(keys::CURRENT_ORDER, "{oops").unwrap();

        assert_eq!(flow(&h).mount(), CheckoutView::Redirected(Route::Cart));
    }

    #[tokio::test]
    async fn test_mount_prefills_cached_user() {
        let h = logged_in_harness();
        h.session
            .update_user(&UserDisplay {
                name: "Made".to_string(),
                email: "made@example.com".to_string(),
            })
            .unwrap();
        persist(&h, &cart_order());

        match flow(&h).mount() {
            CheckoutView::Ready { order, form } => {
                assert_eq!(order.total(), 100.0);
                assert_eq!(form.name, "Made");
                assert_eq!(form.email, "made@example.com");
                assert_eq!(form.payment_method, PaymentMethod::CreditCard);
            }
            other => panic!("expected form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_card_number_blocks_submit_without_request() {
        let h = logged_in_harness();
        let checkout = flow(&h);
        let form = CheckoutForm {
            card_number: String::new(),
            ..filled_form()
        };

        let err = checkout.submit(&cart_order(), &form).await.unwrap_err();

        assert_eq!(err, CheckoutError::Validation(ValidationError::MissingCardDetails));
        assert_eq!(h.backend.request_count(), 0);
        assert!(!checkout.is_submitting());
    }

    #[tokio::test]
    async fn test_missing_contact_fields_block_submit() {
        let h = logged_in_harness();
        let form = CheckoutForm {
            phone: String::new(),
            email: "not-an-email".to_string(),
            ..filled_form()
        };

        let err = flow(&h).submit(&cart_order(), &form).await.unwrap_err();
        assert_eq!(
            err,
            CheckoutError::Validation(ValidationError::MissingFields(vec!["phone"]))
        );

        let form = CheckoutForm {
            email: "not-an-email".to_string(),
            ..filled_form()
        };
        let err = flow(&h).submit(&cart_order(), &form).await.unwrap_err();
        assert_eq!(err, CheckoutError::Validation(ValidationError::InvalidEmail));
        assert_eq!(h.backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_paypal_needs_no_card() {
        let h = logged_in_harness();
        h.backend.ok(
            Method::Post,
            "/checkout/process",
            json!({ "status": 200, "message": "Booking Confirmed", "data": { "order_id": 77 } }),
        );
        let form = CheckoutForm {
            payment_method: PaymentMethod::Paypal,
            card_number: String::new(),
            card_expiry: String::new(),
            card_cvc: String::new(),
            ..filled_form()
        };

        let outcome = flow(&h).submit(&cart_order(), &form).await.unwrap();

        assert_eq!(outcome.receipt.order_id.as_deref(), Some("77"));
        let body = h.backend.requests()[0].body.clone().unwrap();
        assert_eq!(body["paymentInfo"], json!({ "method": "paypal" }));
    }

    #[tokio::test]
    async fn test_success_clears_pending_order_and_mirror() {
        let h = logged_in_harness();
        let order = cart_order();
        persist(&h, &order);
        h.backend.ok(
            Method::Post,
            "/checkout/process",
            json!({ "status": 200, "message": "Your journey details have been sent to your email.", "data": {} }),
        );

        let outcome = flow(&h).submit(&order, &filled_form()).await.unwrap();

        assert_eq!(
            outcome.message.as_deref(),
            Some("Your journey details have been sent to your email.")
        );
        assert!(h.storage.get(keys::CURRENT_ORDER).is_none());
        assert!(h.storage.get(keys::CART_ITEMS).is_none());
        assert_eq!(h.navigator.current(), Some(Route::OrderList));

        let body = h.backend.requests()[0].body.clone().unwrap();
        assert_eq!(body["order"]["kind"], "cart");
        assert_eq!(body["totalAmount"], json!(100.0));
        assert_eq!(body["personalInfo"]["name"], "Made Wirawan");
        assert_eq!(body["paymentInfo"]["cardNumber"], "4111111111111111");
    }

    #[tokio::test]
    async fn test_success_with_payment_link_returns_url() {
        let h = logged_in_harness();
        let order = cart_order();
        persist(&h, &order);
        h.backend.ok(
            Method::Post,
            "/checkout/process",
            json!({ "data": { "link": "https:\\/\\/pay.example.com\\/inv\\/9" }, "message": "ok" }),
        );

        let outcome = flow(&h).submit(&order, &filled_form()).await.unwrap();

        assert_eq!(outcome.payment_url().as_deref(), Some("https://pay.example.com/inv/9"));
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_booking_survives_storage_failure() {
        let h = failing_remove_harness(&[keys::CART_ITEMS]);
        let order = cart_order();
        persist(&h, &order);
        h.backend.ok(
            Method::Post,
            "/checkout/process",
            json!({ "status": 200, "message": "Booking Confirmed", "data": { "order_id": 77 } }),
        );

        let outcome = flow(&h).submit(&order, &filled_form()).await.unwrap();

        assert_eq!(outcome.receipt.order_id.as_deref(), Some("77"));
        assert_eq!(h.navigator.current(), Some(Route::OrderList));
        // The other key is still cleared
        assert!(h.storage.get(keys::CURRENT_ORDER).is_none());
        assert_eq!(h.backend.count(Method::Post, "/checkout/process"), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_persisted_state() {
        let h = logged_in_harness();
        let order = cart_order();
        persist(&h, &order);
        h.backend
            .fail(Method::Post, "/checkout/process", 422, "Tour date is fully booked");

        let err = flow(&h).submit(&order, &filled_form()).await.unwrap_err();

        assert_eq!(
            err,
            CheckoutError::Remote(ApiError::Api {
                status: 422,
                message: "Tour date is fully booked".to_string()
            })
        );
        assert!(h.storage.get(keys::CURRENT_ORDER).is_some());
        assert!(h.storage.get(keys::CART_ITEMS).is_some());
    }

    #[tokio::test]
    async fn test_double_submit_sends_one_request() {
        let h = logged_in_harness();
        let order = cart_order();
        persist(&h, &order);
        h.backend.set_delay(Duration::from_millis(20));
        h.backend.enqueue(
            Method::Post,
            "/checkout/process",
            Reply::Json(200, json!({ "data": {}, "message": "ok" })),
        );
        let checkout = flow(&h);
        let form = filled_form();

        let (first, second) = tokio::join!(checkout.submit(&order, &form), checkout.submit(&order, &form));

        assert!(first.is_ok());
        assert_eq!(second.unwrap_err(), CheckoutError::InFlight);
        assert_eq!(h.backend.count(Method::Post, "/checkout/process"), 1);
        assert!(!checkout.is_submitting());
    }
}
