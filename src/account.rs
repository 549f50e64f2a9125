// Account flows: sign in/up/out, the two redirect callbacks, profile and order history

use crate::api::{AuthApi, PaymentApi, UserApi};
use crate::error::ApiError;
use crate::models::{AuthResponse, Credentials, OrderRecord, ProfileUpdate, Registration, UserProfile};
use crate::navigation::{Navigator, Route};
use crate::session::{SessionContext, UserDisplay};
use crate::validation;
use serde_json::json;
use std::sync::Arc;

const FALLBACK_DISPLAY_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Query parameters the payment gateway sends back with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentCallback {
    pub message: Option<String>,
    pub successful: Option<String>,
}

impl PaymentCallback {
    pub fn succeeded(&self) -> bool {
        matches!(self.successful.as_deref(), Some("true") | Some("1"))
    }
}

pub struct AccountFlow {
    auth: Arc<dyn AuthApi>,
    users: Arc<dyn UserApi>,
    payments: Arc<dyn PaymentApi>,
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for AccountFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountFlow")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl AccountFlow {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        users: Arc<dyn UserApi>,
        payments: Arc<dyn PaymentApi>,
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            auth,
            users,
            payments,
            session,
            navigator,
        }
    }

    pub async fn login(&self, form: &LoginForm) -> Result<UserDisplay, ApiError> {
        validation::require(&[("email", &form.email), ("password", &form.password)])?;
        validation::check_email(&form.email)?;
        validation::check_password(&form.password)?;

        let credentials = Credentials {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let response = self.auth.login(&credentials).await?;
        self.sign_in(response, None, &credentials.email)
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<UserDisplay, ApiError> {
        validation::require(&[
            ("name", &form.name),
            ("email", &form.email),
            ("password", &form.password),
        ])?;
        validation::check_email(&form.email)?;
        validation::check_password(&form.password)?;

        let registration = Registration {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        let response = self.auth.register(&registration).await?;
        self.sign_in(response, Some(&registration.name), &registration.email)
    }

    fn sign_in(
        &self,
        response: AuthResponse,
        entered_name: Option<&str>,
        entered_email: &str,
    ) -> Result<UserDisplay, ApiError> {
        let email = response
            .user
            .email
            .filter(|email| !email.is_empty())
            .unwrap_or_else(|| entered_email.to_string());
        let name = response
            .user
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| entered_name.map(str::to_string))
            .unwrap_or_else(|| email.clone());
        let user = UserDisplay { name, email };

        self.session.establish(&response.token, Some(user.clone()))?;

        let target = match self.session.take_redirect()? {
            Some(path) => match Route::from_path(&path) {
                Route::Login | Route::Register => Route::Home,
                route => route,
            },
            None => Route::Home,
        };
        tracing::info!(to = %target, "signed in");
        self.navigator.navigate(target);
        Ok(user)
    }

    /// Remember where to return after login, then send the user to the login page.
    pub fn require_login(&self, return_to: &Route) -> Result<(), ApiError> {
        self.session.remember_redirect(&return_to.path())?;
        self.navigator.navigate(Route::Login);
        Ok(())
    }

    pub fn remember_redirect(&self, return_to: &Route) -> Result<(), ApiError> {
        self.session.remember_redirect(&return_to.path())?;
        Ok(())
    }

    // The local session is cleared even when the backend call fails
    pub async fn logout(&self) -> Result<(), ApiError> {
        let remote = self.auth.logout().await;
        if let Err(e) = &remote {
            tracing::warn!(error = %e, "logout request failed, clearing local session anyway");
        }
        self.session.end()?;
        self.navigator.navigate(Route::Home);
        remote
    }

    pub fn handle_oauth_callback(&self, url: &str) -> Result<bool, ApiError> {
        let token = query_param(url, "token").filter(|token| !token.is_empty());
        match token {
            Some(token) => {
                self.session.establish(&token, None)?;
                self.navigator.navigate(Route::Home);
                Ok(true)
            }
            None => {
                tracing::warn!("oauth callback without token");
                self.navigator.navigate(Route::Login);
                Ok(false)
            }
        }
    }

    pub fn handle_payment_callback(&self, url: &str) -> Option<PaymentCallback> {
        let callback = PaymentCallback {
            message: query_param(url, "message"),
            successful: query_param(url, "successful"),
        };
        if callback.message.is_none() && callback.successful.is_none() {
            return None;
        }
        tracing::info!(successful = callback.succeeded(), "payment callback received");
        self.navigator.navigate(Route::OrderList);
        Some(callback)
    }

    /// Fetch the profile and refresh the cached display fields from it.
    pub async fn load_profile(&self) -> Result<UserProfile, ApiError> {
        let profile = self.users.profile().await?;
        let display = UserDisplay {
            name: profile
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string()),
            email: profile.email.clone().unwrap_or_default(),
        };
        self.session.update_user(&display)?;
        Ok(profile)
    }

    pub async fn update_profile(&self, username: &str, phone: Option<&str>) -> Result<(), ApiError> {
        validation::require(&[("username", username)])?;
        let update = ProfileUpdate {
            username: username.trim().to_string(),
            phone: phone.map(str::to_string),
        };
        self.users.update_profile(&update).await?;

        let email = self.session.user().map(|user| user.email).unwrap_or_default();
        self.session.update_user(&UserDisplay {
            name: update.username,
            email,
        })?;
        Ok(())
    }

    pub async fn order_history(&self) -> Result<Vec<OrderRecord>, ApiError> {
        self.users.order_history().await
    }

    /// Ask the gateway for a payment page for an unpaid order.
    pub async fn request_payment_link(&self, order_id: &str) -> Result<String, ApiError> {
        let link = self.payments.create_payment_intent(order_id, json!({})).await?;
        Ok(link.url())
    }
}

fn query_param(url: &str, name: &str) -> Option<String> {
    let without_fragment = url.split('#').next().unwrap_or("");
    let (_, query) = without_fragment.split_once('?')?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
