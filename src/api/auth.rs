use super::RestApi;
use crate::error::ApiError;
use crate::models::{AuthResponse, Credentials, Registration};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl AuthApi for RestApi {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.http.post("/auth/login", credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.http.post("/auth/register", registration).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let _: Value = self.http.post_empty("/auth/logout").await?;
        Ok(())
    }
}
