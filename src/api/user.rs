use super::RestApi;
use crate::error::ApiError;
use crate::models::{OrderRecord, ProfileUpdate, UserProfile};
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn profile(&self) -> Result<UserProfile, ApiError>;

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError>;

    async fn order_history(&self) -> Result<Vec<OrderRecord>, ApiError>;
}

#[async_trait]
impl UserApi for RestApi {
    async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.http.get("/me").await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let _: Value = self.http.put("/profile/update", update).await?;
        Ok(())
    }

    async fn order_history(&self) -> Result<Vec<OrderRecord>, ApiError> {
        let orders: Option<Vec<OrderRecord>> = self.http.get("/payment/list").await?;
        Ok(orders.unwrap_or_default())
    }
}
