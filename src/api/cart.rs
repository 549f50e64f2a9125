use super::{segment, RestApi};
use crate::error::ApiError;
use crate::models::{AddToCartRequest, CartItem};
use async_trait::async_trait;
use serde_json::{json, Value};

#[async_trait]
pub trait CartApi: Send + Sync {
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError>;

    // Returns whatever the backend echoes for the new line
    async fn add_item(&self, item: &AddToCartRequest) -> Result<Value, ApiError>;

    async fn update_quantity(&self, item_id: &str, quantity: u32) -> Result<(), ApiError>;

    async fn remove_item(&self, item_id: &str) -> Result<(), ApiError>;

    async fn clear(&self) -> Result<(), ApiError>;
}

#[async_trait]
impl CartApi for RestApi {
    async fn fetch_cart(&self) -> Result<Vec<CartItem>, ApiError> {
        let items: Option<Vec<CartItem>> = self.http.get("/cart").await?;
        Ok(items.unwrap_or_default())
    }

    async fn add_item(&self, item: &AddToCartRequest) -> Result<Value, ApiError> {
        self.http.post("/cart/add", item).await
    }

    async fn update_quantity(&self, item_id: &str, quantity: u32) -> Result<(), ApiError> {
        let _: Value = self
            .http
            .put(&format!("/cart/{}", segment(item_id)), &json!({ "quantity": quantity }))
            .await?;
        Ok(())
    }

    async fn remove_item(&self, item_id: &str) -> Result<(), ApiError> {
        let _: Value = self
            .http
            .delete(&format!("/cart/{}", segment(item_id)))
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), ApiError> {
        let _: Value = self.http.delete("/cart/clear").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::logged_in_harness;
    use crate::http::Method;
    use crate::models::BookingDetails;

    #[tokio::test]
    async fn test_fetch_cart_treats_null_as_empty() {
        let h = logged_in_harness();
        h.backend.ok(
            Method::Get,
            "/cart",
            json!({ "status": 200, "message": "Cart is empty", "data": null }),
        );
        let api = RestApi::new(h.http.clone());

        assert!(api.fetch_cart().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_quantity_puts_quantity_body() {
        let h = logged_in_harness();
        h.backend
            .ok(Method::Put, "/cart/12", json!({ "message": "Cart updated" }));
        let api = RestApi::new(h.http.clone());

        api.update_quantity("12", 3).await.unwrap();

        let sent = h.backend.requests();
        assert_eq!(sent[0].body, Some(json!({ "quantity": 3 })));
        assert_eq!(sent[0].bearer.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_add_item_posts_flat_body() {
        let h = logged_in_harness();
        h.backend.ok(Method::Post, "/cart/add", json!({ "id": 99 }));
        let api = RestApi::new(h.http.clone());

        let request = AddToCartRequest {
            item_id: "4".to_string(),
            quantity: 1,
            booking: BookingDetails::CarRental {
                start_date: chrono::NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
                end_date: chrono::NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
            },
        };
        let echoed = api.add_item(&request).await.unwrap();

        assert_eq!(echoed, json!({ "id": 99 }));
        let body = h.backend.requests()[0].body.clone().unwrap();
        assert_eq!(body["item_type"], "car_rental");
        assert_eq!(body["end_date"], "2025-07-04");
    }

    #[tokio::test]
    async fn test_remove_and_clear_hit_their_paths() {
        let h = logged_in_harness();
        h.backend.ok(Method::Delete, "/cart/5", Value::Null);
        h.backend.ok(Method::Delete, "/cart/clear", Value::Null);
        let api = RestApi::new(h.http.clone());

        api.remove_item("5").await.unwrap();
        api.clear().await.unwrap();

        assert_eq!(h.backend.count(Method::Delete, "/cart/5"), 1);
        assert_eq!(h.backend.count(Method::Delete, "/cart/clear"), 1);
    }
}
