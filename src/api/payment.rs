use super::{segment, RestApi};
use crate::error::ApiError;
use crate::http::{Envelope, Method};
use crate::models::{CheckoutReceipt, PaymentLink};
use crate::order::Order;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method")]
pub enum PaymentInfo {
    #[serde(rename = "credit-card")]
    CreditCard {
        #[serde(rename = "cardNumber")]
        card_number: String,
        #[serde(rename = "cardExpiry")]
        card_expiry: String,
        #[serde(rename = "cardCVC")]
        card_cvc: String,
    },
    #[serde(rename = "paypal")]
    Paypal,
}

// Body of POST /checkout/process
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    pub order: Order,
    pub total_amount: f64,
    pub personal_info: PersonalInfo,
    pub payment_info: PaymentInfo,
}

#[async_trait]
pub trait PaymentApi: Send + Sync {
    async fn process_checkout(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<Envelope<CheckoutReceipt>, ApiError>;

    async fn create_payment_intent(
        &self,
        order_id: &str,
        payment_method_details: Value,
    ) -> Result<PaymentLink, ApiError>;

    async fn confirm_payment(&self, payment_id: &str, confirmation: Value) -> Result<Value, ApiError>;
}

#[async_trait]
impl PaymentApi for RestApi {
    async fn process_checkout(
        &self,
        payload: &CheckoutPayload,
    ) -> Result<Envelope<CheckoutReceipt>, ApiError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| ApiError::Decode(format!("checkout payload: {}", e)))?;
        self.http.send(Method::Post, "/checkout/process", Some(body)).await
    }

    async fn create_payment_intent(
        &self,
        order_id: &str,
        payment_method_details: Value,
    ) -> Result<PaymentLink, ApiError> {
        self.http
            .post(
                "/payment/create-intent",
                &json!({ "orderId": order_id, "paymentMethodDetails": payment_method_details }),
            )
            .await
    }

    async fn confirm_payment(&self, payment_id: &str, confirmation: Value) -> Result<Value, ApiError> {
        self.http
            .post(&format!("/payment/confirm/{}", segment(payment_id)), &confirmation)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_payment_serializes_method_tag() {
        let info = PaymentInfo::CreditCard {
            card_number: "4111111111111111".to_string(),
            card_expiry: "12/27".to_string(),
            card_cvc: "123".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            json!({
                "method": "credit-card",
                "cardNumber": "4111111111111111",
                "cardExpiry": "12/27",
                "cardCVC": "123"
            })
        );
        assert_eq!(
            serde_json::to_value(PaymentInfo::Paypal).unwrap(),
            json!({ "method": "paypal" })
        );
    }

    #[tokio::test]
    async fn test_create_payment_intent_returns_link() {
        let h = crate::http::test_support::logged_in_harness();
        h.backend.ok(
            Method::Post,
            "/payment/create-intent",
            json!({ "status": 200, "message": "ok", "data": { "link": "https:\\/\\/pay.example.com\\/x" } }),
        );
        let api = RestApi::new(h.http.clone());

        let link = api.create_payment_intent("31", json!({})).await.unwrap();

        assert_eq!(link.url(), "https://pay.example.com/x");
        assert_eq!(
            h.backend.requests()[0].body,
            Some(json!({ "orderId": "31", "paymentMethodDetails": {} }))
        );
    }

    #[tokio::test]
    async fn test_confirm_payment_escapes_id_and_forwards_body() {
        let h = crate::http::test_support::logged_in_harness();
        h.backend.ok(
            Method::Post,
            "/payment/confirm/pi%2F7",
            json!({ "status": 200, "message": "Payment confirmed", "data": { "paid": true } }),
        );
        let api = RestApi::new(h.http.clone());

        let confirmed = api
            .confirm_payment("pi/7", json!({ "reference": "INV-7" }))
            .await
            .unwrap();

        assert_eq!(confirmed, json!({ "paid": true }));
        let sent = h.backend.requests();
        assert_eq!(sent[0].path, "/payment/confirm/pi%2F7");
        assert_eq!(sent[0].body, Some(json!({ "reference": "INV-7" })));
    }
}
