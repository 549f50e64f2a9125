use super::{segment, RestApi};
use crate::error::ApiError;
use crate::models::{Car, TourPackage, TransitDestination};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

// Read-only reference data; nothing here is cached.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn tour_packages(&self) -> Result<Vec<TourPackage>, ApiError>;

    async fn tour_package(&self, id: &str) -> Result<TourPackage, ApiError>;

    async fn available_cars(&self) -> Result<Vec<Car>, ApiError>;

    async fn airport_transits(&self) -> Result<Vec<TransitDestination>, ApiError>;

    async fn transit_destinations(&self) -> Result<Vec<TransitDestination>, ApiError>;

    // Direct rental order, bypassing the cart
    async fn create_car_rental_order(&self, order: &CarRentalOrder) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarRentalOrder {
    pub item_id: String,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
}

#[async_trait]
impl CatalogApi for RestApi {
    async fn tour_packages(&self) -> Result<Vec<TourPackage>, ApiError> {
        self.http.get("/tour-packages").await
    }

    async fn tour_package(&self, id: &str) -> Result<TourPackage, ApiError> {
        self.http
            .get(&format!("/tour-packages/{}", segment(id)))
            .await
    }

    async fn available_cars(&self) -> Result<Vec<Car>, ApiError> {
        self.http.get("/car-rentals/available").await
    }

    async fn airport_transits(&self) -> Result<Vec<TransitDestination>, ApiError> {
        self.http.get("/airport-transits").await
    }

    async fn transit_destinations(&self) -> Result<Vec<TransitDestination>, ApiError> {
        self.http.get("/airport-transits/destinations").await
    }

    async fn create_car_rental_order(&self, order: &CarRentalOrder) -> Result<Value, ApiError> {
        self.http.post("/car-rentals/order", order).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_support::harness;
    use crate::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn test_tour_packages_decode_list() {
        let h = harness();
        h.backend.ok(
            Method::Get,
            "/tour-packages",
            json!({ "status": 200, "message": "ok", "data": [
                { "id": 1, "title": "Nusa Penida Escape", "price": 85 },
                { "id": 2, "name": "Kintamani Sunrise", "price": 60.5, "duration": "1 day" }
            ]}),
        );
        let api = RestApi::new(h.http.clone());

        let packages = api.tour_packages().await.unwrap();

        assert_eq!(packages.len(), 2);
        assert_eq!(packages[1].title, "Kintamani Sunrise");
        assert_eq!(packages[0].price, 85.0);
    }

    #[tokio::test]
    async fn test_tour_package_by_id_builds_path() {
        let h = harness();
        h.backend.ok(
            Method::Get,
            "/tour-packages/7",
            json!({ "id": 7, "title": "Uluwatu Kecak", "price": 40 }),
        );
        let api = RestApi::new(h.http.clone());

        let package = api.tour_package("7").await.unwrap();
        assert_eq!(package.id, "7");
    }

    #[tokio::test]
    async fn test_missing_package_is_an_error_not_none() {
        let h = harness();
        h.backend.fail(Method::Get, "/tour-packages/99", 404, "Package not found");
        let api = RestApi::new(h.http.clone());

        let err = api.tour_package("99").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "Package not found");
    }

    #[tokio::test]
    async fn test_empty_car_list_is_ok() {
        let h = harness();
        h.backend.ok(Method::Get, "/car-rentals/available", json!([]));
        let api = RestApi::new(h.http.clone());

        assert!(api.available_cars().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_airport_transits_decode_destinations() {
        let h = harness();
        h.backend.ok(
            Method::Get,
            "/airport-transits",
            json!({ "status": 200, "message": "ok", "data": [
                { "id": 3, "name": "Seminyak", "price": 25, "description": "Up to 4 passengers" }
            ]}),
        );
        let api = RestApi::new(h.http.clone());

        let transits = api.airport_transits().await.unwrap();

        assert_eq!(transits.len(), 1);
        assert_eq!(transits[0].id, "3");
        assert_eq!(transits[0].price, 25.0);
    }

    #[tokio::test]
    async fn test_transit_destinations_use_own_path() {
        let h = harness();
        h.backend.ok(
            Method::Get,
            "/airport-transits/destinations",
            json!([{ "id": "ubud", "name": "Ubud", "price": 35.5 }]),
        );
        let api = RestApi::new(h.http.clone());

        let destinations = api.transit_destinations().await.unwrap();

        assert_eq!(destinations[0].name, "Ubud");
        assert_eq!(h.backend.count(Method::Get, "/airport-transits/destinations"), 1);
        assert_eq!(h.backend.count(Method::Get, "/airport-transits"), 0);
    }

    #[tokio::test]
    async fn test_car_rental_order_posts_dates() {
        let h = crate::http::test_support::logged_in_harness();
        h.backend.ok(
            Method::Post,
            "/car-rentals/order",
            json!({ "status": 201, "message": "Order created", "data": { "order_id": 12 } }),
        );
        let api = RestApi::new(h.http.clone());
        let order = CarRentalOrder {
            item_id: "4".to_string(),
            start_date: chrono::NaiveDate::from_ymd_opt(2030, 6, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2030, 6, 3).unwrap(),
        };

        let created = api.create_car_rental_order(&order).await.unwrap();

        assert_eq!(created, json!({ "order_id": 12 }));
        assert_eq!(
            h.backend.requests()[0].body,
            Some(json!({ "item_id": "4", "start_date": "2030-06-01", "end_date": "2030-06-03" }))
        );
    }
}
