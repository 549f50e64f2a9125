// Wire types exchanged with the storefront backend

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

// Ids arrive as numbers or strings depending on the endpoint
pub(crate) fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Str(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

// "2025-06-01T10:30" as the booking forms produce it; seconds are accepted on input.
pub mod minute_datetime {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
        NaiveDateTime::parse_from_str(raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    TourPackage,
    CarRental,
    AirportTransit,
}

/// Booking metadata; its shape depends on what was booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum BookingDetails {
    TourPackage {
        tour_date: NaiveDate,
    },
    CarRental {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    AirportTransit {
        #[serde(with = "minute_datetime")]
        date_and_time_arrival: NaiveDateTime,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flight_number: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pickup_terminal: Option<String>,
        dropoff_address: String,
    },
}

impl BookingDetails {
    pub fn item_type(&self) -> ItemType {
        match self {
            BookingDetails::TourPackage { .. } => ItemType::TourPackage,
            BookingDetails::CarRental { .. } => ItemType::CarRental,
            BookingDetails::AirportTransit { .. } => ItemType::AirportTransit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_opt_id", skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(alias = "name")]
    pub title: String,
    pub price: f64,
    pub quantity: u32,
    #[serde(flatten)]
    pub booking: BookingDetails,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "de_id")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|w| w.0))
}

// Body of POST /cart/add
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddToCartRequest {
    pub item_id: String,
    pub quantity: u32,
    #[serde(flatten)]
    pub booking: BookingDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourPackage {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(alias = "price_per_pax")]
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub price_per_day: f64,
    #[serde(default)]
    pub seats: Option<u32>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitDestination {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AuthUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub user: AuthUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// One row of the order history
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub order_no: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub people: Option<u32>,
    #[serde(default)]
    pub total_packages: Option<u32>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub price: f64,
}

impl OrderRecord {
    pub fn awaiting_payment(&self) -> bool {
        !self.is_paid && self.status == "pending"
    }

    pub fn status_label(&self) -> String {
        let mut chars = self.status.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentLink {
    pub link: String,
}

impl PaymentLink {
    // The gateway link comes back with JSON-escaped slashes
    pub fn url(&self) -> String {
        self.link.replace("\\/", "/")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CheckoutReceipt {
    #[serde(default, deserialize_with = "de_opt_id", alias = "orderId")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}
