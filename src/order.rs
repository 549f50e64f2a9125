// Orders handed to checkout, and the persisted pending-order slot
// An order is either a snapshot of the whole cart or one booking made straight
// from a detail page. Both travel under the same storage key, tagged by `kind`.

use crate::error::{StorageError, ValidationError};
use crate::models::{minute_datetime, AddToCartRequest, BookingDetails, Car, CartItem, TourPackage, TransitDestination};
use crate::storage::{keys, load_json, store_json, ClientStorage};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub const MIN_PACKAGE_GUESTS: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Please add items to your cart before checkout")]
    EmptyCart,

    #[error("Item {0} has a quantity below 1")]
    InvalidQuantity(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Order {
    Cart(CartOrder),
    Direct(DirectOrder),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartOrder {
    pub items: Vec<CartItem>,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectOrder {
    pub booking: DirectBooking,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

/// A single booking assembled on a detail page, before any cart exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectBooking {
    Package {
        package_id: String,
        title: String,
        unit_price: f64,
        guests: u32,
        tour_date: NaiveDate,
    },
    Car {
        car_id: String,
        name: String,
        price_per_day: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
    Transfer {
        destination_id: String,
        destination_name: String,
        unit_price: f64,
        passengers: u32,
        #[serde(with = "minute_datetime")]
        arrival: NaiveDateTime,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flight_number: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pickup_terminal: Option<String>,
        dropoff_address: String,
    },
}

pub fn cart_total(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}

impl Order {
    pub fn from_cart(items: Vec<CartItem>) -> Result<Order, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if let Some(item) = items.iter().find(|item| item.quantity < 1) {
            return Err(OrderError::InvalidQuantity(item.id.clone()));
        }
        let total = cart_total(&items);
        Ok(Order::Cart(CartOrder {
            items,
            total,
            created_at: Utc::now(),
        }))
    }

    pub fn direct(booking: DirectBooking) -> Order {
        let total = booking.total();
        Order::Direct(DirectOrder {
            booking,
            total,
            created_at: Utc::now(),
        })
    }

    // Recomputed from the lines; the stored total is only what was shown at the time
    pub fn total(&self) -> f64 {
        match self {
            Order::Cart(order) => cart_total(&order.items),
            Order::Direct(order) => order.booking.total(),
        }
    }

    pub fn item_count(&self) -> usize {
        match self {
            Order::Cart(order) => order.items.len(),
            Order::Direct(_) => 1,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Order::Cart(order) => order.created_at,
            Order::Direct(order) => order.created_at,
        }
    }

    /// A submittable order references a non-empty cart or one valid booking.
    pub fn validate(&self) -> Result<(), OrderError> {
        match self {
            Order::Cart(order) => {
                if order.items.is_empty() {
                    return Err(OrderError::EmptyCart);
                }
                match order.items.iter().find(|item| item.quantity < 1) {
                    Some(item) => Err(OrderError::InvalidQuantity(item.id.clone())),
                    None => Ok(()),
                }
            }
            Order::Direct(order) => match &order.booking {
                DirectBooking::Package { guests, .. } if *guests < MIN_PACKAGE_GUESTS => {
                    Err(ValidationError::TooFewGuests {
                        min: MIN_PACKAGE_GUESTS,
                    }
                    .into())
                }
                DirectBooking::Car {
                    start_date,
                    end_date,
                    ..
                } if end_date < start_date => Err(ValidationError::DateRangeInverted.into()),
                DirectBooking::Transfer { passengers, .. } if *passengers < 1 => {
                    Err(OrderError::InvalidQuantity("transfer".to_string()))
                }
                _ => Ok(()),
            },
        }
    }
}

impl DirectBooking {
    pub fn package(
        package: &TourPackage,
        guests: u32,
        tour_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<DirectBooking, ValidationError> {
        let tour_date = tour_date.ok_or(ValidationError::MissingFields(vec!["tour date"]))?;
        if tour_date < today {
            return Err(ValidationError::DateInPast);
        }
        if guests < MIN_PACKAGE_GUESTS {
            return Err(ValidationError::TooFewGuests {
                min: MIN_PACKAGE_GUESTS,
            });
        }
        Ok(DirectBooking::Package {
            package_id: package.id.clone(),
            title: package.title.clone(),
            unit_price: package.price,
            guests,
            tour_date,
        })
    }

    pub fn car(
        car: &Car,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<DirectBooking, ValidationError> {
        let (start_date, end_date) = match (start_date, end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(ValidationError::MissingFields(vec!["start date", "end date"])),
        };
        if start_date < today || end_date < today {
            return Err(ValidationError::DateInPast);
        }
        if end_date < start_date {
            return Err(ValidationError::DateRangeInverted);
        }
        Ok(DirectBooking::Car {
            car_id: car.id.clone(),
            name: car.name.clone(),
            price_per_day: car.price_per_day,
            start_date,
            end_date,
        })
    }

    pub fn transfer(destination: &TransitDestination, form: &TransferForm) -> Result<DirectBooking, ValidationError> {
        let mut missing = Vec::new();
        if form.date.trim().is_empty() {
            missing.push("date");
        }
        if form.time.trim().is_empty() {
            missing.push("time");
        }
        if form.dropoff_address.trim().is_empty() {
            missing.push("dropoff address");
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }
        if form.passengers < 1 {
            return Err(ValidationError::MissingFields(vec!["passengers"]));
        }

        let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDateTime(form.date.clone()))?;
        let time = NaiveTime::parse_from_str(form.time.trim(), "%H:%M")
            .map_err(|_| ValidationError::InvalidDateTime(form.time.clone()))?;

        Ok(DirectBooking::Transfer {
            destination_id: destination.id.clone(),
            destination_name: destination.name.clone(),
            unit_price: destination.price,
            passengers: form.passengers,
            arrival: date.and_time(time),
            flight_number: non_empty(&form.flight_number),
            pickup_terminal: non_empty(&form.pickup_terminal),
            dropoff_address: form.dropoff_address.trim().to_string(),
        })
    }

    pub fn title(&self) -> &str {
        match self {
            DirectBooking::Package { title, .. } => title,
            DirectBooking::Car { name, .. } => name,
            DirectBooking::Transfer {
                destination_name, ..
            } => destination_name,
        }
    }

    pub fn quantity(&self) -> u32 {
        match self {
            DirectBooking::Package { guests, .. } => *guests,
            DirectBooking::Car { .. } => 1,
            DirectBooking::Transfer { passengers, .. } => *passengers,
        }
    }

    // Rental days count both ends
    pub fn rental_days(&self) -> Option<i64> {
        match self {
            DirectBooking::Car {
                start_date,
                end_date,
                ..
            } => Some((*end_date - *start_date).num_days() + 1),
            _ => None,
        }
    }

    pub fn total(&self) -> f64 {
        match self {
            DirectBooking::Package {
                unit_price, guests, ..
            } => unit_price * *guests as f64,
            DirectBooking::Car { price_per_day, .. } => {
                price_per_day * self.rental_days().unwrap_or(1).max(0) as f64
            }
            DirectBooking::Transfer {
                unit_price,
                passengers,
                ..
            } => unit_price * *passengers as f64,
        }
    }

    /// The same selection expressed as an add-to-cart body.
    pub fn to_cart_request(&self) -> AddToCartRequest {
        match self {
            DirectBooking::Package {
                package_id,
                guests,
                tour_date,
                ..
            } => AddToCartRequest {
                item_id: package_id.clone(),
                quantity: *guests,
                booking: BookingDetails::TourPackage {
                    tour_date: *tour_date,
                },
            },
            DirectBooking::Car {
                car_id,
                start_date,
                end_date,
                ..
            } => AddToCartRequest {
                item_id: car_id.clone(),
                quantity: 1,
                booking: BookingDetails::CarRental {
                    start_date: *start_date,
                    end_date: *end_date,
                },
            },
            DirectBooking::Transfer {
                destination_id,
                passengers,
                arrival,
                flight_number,
                pickup_terminal,
                dropoff_address,
                ..
            } => AddToCartRequest {
                item_id: destination_id.clone(),
                quantity: *passengers,
                booking: BookingDetails::AirportTransit {
                    date_and_time_arrival: *arrival,
                    flight_number: flight_number.clone(),
                    pickup_terminal: pickup_terminal.clone(),
                    dropoff_address: dropoff_address.clone(),
                },
            },
        }
    }
}

// Raw airport transfer form input
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransferForm {
    pub date: String,
    pub time: String,
    pub passengers: u32,
    pub flight_number: String,
    pub pickup_terminal: String,
    pub dropoff_address: String,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// The pending-order slot in client storage, plus the cart mirror cleared with it
#[derive(Clone)]
pub struct PendingOrderStore {
    storage: Arc<dyn ClientStorage>,
}

impl std::fmt::Debug for PendingOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingOrderStore").finish_non_exhaustive()
    }
}

impl PendingOrderStore {
    pub fn new(storage: Arc<dyn ClientStorage>) -> Self {
        Self { storage }
    }

    pub fn save(&self, order: &Order) -> Result<(), StorageError> {
        store_json(self.storage.as_ref(), keys::CURRENT_ORDER, order)?;
        tracing::info!(items = order.item_count(), total = order.total(), "pending order saved");
        Ok(())
    }

    // Ok(None) when nothing is pending; Err(Corrupt) when something unreadable is
    pub fn load(&self) -> Result<Option<Order>, StorageError> {
        load_json(self.storage.as_ref(), keys::CURRENT_ORDER)
    }

    pub fn save_cart_mirror(&self, items: &[CartItem]) -> Result<(), StorageError> {
        store_json(self.storage.as_ref(), keys::CART_ITEMS, &items)
    }

    pub fn cart_mirror(&self) -> Result<Option<Vec<CartItem>>, StorageError> {
        load_json(self.storage.as_ref(), keys::CART_ITEMS)
    }

    // Attempts both keys; the first failure is reported after both were tried
    pub fn clear(&self) -> Result<(), StorageError> {
        let order = self.storage.remove(keys::CURRENT_ORDER);
        let mirror = self.storage.remove(keys::CART_ITEMS);
        order?;
        mirror?;
        tracing::info!("pending order cleared");
        Ok(())
    }
}
