//! # Orders and Rentals
//!
//! Status model and API calls behind the order detail and rental management
//! screens.
//!
//! - `OrderStatus` - the fixed lifecycle, in display order
//! - `status_steps` - which stepper nodes are done, current or pending
//! - `RentalFilter` - paginated listing query, with preferences kept in the
//!   volatile tier between visits

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::client::api::ApiClient;
use crate::client::error::{ApiError, StorageError};
use crate::client::storage::KeyValueStore;
use crate::client::types::string_or_number;
use crate::shared::error::SharedError;

/// Volatile-tier key for the rental status filter
pub const RENTAL_FILTER_KEY: &str = "rentalOrderFilter";
/// Volatile-tier key for the rental sort direction
pub const RENTAL_SORT_KEY: &str = "rentalOrderSort";

/// Filter value meaning "every status"
const ALL_STATUSES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Requested,
    Placed,
    PickedUp,
    ForPacking,
    Packed,
    OnDelivery,
    Delivered,
    Complete,
    ToReturn,
    Returned,
    Failed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 12] = [
        OrderStatus::Requested,
        OrderStatus::Placed,
        OrderStatus::PickedUp,
        OrderStatus::ForPacking,
        OrderStatus::Packed,
        OrderStatus::OnDelivery,
        OrderStatus::Delivered,
        OrderStatus::Complete,
        OrderStatus::ToReturn,
        OrderStatus::Returned,
        OrderStatus::Failed,
        OrderStatus::Cancelled,
    ];

    /// Position in the lifecycle
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|status| *status == self)
            .unwrap_or_default()
    }

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Requested => "Requested",
            OrderStatus::Placed => "Placed",
            OrderStatus::PickedUp => "PickedUp",
            OrderStatus::ForPacking => "ForPacking",
            OrderStatus::Packed => "Packed",
            OrderStatus::OnDelivery => "OnDelivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Complete => "Complete",
            OrderStatus::ToReturn => "ToReturn",
            OrderStatus::Returned => "Returned",
            OrderStatus::Failed => "Failed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Human label: `OnDelivery` -> `On Delivery`
    pub fn label(self) -> String {
        let mut label = String::new();
        for (i, ch) in self.as_str().chars().enumerate() {
            if i > 0 && ch.is_ascii_uppercase() {
                label.push(' ');
            }
            label.push(ch);
        }
        label
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| SharedError::validation("status", format!("unknown order status '{}'", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Completed,
    Current,
    Pending,
}

/// One node of the status stepper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub status: OrderStatus,
    pub state: StepState,
    /// Whether the bar after this node is filled; `None` for the last node
    pub connector_filled: Option<bool>,
}

/// Stepper nodes for an order currently at `current`.
///
/// An unknown status (`None`) renders every node as pending.
pub fn status_steps(current: Option<OrderStatus>) -> Vec<Step> {
    let current_index = current.map(OrderStatus::index);
    let last = OrderStatus::ALL.len() - 1;

    OrderStatus::ALL
        .iter()
        .enumerate()
        .map(|(i, status)| {
            let state = match current_index {
                Some(c) if i < c => StepState::Completed,
                Some(c) if i == c => StepState::Current,
                _ => StepState::Pending,
            };
            let connector_filled = (i != last).then(|| current_index.is_some_and(|c| i < c));
            Step {
                status: *status,
                state,
                connector_filled,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
    pub fullname: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductImage {
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderProduct {
    pub name: String,
    pub product_type: Option<String>,
    pub images: Vec<ProductImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    pub product: OrderProduct,
}

/// Order detail record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_status: String,
    #[serde(default)]
    pub address: Option<ShippingAddress>,
    /// Line items
    #[serde(default)]
    pub quantity: Vec<OrderLine>,
    #[serde(default)]
    pub total: f64,
    /// Exchange rates keyed by currency name
    #[serde(default)]
    pub currency: BTreeMap<String, f64>,
}

impl Order {
    pub fn status(&self) -> Option<OrderStatus> {
        self.order_status.parse().ok()
    }

    pub fn steps(&self) -> Vec<Step> {
        status_steps(self.status())
    }

    /// The total in every currency the order carries a rate for
    pub fn converted_totals(&self) -> Vec<(String, f64)> {
        self.currency
            .iter()
            .map(|(name, rate)| (name.clone(), self.total * rate))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(SharedError::validation("sort", format!("unknown sort '{}'", other))),
        }
    }
}

/// Body of `POST /rent/filter`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RentalFilter {
    pub page: u32,
    pub limit: u32,
    /// `None` lists every status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    pub sort: SortDirection,
}

impl Default for RentalFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            status: None,
            sort: SortDirection::Asc,
        }
    }
}

impl RentalFilter {
    /// Start from the preferences saved on the last visit
    pub fn from_preferences(store: &dyn KeyValueStore) -> Self {
        let status = store
            .get(RENTAL_FILTER_KEY)
            .filter(|value| value != ALL_STATUSES)
            .and_then(|value| value.parse().ok());
        let sort = store
            .get(RENTAL_SORT_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        Self {
            status,
            sort,
            ..Self::default()
        }
    }

    pub fn save_preferences(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let status = self.status.map_or(ALL_STATUSES, OrderStatus::as_str);
        store.set(RENTAL_FILTER_KEY, status)?;
        store.set(RENTAL_SORT_KEY, self.sort.as_str())
    }

    /// Number of pages for `total` results
    pub fn page_count(&self, total: u64) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        total.div_ceil(u64::from(self.limit))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalOrder {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total: Option<f64>,
}

impl RentalOrder {
    pub fn status(&self) -> Option<OrderStatus> {
        self.status.parse().ok()
    }
}

/// One page of `POST /rent/filter`
#[derive(Debug, Clone, Deserialize)]
pub struct RentalPage {
    pub total: u64,
    #[serde(default)]
    pub data: Vec<RentalOrder>,
}

impl ApiClient {
    /// `GET /order/{id}`
    pub async fn fetch_order(&self, id: &str, token: Option<&str>) -> Result<Order, ApiError> {
        let path = format!("/order/{}", id);
        let request = self.with_token(self.request_to(Method::GET, &["order", id]), token);
        let order: Order = self.execute(&path, request).await?;
        tracing::debug!("[ORDERS] Order {} is {}", order.id, order.order_status);
        Ok(order)
    }

    /// `POST /rent/filter`
    pub async fn filter_rentals(
        &self,
        filter: &RentalFilter,
        token: Option<&str>,
    ) -> Result<RentalPage, ApiError> {
        let path = "/rent/filter";
        let request = self.with_token(self.request(Method::POST, path).json(filter), token);
        let page: RentalPage = self.execute(path, request).await?;
        tracing::debug!("[ORDERS] {} rentals on page {} of {}", page.data.len(), filter.page, page.total);
        Ok(page)
    }
}

/// Past this, f64 no longer holds every whole number
const MAX_EXACT_AMOUNT: f64 = 9_007_199_254_740_992.0;

/// Whole amounts get thousands separators, anything else two decimals.
/// NaN and infinities render as `-`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    if value.abs() >= MAX_EXACT_AMOUNT {
        return format!("{:.0}", value);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let value = value.abs();
    if value.fract() == 0.0 {
        return format!("{}{}", sign, group_thousands(value as u64));
    }
    let cents = (value * 100.0).round() as u64;
    format!("{}{}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
