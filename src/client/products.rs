//! # Product Editing
//!
//! Data and calls behind the admin product editor.
//!
//! The editor shows stock, price and weight as comma-separated lists, one
//! value per product variant. [`ProductForm`] holds those raw fields and
//! validates them into a [`ProductUpdate`], which is sent as a multipart form.

use std::fmt;
use std::str::FromStr;

use reqwest::multipart::Form;
use reqwest::Method;
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::client::api::ApiClient;
use crate::client::error::ApiError;
use crate::client::types::{string_or_number, MessageResponse};
use crate::client::upload::ImageUpload;
use crate::shared::error::SharedError;

pub const PRODUCT_UPDATED: &str = "Product updated successfully";
pub const PRODUCT_UPDATE_FAILED: &str = "Failed to update product";
pub const PRODUCT_LOAD_FAILED: &str = "Failed to load product details";

/// Fewest images a product can be saved with
pub const MIN_PRODUCT_IMAGES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductType {
    Buy,
    Rent,
}

impl ProductType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Buy => "BUY",
            ProductType::Rent => "RENT",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(ProductType::Buy),
            "RENT" => Ok(ProductType::Rent),
            "" => Err(SharedError::validation("productType", "Product Type is required")),
            other => Err(SharedError::validation(
                "productType",
                format!("unknown product type '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Product record as `GET /products/{id}` returns it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub product_type: Option<ProductType>,
    #[serde(default)]
    pub category: Option<Category>,
    /// Per-variant stock
    #[serde(default, deserialize_with = "values_in_order")]
    pub stock: Vec<f64>,
    #[serde(default, deserialize_with = "values_in_order")]
    pub buy_price: Vec<f64>,
    #[serde(default, deserialize_with = "values_in_order")]
    pub rent_price: Vec<f64>,
    #[serde(default, deserialize_with = "values_in_order")]
    pub weight_in_kg: Vec<f64>,
    #[serde(default)]
    pub description: String,
}

/// Numbers sent either as a list or as an object keyed by variant.
/// Object values are kept in the order the server sent them.
fn values_in_order<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    struct Values;

    impl<'de> Visitor<'de> for Values {
        type Value = Vec<f64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a list or an object of numbers")
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut values = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(value) = seq.next_element::<f64>()? {
                values.push(value);
            }
            Ok(values)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut values = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((_, value)) = map.next_entry::<IgnoredAny, f64>()? {
                values.push(value);
            }
            Ok(values)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(Values)
}

/// Raw editor fields, as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub product_type: String,
    pub category_id: String,
    /// Comma-separated
    pub stock: String,
    /// Comma-separated; used for both buy and rent price
    pub price: String,
    /// Comma-separated, in kilograms
    pub weight: String,
    pub description: String,
}

impl ProductForm {
    /// Prefill the editor from a stored product
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            product_type: product
                .product_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            category_id: product
                .category
                .as_ref()
                .map(|c| c.id.clone())
                .unwrap_or_default(),
            stock: join_numbers(&product.stock),
            price: join_numbers(&product.buy_price),
            weight: join_numbers(&product.weight_in_kg),
            description: product.description.clone(),
        }
    }

    /// Check every field and parse the number lists
    pub fn validate(&self, images: Vec<ImageUpload>) -> Result<ProductUpdate, SharedError> {
        let name = required(&self.name, "name", "Product Name is required")?;
        let product_type: ProductType = self.product_type.parse()?;
        let category_id = required(&self.category_id, "categoryId", "Product Category is required")?;
        if images.len() < MIN_PRODUCT_IMAGES {
            return Err(SharedError::validation("images", "Choose at least 2 pictures"));
        }
        required(&self.weight, "weightInKg", "Weight is required")?;
        required(&self.stock, "stock", "Stock Quantity is required")?;
        required(&self.price, "price", "Price is required")?;
        let description =
            required(&self.description, "description", "Product Description is required")?;

        let (stock, price, weight) = parse_variant_lists(&self.stock, &self.price, &self.weight)?;

        Ok(ProductUpdate {
            name,
            product_type,
            category_id,
            stock,
            price,
            weight,
            description,
            images,
        })
    }
}

fn required(value: &str, field: &str, message: &str) -> Result<String, SharedError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SharedError::validation(field, message));
    }
    Ok(value.to_string())
}

/// Parse the stock, price and weight lists. Every entry must be a plain
/// decimal and all three lists must have the same length.
pub fn parse_variant_lists(
    stock: &str,
    price: &str,
    weight: &str,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), SharedError> {
    let stock = parse_list(stock).ok_or_else(|| {
        SharedError::validation("stock", "Each value in Stock Quantity must be a valid number.")
    })?;
    let price = parse_list(price).ok_or_else(|| {
        SharedError::validation("price", "Each value in Price must be a valid number.")
    })?;
    let weight = parse_list(weight).ok_or_else(|| {
        SharedError::validation("weightInKg", "Each value in Weight must be a valid number.")
    })?;

    if stock.len() != price.len() || price.len() != weight.len() {
        return Err(SharedError::validation(
            "variants",
            "Quantity, Price, and Weight must have the same number of values when separated by commas.",
        ));
    }
    Ok((stock, price, weight))
}

fn parse_list(raw: &str) -> Option<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .map(|value| {
            if is_plain_decimal(value) {
                value.parse().ok()
            } else {
                None
            }
        })
        .collect()
}

/// `123` or `12.5`; no sign, exponent or bare dot
fn is_plain_decimal(value: &str) -> bool {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (value, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

fn json_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| json_number(*v).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn json_list(values: &[f64]) -> String {
    Value::Array(values.iter().map(|v| json_number(*v)).collect()).to_string()
}

/// A validated product edit
#[derive(Debug, Clone, PartialEq)]
pub struct ProductUpdate {
    pub name: String,
    pub product_type: ProductType,
    pub category_id: String,
    pub stock: Vec<f64>,
    pub price: Vec<f64>,
    pub weight: Vec<f64>,
    pub description: String,
    pub images: Vec<ImageUpload>,
}

impl ProductUpdate {
    /// Multipart body for `PUT /products/{id}`. Number lists travel as JSON
    /// arrays in text parts.
    pub fn form(&self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("name", self.name.clone())
            .text("productType", self.product_type.as_str())
            .text("categoryId", self.category_id.clone())
            .text("stock", json_list(&self.stock))
            .text("buyPrice", json_list(&self.price))
            .text("rentPrice", json_list(&self.price))
            .text("weightInKg", json_list(&self.weight))
            .text("description", self.description.clone());
        for image in &self.images {
            form = form.part("images", image.part()?);
        }
        Ok(form)
    }
}

impl ApiClient {
    /// `GET /products/{id}`
    pub async fn fetch_product(&self, id: &str, token: Option<&str>) -> Result<Product, ApiError> {
        let path = format!("/products/{}", id);
        let request = self.with_token(self.request_to(Method::GET, &["products", id]), token);
        self.execute(&path, request).await
    }

    /// `GET /category`
    pub async fn fetch_categories(&self, token: Option<&str>) -> Result<Vec<Category>, ApiError> {
        let path = "/category";
        let request = self.with_token(self.request(Method::GET, path), token);
        let categories: Vec<Category> = self.execute(path, request).await?;
        tracing::debug!("[PRODUCTS] {} categories", categories.len());
        Ok(categories)
    }

    /// `PUT /products/{id}` as multipart
    pub async fn update_product(
        &self,
        id: &str,
        update: &ProductUpdate,
        token: Option<&str>,
    ) -> Result<MessageResponse, ApiError> {
        let path = format!("/products/{}", id);
        let request = self
            .request_to(Method::PUT, &["products", id])
            .multipart(update.form()?);
        let response = self.execute(&path, self.with_token(request, token)).await?;
        tracing::info!(
            "[PRODUCTS] Updated product {} with {} images",
            id,
            update.images.len()
        );
        Ok(response)
    }
}
