//! # Marketplace Data Model
//!
//! Records owned by the store: users, products and reviews.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::errors::{MarketError, MarketResult};

/// Handle that receives the admin flag at registration
pub const OWNER_HANDLE: &str = "exefi1e";

/// A registered participant
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    /// Internal row id
    pub id: i64,
    /// Telegram identity, unique and immutable
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    /// Public Telegram handle without the leading `@`
    pub username: Option<String>,
    pub is_seller: bool,
    pub is_admin: bool,
    /// Never incremented by any flow
    pub sales_count: i64,
    /// Never updated by any flow
    pub rating: f64,
}

/// Identity data captured at first contact
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl NewUser {
    /// Whether this registration gets the admin flag
    pub fn is_owner(&self) -> bool {
        self.username.as_deref() == Some(OWNER_HANDLE)
    }
}

/// A listing, joined with the seller fields needed to render it
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Path of the stored photo file
    pub photo: Option<String>,
    /// Internal row id of the seller
    pub seller_id: i64,
    /// Telegram identity of the seller
    pub seller_user_id: i64,
    pub seller_first_name: String,
    pub seller_last_name: Option<String>,
}

/// Fields collected by the product creation flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub photo: Option<String>,
}

/// Rating and comment left on a product. No flow reads or writes reviews.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub comment: String,
}

/// Check that a price is a finite non-negative number. Negative zero becomes zero.
pub fn validate_price(price: f64) -> MarketResult<f64> {
    if price.is_finite() && price >= 0.0 {
        Ok(if price == 0.0 { 0.0 } else { price })
    } else {
        Err(MarketError::InvalidPrice(price.to_string()))
    }
}

/// Render a price the way it is shown on cards: `100.0`, `12.5`
pub fn format_price(price: f64) -> String {
    format!("{price:?}")
}
