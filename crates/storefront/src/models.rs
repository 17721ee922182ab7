//! Wire types for the catalog backend.
//!
//! Field names follow the backend's camelCase JSON. Prices arrive as JSON
//! numbers and are held as [`Decimal`] to keep comparisons and display
//! exact. All of these are read-only snapshots on the client side; the
//! server owns the data.

use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use vitrine_core::{Email, ProductId, ProductStatus};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend-assigned unique id.
    pub id: ProductId,
    /// Display name; the `name` sort field and the text filter match on it.
    pub name: String,
    /// Short description shown on the product card.
    pub description: String,
    /// Regular price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Promotional price; the promo-only query restricts to products sold
    /// at this price.
    #[serde(with = "rust_decimal::serde::float")]
    pub promo_price: Decimal,
    /// Whether the product is purchasable.
    pub status_flag: ProductStatus,
    /// Backend-assigned category label.
    pub category: String,
}

/// Profile of a signed-in user.
///
/// The sign-in response carries more fields than these (the backend echoes
/// the credential record); anything beyond name and email is dropped during
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub email: Email,
}

/// A granted session: the user profile plus the opaque auth token.
///
/// This is the record persisted across restarts. `Debug` redacts the token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: UserProfile,
    pub token: String,
}

impl std::fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecord")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Sign-in credentials.
///
/// Never serialized as a struct; the client assembles the request body
/// itself so the password only leaves [`SecretString`] at the call site.
/// `Debug` redacts the password.
#[derive(Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: SecretString,
}

impl Credentials {
    /// Bundle an email and password for a sign-in attempt.
    #[must_use]
    pub fn new(email: Email, password: impl Into<String>) -> Self {
        Self {
            email,
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
