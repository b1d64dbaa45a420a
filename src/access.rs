//! # Role and Access Gate
//!
//! Seller promotion and the authorization checks guarding restricted
//! actions. A failed check is never an error: callers turn it into a no-op
//! or a denial reply.

use tracing::{info, warn};

use crate::errors::{MarketError, MarketResult};
use crate::models::{NewUser, Product, User};
use crate::repository::Repository;

/// Restricted actions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action<'a> {
    /// List a new product, sellers only
    AddProduct,
    /// Remove a product, its seller or an admin
    DeleteProduct(&'a Product),
    /// Browse the user list, any registered user
    ViewAllUsers,
}

/// Result of a seller promotion request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerPromotion {
    Promoted,
    AlreadySeller,
}

/// Whether `user` may perform `action`
pub fn authorize(user: &User, action: Action<'_>) -> bool {
    match action {
        Action::AddProduct => user.is_seller,
        Action::DeleteProduct(product) => user.is_admin || product.seller_id == user.id,
        Action::ViewAllUsers => true,
    }
}

/// Whether the user gets the delete entry point in the main menu
pub fn can_manage_products(user: &User) -> bool {
    user.is_seller || user.is_admin
}

/// Resolve the user behind a first contact, registering them if needed.
/// Registering an identity twice resolves to the existing record.
pub async fn register(repo: &dyn Repository, new_user: &NewUser) -> MarketResult<User> {
    if let Some(user) = repo.get_user(new_user.user_id).await? {
        return Ok(user);
    }

    let created = match repo.create_user(new_user).await {
        Err(MarketError::DuplicateHandle(handle)) => {
            warn!(user_id = new_user.user_id, handle = %handle, "Handle taken, registering without it");
            let without_handle = NewUser {
                username: None,
                ..new_user.clone()
            };
            repo.create_user(&without_handle).await
        }
        other => other,
    };

    match created {
        Err(MarketError::DuplicateIdentity(user_id)) => repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("User {user_id}"))),
        other => other,
    }
}

/// Promote a user to seller. Promoting a seller again changes nothing.
pub async fn become_seller(repo: &dyn Repository, user: &User) -> MarketResult<SellerPromotion> {
    if user.is_seller {
        return Ok(SellerPromotion::AlreadySeller);
    }

    repo.promote_to_seller(user).await?;
    info!(user_id = user.user_id, "User promoted to seller");
    Ok(SellerPromotion::Promoted)
}
