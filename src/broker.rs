//! # Transaction Broker
//!
//! A purchase is an introduction: the buyer gets a confirmation and the
//! seller gets a link to the buyer. No payment, stock or counter changes.

use anyhow::Result;
use teloxide::utils::html;
use tracing::{info, warn};

use crate::gateway::MessagingGateway;
use crate::localization::{t_args_lang, t_lang};
use crate::models::User;
use crate::repository::Repository;

/// Result of a purchase request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Success,
    SelfPurchase,
    ProductNotFound,
}

/// Link the seller can use to reach the buyer
pub fn buyer_contact_link(buyer: &User) -> String {
    match buyer.username.as_deref() {
        Some(handle) if !handle.is_empty() => format!("https://t.me/{handle}"),
        _ => format!("tg://user?id={}", buyer.user_id),
    }
}

/// Introduce `buyer` to the seller of `product_id`
pub async fn initiate_purchase(
    repo: &dyn Repository,
    gateway: &dyn MessagingGateway,
    buyer: &User,
    buyer_chat_id: i64,
    product_id: i64,
    language_code: Option<&str>,
) -> Result<PurchaseOutcome> {
    let Some(product) = repo.get_product(product_id).await? else {
        gateway
            .send_text(buyer_chat_id, &t_lang("product-not-found", language_code), None)
            .await?;
        return Ok(PurchaseOutcome::ProductNotFound);
    };

    if product.seller_user_id == buyer.user_id {
        gateway
            .send_text(buyer_chat_id, &t_lang("purchase-self", language_code), None)
            .await?;
        return Ok(PurchaseOutcome::SelfPurchase);
    }

    gateway
        .send_text(
            buyer_chat_id,
            &t_args_lang("purchase-buyer", &[("name", product.name.as_str())], language_code),
            None,
        )
        .await?;

    // The seller's language is unknown here, so the default catalog is used
    let name = html::escape(&product.name);
    let link = html::escape(&buyer_contact_link(buyer));
    let seller_notice = t_args_lang(
        "purchase-seller",
        &[("name", name.as_str()), ("link", link.as_str())],
        None,
    );
    if let Err(e) = gateway
        .send_html(product.seller_user_id, &seller_notice)
        .await
    {
        warn!(product_id, seller = product.seller_user_id, error = %e, "Failed to notify seller");
    }

    info!(product_id, buyer = buyer.user_id, seller = product.seller_user_id, "Purchase brokered");
    Ok(PurchaseOutcome::Success)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer(username: Option<&str>) -> User {
        User {
            id: 2,
            user_id: 200,
            first_name: "Anna".to_string(),
            last_name: None,
            username: username.map(str::to_string),
            is_seller: false,
            is_admin: false,
            sales_count: 0,
            rating: 0.0,
        }
    }

    #[test]
    fn test_contact_link_uses_handle() {
        assert_eq!(buyer_contact_link(&buyer(Some("anna"))), "https://t.me/anna");
    }

    #[test]
    fn test_contact_link_without_handle_falls_back_to_id() {
        assert_eq!(buyer_contact_link(&buyer(None)), "tg://user?id=200");
        assert_eq!(buyer_contact_link(&buyer(Some(""))), "tg://user?id=200");
    }
}
