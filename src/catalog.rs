//! # Catalog Service
//!
//! Listing, searching and rendering products as cards. A card whose photo
//! file is gone is still delivered, as text with a "photo not found" line.

use anyhow::Result;
use tracing::{debug, error, warn};

use crate::bot::ui_builder::buy_keyboard;
use crate::errors::MarketResult;
use crate::gateway::MessagingGateway;
use crate::localization::{t_args_lang, t_lang};
use crate::models::{format_price, Product, User};
use crate::photo_store::PhotoStore;
use crate::repository::Repository;

/// Presentation of one product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub product_id: i64,
    pub name: String,
    pub caption: String,
    pub has_photo: bool,
    pub photo_ref: Option<String>,
}

/// Render a product as a card
pub fn render_product_card(product: &Product, language_code: Option<&str>) -> ProductCard {
    let price = format_price(product.price);
    let price_line = t_args_lang("caption-price", &[("price", price.as_str())], language_code);
    let seller_line = t_args_lang(
        "caption-seller",
        &[
            ("first_name", product.seller_first_name.as_str()),
            ("last_name", product.seller_last_name.as_deref().unwrap_or("")),
        ],
        language_code,
    );

    ProductCard {
        product_id: product.id,
        name: product.name.clone(),
        caption: format!(
            "{}\n{}\n{}\n{}",
            product.name,
            product.description,
            price_line,
            seller_line.trim_end()
        ),
        has_photo: product.photo.is_some(),
        photo_ref: product.photo.clone(),
    }
}

fn render_all(products: &[Product], language_code: Option<&str>) -> Vec<ProductCard> {
    products
        .iter()
        .map(|product| render_product_card(product, language_code))
        .collect()
}

/// Cards for the whole catalog
pub async fn list_all(
    repo: &dyn Repository,
    language_code: Option<&str>,
) -> MarketResult<Vec<ProductCard>> {
    let products = repo.list_products().await?;
    Ok(render_all(&products, language_code))
}

/// Cards for the products of one seller
pub async fn list_by_seller(
    repo: &dyn Repository,
    seller: &User,
    language_code: Option<&str>,
) -> MarketResult<Vec<ProductCard>> {
    let products = repo.list_products_by_seller(seller).await?;
    Ok(render_all(&products, language_code))
}

/// Cards for products whose name contains `query`
pub async fn search(
    repo: &dyn Repository,
    query: &str,
    language_code: Option<&str>,
) -> MarketResult<Vec<ProductCard>> {
    let products = repo.search_products_by_name_substring(query).await?;
    debug!(query, found = products.len(), "Catalog search");
    Ok(render_all(&products, language_code))
}

/// Telegram rejects longer photo captions
pub const CAPTION_LIMIT: usize = 1024;

/// Send one card with its buy button. A caption too long for a photo goes
/// out as a bare photo followed by the caption as text; a photo that cannot
/// be loaded or sent degrades to a text card.
pub async fn send_card(
    gateway: &dyn MessagingGateway,
    photos: &PhotoStore,
    chat_id: i64,
    card: &ProductCard,
    language_code: Option<&str>,
) -> Result<()> {
    let keyboard = buy_keyboard(card.product_id, language_code);

    let Some(photo_ref) = card.photo_ref.as_deref() else {
        return gateway
            .send_text(chat_id, &card.caption, Some(keyboard))
            .await;
    };

    let bytes = match photos.load(photo_ref).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(product_id = card.product_id, error = %e, "Product photo unavailable");
            let text = format!(
                "{}\n{}",
                t_args_lang("photo-missing", &[("name", card.name.as_str())], language_code),
                card.caption
            );
            return gateway.send_text(chat_id, &text, Some(keyboard)).await;
        }
    };

    if card.caption.chars().count() > CAPTION_LIMIT {
        debug!(product_id = card.product_id, "Caption too long for a photo, sending it separately");
        if let Err(e) = gateway.send_photo(chat_id, bytes, "", None).await {
            warn!(product_id = card.product_id, error = %e, "Failed to send product photo");
        }
        return gateway
            .send_text(chat_id, &card.caption, Some(keyboard))
            .await;
    }

    if let Err(e) = gateway
        .send_photo(chat_id, bytes, &card.caption, Some(keyboard.clone()))
        .await
    {
        warn!(product_id = card.product_id, error = %e, "Failed to send product photo");
        return gateway
            .send_text(chat_id, &card.caption, Some(keyboard))
            .await;
    }

    Ok(())
}

/// Send every card, or the single `empty_notice` message when there are none.
/// A card that cannot be delivered is skipped. Returns the number of cards sent.
pub async fn send_cards(
    gateway: &dyn MessagingGateway,
    photos: &PhotoStore,
    chat_id: i64,
    cards: &[ProductCard],
    empty_notice: &str,
    language_code: Option<&str>,
) -> Result<usize> {
    if cards.is_empty() {
        gateway
            .send_text(chat_id, &t_lang(empty_notice, language_code), None)
            .await?;
        return Ok(0);
    }

    let mut delivered = 0;
    for card in cards {
        match send_card(gateway, photos, chat_id, card, language_code).await {
            Ok(()) => delivered += 1,
            Err(e) => {
                error!(product_id = card.product_id, chat_id, error = %e, "Failed to deliver product card");
            }
        }
    }

    Ok(delivered)
}
