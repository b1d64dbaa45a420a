//! Dialogue Manager module for the multi-step chat flows

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::catalog;
use crate::dialogue::{
    advance_product_step, reset_dialogue, ChatDialogue, ChatState, ProductDraft, StepOutcome,
};
use crate::localization::{t_args_lang, t_lang};
use crate::models::{NewProduct, User};

use super::context::AppContext;
use super::incoming::{IncomingMessage, MessageContent};
use super::ui_builder::main_menu_keyboard;

/// Feed a message into the product creation step the chat is waiting on
pub async fn handle_product_step(
    ctx: &AppContext,
    dialogue: &ChatDialogue,
    incoming: &IncomingMessage,
    state: &ChatState,
) -> Result<()> {
    let chat_id = incoming.chat_id;
    let language_code = incoming.sender.language();

    match advance_product_step(state, incoming.content.as_step_input()) {
        StepOutcome::Advanced { next, prompt } => {
            debug!(user_id = incoming.sender.user_id, next = ?next, "Product step advanced");
            dialogue.update(next).await?;
            ctx.gateway
                .send_text(chat_id, &t_lang(prompt, language_code), None)
                .await?;
        }
        StepOutcome::Retry { reason } => {
            debug!(user_id = incoming.sender.user_id, reason, "Product step input rejected");
            ctx.gateway
                .send_text(chat_id, &t_lang(reason, language_code), None)
                .await?;
        }
        StepOutcome::Completed(draft) => {
            let Some(seller) = ctx.repo.get_user(incoming.sender.user_id).await? else {
                reset_dialogue(dialogue).await?;
                return ctx
                    .gateway
                    .send_text(chat_id, &t_lang("start-required", language_code), None)
                    .await;
            };
            complete_product(ctx, dialogue, incoming, &seller, draft).await?;
        }
        StepOutcome::NotInFlow => {
            warn!(user_id = incoming.sender.user_id, state = ?state, "Product step outside the flow");
            reset_dialogue(dialogue).await?;
        }
    }

    Ok(())
}

/// Download the photo, store it and insert the product
async fn complete_product(
    ctx: &AppContext,
    dialogue: &ChatDialogue,
    incoming: &IncomingMessage,
    seller: &User,
    draft: ProductDraft,
) -> Result<()> {
    let chat_id = incoming.chat_id;
    let language_code = incoming.sender.language();

    let bytes = match ctx.gateway.download_attachment(&draft.photo_ref).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // The chat stays in the photo step so the user can send it again
            warn!(user_id = seller.user_id, error = %e, "Failed to download product photo");
            return ctx
                .gateway
                .send_text(
                    chat_id,
                    &t_lang("product-photo-download-failed", language_code),
                    None,
                )
                .await;
        }
    };

    let photo = ctx
        .photos
        .save(&bytes)
        .await
        .context("Failed to store product photo")?;

    let new_product = NewProduct {
        name: draft.name,
        description: draft.description,
        price: draft.price,
        photo: Some(photo.clone()),
    };

    reset_dialogue(dialogue).await?;

    match ctx.repo.create_product(&new_product, seller).await {
        Ok(product) => {
            info!(
                product_id = product.id,
                seller = seller.user_id,
                name = %product.name,
                "Product added"
            );
            let text = t_args_lang(
                "product-added",
                &[("name", product.name.as_str())],
                language_code,
            );
            ctx.gateway
                .send_text(chat_id, &text, Some(main_menu_keyboard(seller, language_code)))
                .await
        }
        Err(e) => {
            error!(seller = seller.user_id, error = %e, "Failed to insert product");
            if let Err(e) = ctx.photos.remove(&photo).await {
                warn!(photo = %photo, error = %e, "Failed to remove orphaned photo");
            }
            ctx.report_failure(chat_id, language_code).await;
            Ok(())
        }
    }
}

/// The message after "search" is the query
pub async fn handle_search_query(
    ctx: &AppContext,
    dialogue: &ChatDialogue,
    incoming: &IncomingMessage,
) -> Result<()> {
    let chat_id = incoming.chat_id;
    let language_code = incoming.sender.language();

    let MessageContent::Text(query) = &incoming.content else {
        return ctx
            .gateway
            .send_text(chat_id, &t_lang("search-prompt", language_code), None)
            .await;
    };

    reset_dialogue(dialogue).await?;

    let cards = catalog::search(ctx.repo.as_ref(), query, language_code).await?;
    catalog::send_cards(
        ctx.gateway.as_ref(),
        &ctx.photos,
        chat_id,
        &cards,
        "search-not-found",
        language_code,
    )
    .await?;

    Ok(())
}
