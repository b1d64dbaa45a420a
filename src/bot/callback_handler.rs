//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, error, warn};

use crate::broker;
use crate::errors::MarketError;
use crate::localization::t_lang;

use super::context::AppContext;
use super::incoming::IncomingCallback;
use super::ui_builder::CallbackAction;
use super::HandlerResult;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    let incoming = IncomingCallback::from_telegram(&q);
    debug!(user_id = incoming.sender.user_id, data = %incoming.data, "Received callback query from user");

    if let Err(e) = handle_callback(&ctx, &incoming).await {
        error!(
            user_id = incoming.sender.user_id,
            data = %incoming.data,
            error = %e,
            "Failed to handle callback"
        );
        ctx.report_failure(incoming.chat_id, incoming.sender.language())
            .await;
    }

    // Stops the loading indicator on the button whatever happened above
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        warn!(error = %e, "Failed to answer callback query");
    }

    Ok(())
}

/// Run the action behind an inline button
pub async fn handle_callback(ctx: &AppContext, incoming: &IncomingCallback) -> Result<()> {
    let Some(action) = CallbackAction::parse(&incoming.data) else {
        debug!(data = %incoming.data, "Ignoring unknown callback data");
        return Ok(());
    };

    let chat_id = incoming.chat_id;
    let language_code = incoming.sender.language();

    let Some(user) = ctx.repo.get_user(incoming.sender.user_id).await? else {
        return ctx
            .gateway
            .send_text(chat_id, &t_lang("start-required", language_code), None)
            .await;
    };

    match action {
        CallbackAction::Buy(product_id) => {
            let outcome = broker::initiate_purchase(
                ctx.repo.as_ref(),
                ctx.gateway.as_ref(),
                &user,
                chat_id,
                product_id,
                language_code,
            )
            .await?;
            debug!(product_id, outcome = ?outcome, "Purchase handled");
        }
        CallbackAction::Delete(product_id) => {
            let reply = match ctx.repo.delete_product(product_id, &user).await {
                Ok(photo) => {
                    if let Some(photo) = photo {
                        if let Err(e) = ctx.photos.remove(&photo).await {
                            warn!(product_id, photo = %photo, error = %e, "Failed to remove product photo");
                        }
                    }
                    "delete-success"
                }
                Err(MarketError::Unauthorized(reason)) => {
                    warn!(product_id, reason = %reason, "Delete refused");
                    "delete-denied"
                }
                Err(MarketError::NotFound(_)) => "product-not-found",
                Err(e) => return Err(e.into()),
            };
            ctx.gateway
                .send_text(chat_id, &t_lang(reply, language_code), None)
                .await?;
        }
    }

    Ok(())
}
