//! Message Handler module for processing incoming Telegram messages

use std::sync::Arc;

use anyhow::Result;
use rand::seq::SliceRandom;
use teloxide::prelude::*;
use tracing::{debug, error, info};

use crate::access::{self, authorize, can_manage_products, Action, SellerPromotion};
use crate::catalog;
use crate::dialogue::{reset_dialogue, ChatDialogue, ChatState};
use crate::localization::{t_args_lang, t_lang};
use crate::models::User;

use super::context::AppContext;
use super::dialogue_manager::{handle_product_step, handle_search_query};
use super::incoming::{IncomingMessage, MessageContent};
use super::ui_builder::{
    back_to_menu_keyboard, chunk_lines, delete_keyboard, format_user_line,
    format_welcome_message, goods_chapter_keyboard, is_start_command, main_menu_keyboard,
    MenuCommand, MESSAGE_LIMIT, UNKNOWN_ANSWER_KEYS,
};
use super::HandlerResult;

/// Entry point of the message branch
pub async fn message_handler(
    msg: Message,
    dialogue: ChatDialogue,
    ctx: Arc<AppContext>,
) -> HandlerResult {
    let Some(incoming) = IncomingMessage::from_telegram(&msg) else {
        debug!(chat_id = %msg.chat.id, "Ignoring message without sender");
        return Ok(());
    };

    if let Err(e) = handle_incoming(&ctx, &dialogue, &incoming).await {
        error!(
            user_id = incoming.sender.user_id,
            chat_id = incoming.chat_id,
            error = %e,
            "Failed to handle message"
        );
        ctx.report_failure(incoming.chat_id, incoming.sender.language())
            .await;
    }

    Ok(())
}

/// Route one incoming message: `/start`, a menu command, a pending step, or a fallback
pub async fn handle_incoming(
    ctx: &AppContext,
    dialogue: &ChatDialogue,
    incoming: &IncomingMessage,
) -> Result<()> {
    if !incoming.is_private {
        debug!(chat_id = incoming.chat_id, "Ignoring message from non-private chat");
        return Ok(());
    }

    let language_code = incoming.sender.language();

    if let MessageContent::Text(text) = &incoming.content {
        if is_start_command(text) {
            reset_dialogue(dialogue).await?;
            return handle_start(ctx, incoming).await;
        }

        if let Some(command) = MenuCommand::parse(text) {
            // A menu command always abandons whatever the chat was waiting for
            reset_dialogue(dialogue).await?;

            let Some(user) = ctx.repo.get_user(incoming.sender.user_id).await? else {
                return send(ctx, incoming.chat_id, "start-required", language_code).await;
            };

            return handle_menu_command(ctx, dialogue, incoming, &user, command).await;
        }
    }

    let state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id = incoming.sender.user_id, state = ?state, "Current chat state");

    if state.is_creating_product() {
        return handle_product_step(ctx, dialogue, incoming, &state).await;
    }

    if state == ChatState::AwaitingSearchQuery {
        return handle_search_query(ctx, dialogue, incoming).await;
    }

    match &incoming.content {
        MessageContent::Photo(_) => {
            send(ctx, incoming.chat_id, "photo-not-viewable", language_code).await
        }
        _ => {
            if ctx.repo.get_user(incoming.sender.user_id).await?.is_none() {
                return send(ctx, incoming.chat_id, "start-required", language_code).await;
            }
            send(ctx, incoming.chat_id, random_unknown_answer(), language_code).await
        }
    }
}

fn random_unknown_answer() -> &'static str {
    UNKNOWN_ANSWER_KEYS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(UNKNOWN_ANSWER_KEYS[0])
}

async fn send(
    ctx: &AppContext,
    chat_id: i64,
    key: &str,
    language_code: Option<&str>,
) -> Result<()> {
    ctx.gateway
        .send_text(chat_id, &t_lang(key, language_code), None)
        .await
}

async fn handle_start(ctx: &AppContext, incoming: &IncomingMessage) -> Result<()> {
    let language_code = incoming.sender.language();
    let user = access::register(ctx.repo.as_ref(), &incoming.sender.to_new_user()).await?;
    info!(user_id = user.user_id, is_admin = user.is_admin, "User started the bot");

    send_welcome(ctx, incoming, &user).await?;
    debug!(user_id = user.user_id, language = ?language_code, "Welcome sent");
    Ok(())
}

async fn send_welcome(ctx: &AppContext, incoming: &IncomingMessage, user: &User) -> Result<()> {
    let language_code = incoming.sender.language();
    let text = format_welcome_message(
        &incoming.sender.first_name,
        user,
        &ctx.developer_contact,
        language_code,
    );
    ctx.gateway
        .send_text(
            incoming.chat_id,
            &text,
            Some(main_menu_keyboard(user, language_code)),
        )
        .await
}

async fn handle_menu_command(
    ctx: &AppContext,
    dialogue: &ChatDialogue,
    incoming: &IncomingMessage,
    user: &User,
    command: MenuCommand,
) -> Result<()> {
    let chat_id = incoming.chat_id;
    let language_code = incoming.sender.language();
    debug!(user_id = user.user_id, command = ?command, "Menu command");

    match command {
        MenuCommand::AllProducts => {
            let cards = catalog::list_all(ctx.repo.as_ref(), language_code).await?;
            catalog::send_cards(
                ctx.gateway.as_ref(),
                &ctx.photos,
                chat_id,
                &cards,
                "catalog-empty",
                language_code,
            )
            .await?;
        }
        MenuCommand::MyProducts => {
            let cards = catalog::list_by_seller(ctx.repo.as_ref(), user, language_code).await?;
            catalog::send_cards(
                ctx.gateway.as_ref(),
                &ctx.photos,
                chat_id,
                &cards,
                "my-products-empty",
                language_code,
            )
            .await?;
        }
        MenuCommand::ShowProduct(name) => {
            match ctx.repo.find_product_by_exact_name(&name).await? {
                Some(product) => {
                    let card = catalog::render_product_card(&product, language_code);
                    catalog::send_card(
                        ctx.gateway.as_ref(),
                        &ctx.photos,
                        chat_id,
                        &card,
                        language_code,
                    )
                    .await?;
                }
                None => send(ctx, chat_id, "product-not-found", language_code).await?,
            }
        }
        MenuCommand::Help => {
            ctx.gateway
                .send_text(
                    chat_id,
                    &t_lang("help-text", language_code),
                    Some(back_to_menu_keyboard(language_code)),
                )
                .await?;
        }
        MenuCommand::Back => {
            ctx.gateway
                .send_text(
                    chat_id,
                    &t_lang("goods-chapter", language_code),
                    Some(goods_chapter_keyboard(language_code)),
                )
                .await?;
        }
        MenuCommand::BackToMenu => {
            send_welcome(ctx, incoming, user).await?;
        }
        MenuCommand::ContactDeveloper => {
            let text = t_args_lang(
                "contact-developer",
                &[("contact", ctx.developer_contact.as_str())],
                language_code,
            );
            ctx.gateway.send_text(chat_id, &text, None).await?;
        }
        MenuCommand::AllUsers => {
            if !authorize(user, Action::ViewAllUsers) {
                return Ok(());
            }
            let users = ctx.repo.list_users().await?;
            if users.is_empty() {
                return send(ctx, chat_id, "users-empty", language_code).await;
            }
            let lines: Vec<String> = users
                .iter()
                .map(|listed| format_user_line(listed, language_code))
                .collect();
            for chunk in chunk_lines(&lines, MESSAGE_LIMIT) {
                ctx.gateway.send_text(chat_id, &chunk, None).await?;
            }
        }
        MenuCommand::BecomeSeller => {
            match access::become_seller(ctx.repo.as_ref(), user).await? {
                SellerPromotion::AlreadySeller => {
                    send(ctx, chat_id, "already-seller", language_code).await?;
                }
                SellerPromotion::Promoted => {
                    let promoted = User {
                        is_seller: true,
                        ..user.clone()
                    };
                    ctx.gateway
                        .send_text(
                            chat_id,
                            &t_lang("became-seller", language_code),
                            Some(main_menu_keyboard(&promoted, language_code)),
                        )
                        .await?;
                }
            }
        }
        MenuCommand::SearchProducts => {
            dialogue.update(ChatState::AwaitingSearchQuery).await?;
            ctx.gateway
                .send_text(
                    chat_id,
                    &t_lang("search-prompt", language_code),
                    Some(back_to_menu_keyboard(language_code)),
                )
                .await?;
        }
        MenuCommand::AddProduct => {
            if !authorize(user, Action::AddProduct) {
                return send(ctx, chat_id, "add-product-denied", language_code).await;
            }
            dialogue.update(ChatState::AwaitingProductName).await?;
            send(ctx, chat_id, "product-name-prompt", language_code).await?;
        }
        MenuCommand::DeleteProduct => {
            if !can_manage_products(user) {
                return send(ctx, chat_id, "delete-denied", language_code).await;
            }
            let products = if user.is_admin {
                ctx.repo.list_products().await?
            } else {
                ctx.repo.list_products_by_seller(user).await?
            };
            if products.is_empty() {
                return send(ctx, chat_id, "delete-nothing", language_code).await;
            }
            ctx.gateway
                .send_text(
                    chat_id,
                    &t_lang("delete-choose", language_code),
                    Some(delete_keyboard(&products)),
                )
                .await?;
        }
    }

    Ok(())
}
