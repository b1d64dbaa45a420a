//! Chat dialogue module: per-chat conversation state and the product
//! creation steps.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::models::validate_price;

pub const MAX_PRODUCT_NAME_LEN: usize = 255;
pub const MAX_PRODUCT_DESCRIPTION_LEN: usize = 800;

/// Represents the conversation state of one chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingProductName,
    AwaitingProductDescription {
        name: String,
    },
    AwaitingProductPrice {
        name: String,
        description: String,
    },
    AwaitingProductPhoto {
        name: String,
        description: String,
        price: f64,
    },
    AwaitingSearchQuery,
}

impl ChatState {
    /// Whether the chat is inside the product creation flow
    pub fn is_creating_product(&self) -> bool {
        matches!(
            self,
            ChatState::AwaitingProductName
                | ChatState::AwaitingProductDescription { .. }
                | ChatState::AwaitingProductPrice { .. }
                | ChatState::AwaitingProductPhoto { .. }
        )
    }
}

/// Type alias for our chat dialogue
pub type ChatDialogue = Dialogue<ChatState, InMemStorage<ChatState>>;

/// Return the chat to `Idle`. An idle chat has no stored state, and the
/// storage refuses to remove a state that is not there.
pub async fn reset_dialogue(dialogue: &ChatDialogue) -> anyhow::Result<()> {
    if dialogue.get().await?.is_some() {
        dialogue.exit().await?;
    }
    Ok(())
}

/// One piece of user input delivered to a pending step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepInput<'a> {
    Text(&'a str),
    /// Transport reference of the largest photo size
    Photo(&'a str),
    Other,
}

/// Fields of a product whose creation flow has finished
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub photo_ref: String,
}

/// What a product creation step did with its input
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Moved forward; `prompt` is the message key asking for the next field
    Advanced {
        next: ChatState,
        prompt: &'static str,
    },
    /// Input rejected, the state stays as it was; `reason` is a message key
    Retry { reason: &'static str },
    /// Every field collected
    Completed(ProductDraft),
    /// The state is not a product creation step
    NotInFlow,
}

/// Validates a product name input. The name is kept exactly as typed.
pub fn validate_product_name(name: &str) -> Result<String, &'static str> {
    if name.trim().is_empty() {
        return Err("product-name-invalid");
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err("product-name-too-long");
    }

    Ok(name.to_string())
}

/// Validates a product description input. The description is kept exactly as typed.
pub fn validate_product_description(description: &str) -> Result<String, &'static str> {
    if description.trim().is_empty() {
        return Err("product-description-invalid");
    }

    if description.chars().count() > MAX_PRODUCT_DESCRIPTION_LEN {
        return Err("product-description-too-long");
    }

    Ok(description.to_string())
}

/// Parse a price, accepting a decimal comma
pub fn parse_price(input: &str) -> Result<f64, &'static str> {
    input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .and_then(|price| validate_price(price).ok())
        .ok_or("product-price-invalid")
}

/// Feed one input into the product creation step the chat is waiting on
pub fn advance_product_step(state: &ChatState, input: StepInput<'_>) -> StepOutcome {
    match state {
        ChatState::AwaitingProductName => match input {
            StepInput::Text(text) => match validate_product_name(text) {
                Ok(name) => StepOutcome::Advanced {
                    next: ChatState::AwaitingProductDescription { name },
                    prompt: "product-description-prompt",
                },
                Err(reason) => StepOutcome::Retry { reason },
            },
            _ => StepOutcome::Retry {
                reason: "product-name-invalid",
            },
        },
        ChatState::AwaitingProductDescription { name } => match input {
            StepInput::Text(text) => match validate_product_description(text) {
                Ok(description) => StepOutcome::Advanced {
                    next: ChatState::AwaitingProductPrice {
                        name: name.clone(),
                        description,
                    },
                    prompt: "product-price-prompt",
                },
                Err(reason) => StepOutcome::Retry { reason },
            },
            _ => StepOutcome::Retry {
                reason: "product-description-invalid",
            },
        },
        ChatState::AwaitingProductPrice { name, description } => {
            let parsed = match input {
                StepInput::Text(text) => parse_price(text),
                _ => Err("product-price-invalid"),
            };
            match parsed {
                Ok(price) => StepOutcome::Advanced {
                    next: ChatState::AwaitingProductPhoto {
                        name: name.clone(),
                        description: description.clone(),
                        price,
                    },
                    prompt: "product-photo-prompt",
                },
                Err(reason) => StepOutcome::Retry { reason },
            }
        }
        ChatState::AwaitingProductPhoto {
            name,
            description,
            price,
        } => match input {
            StepInput::Photo(photo_ref) => StepOutcome::Completed(ProductDraft {
                name: name.clone(),
                description: description.clone(),
                price: *price,
                photo_ref: photo_ref.to_string(),
            }),
            _ => StepOutcome::Retry {
                reason: "product-photo-required",
            },
        },
        ChatState::Idle | ChatState::AwaitingSearchQuery => StepOutcome::NotInFlow,
    }
}
