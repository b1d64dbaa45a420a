//! Startup configuration read from the environment

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

pub const DEFAULT_TOKEN_FILE: &str = "./mytoken.txt";
pub const DEFAULT_DATABASE_URL: &str = "sqlite:shop.db";
pub const DEFAULT_PHOTOS_DIR: &str = "./photos";
pub const DEFAULT_DEVELOPER_CONTACT: &str = "https://t.me/exefi1e";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub bot_token: String,
    pub database_url: String,
    pub photos_dir: PathBuf,
    pub developer_contact: String,
    pub json_logs: bool,
}

impl BotConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let bot_token = match var("TELEGRAM_BOT_TOKEN") {
            Some(token) => token.trim().to_string(),
            None => {
                let token_file = var("TOKEN_FILE").unwrap_or_else(|| DEFAULT_TOKEN_FILE.to_string());
                read_token_file(&token_file)?
            }
        };

        Ok(Self {
            bot_token,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            photos_dir: var("PHOTOS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PHOTOS_DIR)),
            developer_contact: var("DEVELOPER_CONTACT")
                .unwrap_or_else(|| DEFAULT_DEVELOPER_CONTACT.to_string()),
            json_logs: var("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),
        })
    }
}

fn read_token_file(path: &str) -> Result<String> {
    let contents = std::fs::read_to_string(path).with_context(|| {
        format!("TELEGRAM_BOT_TOKEN is not set and token file {path} could not be read")
    })?;

    let token = contents.trim();
    if token.is_empty() {
        bail!("Token file {path} is empty");
    }
    Ok(token.to_string())
}
