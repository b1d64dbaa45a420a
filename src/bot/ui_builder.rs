//! UI Builder module for creating keyboards and formatting messages
//!
//! Menu commands are a closed set; their visible labels only exist here, at
//! the rendering boundary.

use std::fmt;

use crate::access::{authorize, can_manage_products, Action};
use crate::gateway::{InlineButton, Keyboard};
use crate::localization::{get_localization_manager, t_args_lang, t_lang};
use crate::models::{Product, User};

/// Prefix of the text that opens a product by its exact name
pub const PRODUCT_MARKER: &str = "🔹";

/// Telegram rejects longer text messages
pub const MESSAGE_LIMIT: usize = 4096;

/// Fallback answers for text the bot does not understand
pub const UNKNOWN_ANSWER_KEYS: [&str; 4] = ["unknown-1", "unknown-2", "unknown-3", "unknown-4"];

/// Top-level commands reachable from the reply keyboards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    AllProducts,
    MyProducts,
    Help,
    AllUsers,
    BecomeSeller,
    SearchProducts,
    AddProduct,
    DeleteProduct,
    Back,
    BackToMenu,
    ContactDeveloper,
    /// `🔹 <name>`: show the product with exactly this name
    ShowProduct(String),
}

const LABELED_COMMANDS: [MenuCommand; 11] = [
    MenuCommand::AllProducts,
    MenuCommand::MyProducts,
    MenuCommand::Help,
    MenuCommand::AllUsers,
    MenuCommand::BecomeSeller,
    MenuCommand::SearchProducts,
    MenuCommand::AddProduct,
    MenuCommand::DeleteProduct,
    MenuCommand::Back,
    MenuCommand::BackToMenu,
    MenuCommand::ContactDeveloper,
];

impl MenuCommand {
    /// Message key of the button label
    pub fn label_key(&self) -> Option<&'static str> {
        match self {
            MenuCommand::AllProducts => Some("button-all-products"),
            MenuCommand::MyProducts => Some("button-my-products"),
            MenuCommand::Help => Some("button-help"),
            MenuCommand::AllUsers => Some("button-all-users"),
            MenuCommand::BecomeSeller => Some("button-become-seller"),
            MenuCommand::SearchProducts => Some("button-search"),
            MenuCommand::AddProduct => Some("button-add-product"),
            MenuCommand::DeleteProduct => Some("button-delete-product"),
            MenuCommand::Back => Some("button-back"),
            MenuCommand::BackToMenu => Some("button-back-to-menu"),
            MenuCommand::ContactDeveloper => Some("button-contact-developer"),
            MenuCommand::ShowProduct(_) => None,
        }
    }

    /// Visible label in the user's language
    pub fn label(&self, language_code: Option<&str>) -> String {
        match self {
            MenuCommand::ShowProduct(name) => format!("{PRODUCT_MARKER} {name}"),
            other => other
                .label_key()
                .map(|key| t_lang(key, language_code))
                .unwrap_or_default(),
        }
    }

    /// Recognize a button label in any supported language
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Some(name) = text.strip_prefix(PRODUCT_MARKER) {
            return Some(MenuCommand::ShowProduct(name.trim().to_string()));
        }

        let manager = get_localization_manager();
        LABELED_COMMANDS
            .iter()
            .find(|command| {
                command.label_key().is_some_and(|key| {
                    manager
                        .all_translations(key)
                        .iter()
                        .any(|label| label == text)
                })
            })
            .cloned()
    }
}

/// Whether the text is the `/start` command, with or without a bot mention or payload
pub fn is_start_command(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|command| command.split('@').next())
        == Some("/start")
}

/// Actions carried by inline button callback data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Buy(i64),
    Delete(i64),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(id) = data.strip_prefix("buy_") {
            return id.parse().ok().map(CallbackAction::Buy);
        }
        if let Some(id) = data.strip_prefix("delete_") {
            return id.parse().ok().map(CallbackAction::Delete);
        }
        None
    }
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Buy(id) => write!(f, "buy_{id}"),
            CallbackAction::Delete(id) => write!(f, "delete_{id}"),
        }
    }
}

fn labels(commands: &[MenuCommand], language_code: Option<&str>) -> Vec<String> {
    commands
        .iter()
        .map(|command| command.label(language_code))
        .collect()
}

/// Main reply keyboard; seller rows only for users who may use them
pub fn main_menu_keyboard(user: &User, language_code: Option<&str>) -> Keyboard {
    let mut rows = vec![
        labels(&[MenuCommand::AllProducts, MenuCommand::MyProducts], language_code),
        labels(&[MenuCommand::Help], language_code),
        labels(&[MenuCommand::AllUsers, MenuCommand::BecomeSeller], language_code),
        labels(&[MenuCommand::SearchProducts], language_code),
    ];

    let mut seller_row = Vec::new();
    if authorize(user, Action::AddProduct) {
        seller_row.push(MenuCommand::AddProduct);
    }
    if can_manage_products(user) {
        seller_row.push(MenuCommand::DeleteProduct);
    }
    if !seller_row.is_empty() {
        rows.push(labels(&seller_row, language_code));
    }

    Keyboard::Reply(rows)
}

/// Keyboard of the goods chapter
pub fn goods_chapter_keyboard(language_code: Option<&str>) -> Keyboard {
    Keyboard::Reply(vec![
        labels(&[MenuCommand::AllProducts], language_code),
        labels(&[MenuCommand::MyProducts], language_code),
        labels(&[MenuCommand::BackToMenu], language_code),
    ])
}

/// Single "back to menu" button
pub fn back_to_menu_keyboard(language_code: Option<&str>) -> Keyboard {
    Keyboard::Reply(vec![labels(&[MenuCommand::BackToMenu], language_code)])
}

/// Buy button under a product card
pub fn buy_keyboard(product_id: i64, language_code: Option<&str>) -> Keyboard {
    Keyboard::Inline(vec![vec![InlineButton::new(
        t_lang("button-buy", language_code),
        CallbackAction::Buy(product_id).to_string(),
    )]])
}

/// One delete button per product
pub fn delete_keyboard(products: &[Product]) -> Keyboard {
    Keyboard::Inline(
        products
            .iter()
            .map(|product| {
                vec![InlineButton::new(
                    product.name.clone(),
                    CallbackAction::Delete(product.id).to_string(),
                )]
            })
            .collect(),
    )
}

/// Welcome text sent on `/start` and "back to menu"
pub fn format_welcome_message(
    first_name: &str,
    user: &User,
    developer_contact: &str,
    language_code: Option<&str>,
) -> String {
    let admin_tag = if user.is_admin {
        format!(" {}", t_lang("admin-tag", language_code))
    } else {
        String::new()
    };

    [
        t_args_lang(
            "welcome-greeting",
            &[("name", first_name), ("admin_tag", admin_tag.as_str())],
            language_code,
        ),
        t_lang("welcome-description", language_code),
        t_args_lang("welcome-contact", &[("contact", developer_contact)], language_code),
    ]
    .join("\n")
}

/// One line of the user list
pub fn format_user_line(user: &User, language_code: Option<&str>) -> String {
    let mut line = user.first_name.clone();
    if let Some(last_name) = user.last_name.as_deref().filter(|name| !name.is_empty()) {
        line.push(' ');
        line.push_str(last_name);
    }
    if let Some(username) = user.username.as_deref().filter(|name| !name.is_empty()) {
        line.push_str(&format!(" (@{username})"));
    }
    if user.is_seller {
        line.push_str(&format!(" - {}", t_lang("user-seller-tag", language_code)));
    }
    if user.is_admin {
        line.push_str(&format!(" - {}", t_lang("user-admin-tag", language_code)));
    }
    line
}

/// Pack lines into as few messages as fit under `limit` characters
pub fn chunk_lines(lines: &[String], limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for line in lines {
        let needed = if current.is_empty() {
            line.chars().count()
        } else {
            current.chars().count() + 1 + line.chars().count()
        };

        if needed > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_seller: bool, is_admin: bool) -> User {
        User {
            id: 1,
            user_id: 100,
            first_name: "Иван".to_string(),
            last_name: Some("Петров".to_string()),
            username: Some("ivan".to_string()),
            is_seller,
            is_admin,
            sales_count: 0,
            rating: 0.0,
        }
    }

    #[test]
    fn test_parse_labels_in_both_languages() {
        assert_eq!(MenuCommand::parse("🛍 Все товары"), Some(MenuCommand::AllProducts));
        assert_eq!(MenuCommand::parse("🛍 All products"), Some(MenuCommand::AllProducts));
        assert_eq!(MenuCommand::parse("↩️ Назад в меню"), Some(MenuCommand::BackToMenu));
        assert_eq!(MenuCommand::parse("↩️ Назад"), Some(MenuCommand::Back));
        assert_eq!(MenuCommand::parse("hello"), None);
    }

    #[test]
    fn test_parse_product_marker() {
        assert_eq!(
            MenuCommand::parse("🔹 Лампа"),
            Some(MenuCommand::ShowProduct("Лампа".to_string()))
        );
    }

    #[test]
    fn test_every_label_parses_back() {
        for command in LABELED_COMMANDS {
            assert_eq!(MenuCommand::parse(&command.label(None)), Some(command.clone()));
            assert_eq!(MenuCommand::parse(&command.label(Some("en"))), Some(command));
        }
    }

    #[test]
    fn test_start_command_detection() {
        assert!(is_start_command("/start"));
        assert!(is_start_command("/start@market_bot"));
        assert!(is_start_command("/start ref42"));
        assert!(!is_start_command("/started"));
        assert!(!is_start_command("start"));
    }

    #[test]
    fn test_callback_action_round_trip() {
        assert_eq!(CallbackAction::parse("buy_12"), Some(CallbackAction::Buy(12)));
        assert_eq!(CallbackAction::parse("delete_3"), Some(CallbackAction::Delete(3)));
        assert_eq!(CallbackAction::Buy(12).to_string(), "buy_12");
        assert_eq!(CallbackAction::parse("buy_x"), None);
        assert_eq!(CallbackAction::parse("confirm"), None);
    }

    #[test]
    fn test_main_menu_seller_rows() {
        let Keyboard::Reply(rows) = main_menu_keyboard(&user(false, false), None) else {
            panic!("main menu must be a reply keyboard");
        };
        assert_eq!(rows.len(), 4);

        let Keyboard::Reply(rows) = main_menu_keyboard(&user(true, false), None) else {
            panic!("main menu must be a reply keyboard");
        };
        assert_eq!(rows[4], vec!["🔸 Добавить товар", "🔸 Удалить товар"]);

        let Keyboard::Reply(rows) = main_menu_keyboard(&user(false, true), None) else {
            panic!("main menu must be a reply keyboard");
        };
        assert_eq!(rows[4], vec!["🔸 Удалить товар"]);
    }

    #[test]
    fn test_welcome_message() {
        let text = format_welcome_message("Иван", &user(false, true), "https://t.me/dev", None);
        assert_eq!(
            text,
            "Привет, Иван (админ)!\nЗдесь можно купить/продать виртуальные товары и услуги\nКонтакт моих разработчиков: https://t.me/dev"
        );
    }

    #[test]
    fn test_user_line() {
        assert_eq!(
            format_user_line(&user(true, true), None),
            "Иван Петров (@ivan) - Продавец - Админ"
        );

        let mut plain = user(false, false);
        plain.username = None;
        plain.last_name = None;
        assert_eq!(format_user_line(&plain, None), "Иван");
    }

    #[test]
    fn test_chunk_lines() {
        let lines: Vec<String> = vec!["aaaa".into(), "bbbb".into(), "cc".into()];
        assert_eq!(chunk_lines(&lines, 9), vec!["aaaa\nbbbb", "cc"]);
        assert_eq!(chunk_lines(&lines, 100), vec!["aaaa\nbbbb\ncc"]);
        assert!(chunk_lines(&[], 10).is_empty());
    }
}
