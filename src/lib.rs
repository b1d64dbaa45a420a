//! # Marketplace Telegram Bot
//!
//! A Telegram bot where users register, become sellers, list products with
//! a photo, browse and search the catalog, and get introduced to a seller
//! when they press "buy".

pub mod access;
pub mod bot;
pub mod broker;
pub mod catalog;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod gateway;
pub mod localization;
pub mod models;
pub mod photo_store;
pub mod repository;
