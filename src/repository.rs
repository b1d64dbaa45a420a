//! Repository port over the marketplace store

use async_trait::async_trait;

use crate::errors::MarketResult;
use crate::models::{NewProduct, NewUser, Product, User};

/// Store of users, products and reviews
#[async_trait]
pub trait Repository: Send + Sync {
    /// Find a user by Telegram identity
    async fn get_user(&self, user_id: i64) -> MarketResult<Option<User>>;

    /// Find a user by internal row id
    async fn get_user_by_id(&self, id: i64) -> MarketResult<Option<User>>;

    /// Register a user. Fails with `DuplicateIdentity` if the identity exists
    /// and `DuplicateHandle` if another user holds the handle.
    async fn create_user(&self, new_user: &NewUser) -> MarketResult<User>;

    async fn list_users(&self) -> MarketResult<Vec<User>>;

    /// Set the seller flag; a no-op for sellers
    async fn promote_to_seller(&self, user: &User) -> MarketResult<User>;

    /// Insert a product owned by `seller`. Fails with `InvalidPrice` for
    /// negative or non-finite prices.
    async fn create_product(&self, new_product: &NewProduct, seller: &User)
        -> MarketResult<Product>;

    async fn get_product(&self, product_id: i64) -> MarketResult<Option<Product>>;

    async fn list_products(&self) -> MarketResult<Vec<Product>>;

    async fn list_products_by_seller(&self, seller: &User) -> MarketResult<Vec<Product>>;

    async fn find_product_by_exact_name(&self, name: &str) -> MarketResult<Option<Product>>;

    /// Case-sensitive substring search over names; the empty query matches all
    async fn search_products_by_name_substring(&self, query: &str) -> MarketResult<Vec<Product>>;

    /// Remove a product on behalf of its seller or an admin. Returns the photo
    /// path so the caller can release the file.
    async fn delete_product(
        &self,
        product_id: i64,
        requesting_user: &User,
    ) -> MarketResult<Option<String>>;
}
