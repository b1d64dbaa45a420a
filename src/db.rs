use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::access::{authorize, Action};
use crate::errors::{MarketError, MarketResult};
use crate::models::{validate_price, NewProduct, NewUser, Product, User};
use crate::repository::Repository;

const USER_COLUMNS: &str = "id, user_id, COALESCE(first_name, '') AS first_name, last_name, username, \
     COALESCE(is_seller, 0) AS is_seller, COALESCE(is_admin, 0) AS is_admin, \
     COALESCE(sales_count, 0) AS sales_count, COALESCE(rating, 0.0) AS rating";

const PRODUCT_SELECT: &str = "SELECT p.id, COALESCE(p.name, '') AS name, \
     COALESCE(p.description, '') AS description, COALESCE(p.price, 0.0) AS price, p.photo, \
     p.seller_id, u.user_id AS seller_user_id, COALESCE(u.first_name, '') AS seller_first_name, \
     u.last_name AS seller_last_name \
     FROM products p JOIN users u ON u.id = p.seller_id";

/// Columns added after the first release: (table, column, definition)
const COLUMN_MIGRATIONS: &[(&str, &str, &str)] = &[
    ("users", "is_seller", "BOOLEAN NOT NULL DEFAULT 0"),
    ("users", "sales_count", "INTEGER NOT NULL DEFAULT 0"),
    ("users", "rating", "REAL NOT NULL DEFAULT 0.0"),
    ("users", "is_admin", "BOOLEAN NOT NULL DEFAULT 0"),
    ("products", "photo", "TEXT"),
];

/// Open a connection pool, creating the database file if needed
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database URL: {database_url}"))?
        .create_if_missing(true)
        .foreign_keys(true);

    // Every connection to `:memory:` is its own database, so keep exactly one alive
    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to database")
}

/// Initialize the database schema and bring older tables up to date
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT,
            username TEXT UNIQUE,
            is_seller BOOLEAN NOT NULL DEFAULT 0,
            is_admin BOOLEAN NOT NULL DEFAULT 0,
            sales_count INTEGER NOT NULL DEFAULT 0,
            rating REAL NOT NULL DEFAULT 0.0
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create users table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            price REAL NOT NULL,
            photo TEXT,
            seller_id INTEGER NOT NULL REFERENCES users(id)
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create products table")?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
            user_id INTEGER NOT NULL REFERENCES users(id),
            rating INTEGER NOT NULL,
            comment TEXT NOT NULL DEFAULT ''
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create reviews table")?;

    migrate_columns(pool).await?;

    info!("Database schema initialized successfully");
    Ok(())
}

/// Add every missing column from `COLUMN_MIGRATIONS`. Existing columns are left alone.
pub async fn migrate_columns(pool: &SqlitePool) -> Result<()> {
    for (table, column, definition) in COLUMN_MIGRATIONS {
        let columns = table_columns(pool, table).await?;
        if columns.iter().any(|existing| existing == column) {
            continue;
        }

        info!(table, column, "Adding missing column");
        sqlx::query(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))
            .execute(pool)
            .await
            .with_context(|| format!("Failed to add column {table}.{column}"))?;
    }

    Ok(())
}

/// Column names of a table, from schema introspection
pub async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table})"))
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to inspect table {table}"))?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("name"))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read column names")
}

/// SQLite-backed repository
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn map_unique_violation(error: sqlx::Error, new_user: &NewUser) -> MarketError {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.is_unique_violation() {
            if db_error.message().contains("users.username") {
                return MarketError::DuplicateHandle(new_user.username.clone().unwrap_or_default());
            }
            return MarketError::DuplicateIdentity(new_user.user_id);
        }
    }
    MarketError::Storage(error)
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_user(&self, user_id: i64) -> MarketResult<Option<User>> {
        debug!(user_id, "Looking up user");
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_id(&self, id: i64) -> MarketResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, new_user: &NewUser) -> MarketResult<User> {
        if self.get_user(new_user.user_id).await?.is_some() {
            return Err(MarketError::DuplicateIdentity(new_user.user_id));
        }

        let result = sqlx::query(
            "INSERT INTO users (user_id, first_name, last_name, username, is_seller, is_admin, sales_count, rating)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, 0, 0.0)",
        )
        .bind(new_user.user_id)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.username)
        .bind(new_user.is_owner())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, new_user))?;

        let id = result.last_insert_rowid();
        info!(user_id = new_user.user_id, id, is_admin = new_user.is_owner(), "User registered");

        self.get_user_by_id(id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("User {}", new_user.user_id)))
    }

    async fn list_users(&self) -> MarketResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn promote_to_seller(&self, user: &User) -> MarketResult<User> {
        sqlx::query("UPDATE users SET is_seller = 1 WHERE id = ?1")
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        self.get_user_by_id(user.id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("User {}", user.user_id)))
    }

    async fn create_product(
        &self,
        new_product: &NewProduct,
        seller: &User,
    ) -> MarketResult<Product> {
        let price = validate_price(new_product.price)?;

        let result = sqlx::query(
            "INSERT INTO products (name, description, price, photo, seller_id) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(price)
        .bind(&new_product.photo)
        .bind(seller.id)
        .execute(&self.pool)
        .await?;

        let product_id = result.last_insert_rowid();
        info!(product_id, seller = seller.user_id, "Product created");

        self.get_product(product_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Product {product_id}")))
    }

    async fn get_product(&self, product_id: i64) -> MarketResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = ?1"))
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn list_products(&self) -> MarketResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} ORDER BY p.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    async fn list_products_by_seller(&self, seller: &User) -> MarketResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.seller_id = ?1 ORDER BY p.id"
        ))
        .bind(seller.id)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn find_product_by_exact_name(&self, name: &str) -> MarketResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.name = ?1 ORDER BY p.id LIMIT 1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn search_products_by_name_substring(&self, query: &str) -> MarketResult<Vec<Product>> {
        // instr() is case-sensitive, unlike LIKE
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE ?1 = '' OR instr(p.name, ?1) > 0 ORDER BY p.id"
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn delete_product(
        &self,
        product_id: i64,
        requesting_user: &User,
    ) -> MarketResult<Option<String>> {
        let product = self
            .get_product(product_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Product {product_id}")))?;

        if !authorize(requesting_user, Action::DeleteProduct(&product)) {
            return Err(MarketError::Unauthorized(format!(
                "user {} cannot delete product {product_id}",
                requesting_user.user_id
            )));
        }

        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        info!(product_id, by = requesting_user.user_id, "Product deleted");
        Ok(product.photo)
    }
}
