use super::db::Database;
use super::types::{StoreError, User};

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user. Fails if the name is already taken.
    pub async fn create_user(&self, name: &str) -> Result<User, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let user = sqlx::query_as(
            "INSERT INTO users (created_at, updated_at, name) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(now)
        .bind(now)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Look up a user by name.
    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// All users, oldest registration first.
    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Delete every user. Feeds, follows, and posts cascade.
    pub async fn delete_all_users(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}
