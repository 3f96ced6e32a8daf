//! # User Repository
//!
//! Accounts and credentials.
//!
//! The password hash is selected only by [`UserRepository::find_by_identifier`];
//! every other query returns [`User`], which has no hash field.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use emporium_core::{ListingRequest, ListingResult, NewUser, User};

use super::{list_page, push_search};
use crate::error::{DbError, DbResult};

/// Select list matching `User`'s `FromRow`.
const USER_COLUMNS: &str = "id, username, email, is_admin, created_at, updated_at";

/// Fields searched by the listing filter.
const SEARCH_COLUMNS: &[&str] = &["username", "email"];

/// A user row together with its stored password hash.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// One page of users, searched on username or email.
    pub async fn list(&self, request: &ListingRequest) -> DbResult<ListingResult<User>> {
        debug!(page = request.page, search = %request.search, "Listing users");

        let filter = request.filter();
        list_page(&self.pool, "users", USER_COLUMNS, request, |builder| {
            builder.push(" WHERE 1 = 1");
            push_search(builder, &filter, SEARCH_COLUMNS);
        })
        .await
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Ok(User)` - Inserted user
    /// * `Err(DbError::UniqueViolation)` - Username or email taken
    ///   (compared case-insensitively)
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        debug!(username = %user.username, "Inserting user");

        let now = Utc::now();
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, is_admin, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             RETURNING {}",
            USER_COLUMNS
        );

        let username = user.username.trim();
        let email = user.email.trim();

        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .bind(&user.password_hash)
            .bind(user.is_admin)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { field, .. } => {
                    let value = if field == "email" { email } else { username };
                    DbError::duplicate(field, value)
                }
                other => other,
            })?;

        Ok(inserted)
    }

    /// Looks a user up by email or username, returning the stored hash.
    ///
    /// Used only for login verification.
    pub async fn find_by_identifier(&self, identifier: &str) -> DbResult<Option<(User, String)>> {
        let identifier = identifier.trim();
        let sql = format!(
            "SELECT {}, password_hash FROM users WHERE email = ?1 OR username = ?1 LIMIT 1",
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| (row.user, row.password_hash)))
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// True when the username or the email is already registered.
    pub async fn exists(&self, username: &str, email: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2")
                .bind(username.trim())
                .bind(email.trim())
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Total number of accounts.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: format!("hash-of-{}", name),
            is_admin: false,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.users();

        let created = repo.insert(&new_user("carol")).await.unwrap();
        assert_eq!(created.username, "carol");
        assert!(!created.is_admin);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(repo.get_by_id(created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let db = db().await;
        let repo = db.users();
        repo.insert(&new_user("dave")).await.unwrap();

        let mut clash = new_user("david");
        clash.email = "DAVE@example.com".to_string();
        let err = repo.insert(&clash).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "email");
                assert_eq!(value, "DAVE@example.com");
            }
            other => panic!("expected UniqueViolation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_find_by_identifier() {
        let db = db().await;
        let repo = db.users();
        let created = repo.insert(&new_user("erin")).await.unwrap();

        let (by_email, hash) = repo
            .find_by_identifier("erin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
        assert_eq!(hash, "hash-of-erin");

        let (by_name, _) = repo.find_by_identifier(" ERIN ").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        assert!(repo.find_by_identifier("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exists() {
        let db = db().await;
        let repo = db.users();
        repo.insert(&new_user("frank")).await.unwrap();

        assert!(repo.exists("frank", "other@example.com").await.unwrap());
        assert!(repo.exists("other", "frank@example.com").await.unwrap());
        assert!(!repo.exists("other", "other@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_and_search() {
        let db = db().await;
        let repo = db.users();
        for name in ["gina", "gus", "hank", "ivy"] {
            repo.insert(&new_user(name)).await.unwrap();
        }
        let mut odd = new_user("jules");
        odd.email = "gadget@corp.example".to_string();
        repo.insert(&odd).await.unwrap();

        let all = repo
            .list(&ListingRequest::new(1, 2, "").unwrap())
            .await
            .unwrap();
        assert_eq!(all.total, 5);
        assert_eq!(all.page_count, 3);
        assert_eq!(all.items.len(), 2);

        // username OR email
        let g = repo
            .list(&ListingRequest::new(1, 10, "G").unwrap())
            .await
            .unwrap();
        let mut names: Vec<_> = g.items.iter().map(|u| u.username.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["gina", "gus", "jules"]);

        assert_eq!(repo.count().await.unwrap(), 5);
    }
}
