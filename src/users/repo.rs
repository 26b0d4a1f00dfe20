use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserChanges, UserRow};
use crate::{
    error::{AppError, AppResult},
    pagination::{Page, PageRequest},
    storage::StoredObject,
};

/// Persistence boundary for user records.
///
/// Implementations must enforce uniqueness of `email` and apply every write
/// as a single atomic statement; the identity invariants depend on both.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Fails with [`AppError::DuplicateEmail`] when the email is taken.
    async fn create(&self, user: NewUser) -> AppResult<User>;
    async fn update(&self, id: Uuid, changes: UserChanges) -> AppResult<Option<User>>;
    /// Sets or clears the picture URL and its deletion handle.
    async fn set_profile_picture(
        &self,
        id: Uuid,
        picture: Option<StoredObject>,
    ) -> AppResult<Option<User>>;
    /// Returns the removed record, if there was one.
    async fn delete(&self, id: Uuid) -> AppResult<Option<User>>;
    /// Newest first.
    async fn list(&self, page: PageRequest) -> AppResult<Page<User>>;
}

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, phone, age, gender, \
     birth_date, role, profile_picture, profile_picture_key, created_at, updated_at";

pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email already registered";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_user(row: Option<UserRow>) -> AppResult<Option<User>> {
    row.map(User::try_from).transpose().map_err(AppError::from)
}

fn map_write_error(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            AppError::DuplicateEmail(DUPLICATE_EMAIL_MESSAGE.into())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (email, password_hash, first_name, last_name, phone, age, gender, birth_date, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(user.age)
        .bind(user.gender.map(|g| g.as_str()))
        .bind(&user.birth_date)
        .bind(user.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(User::try_from(row)?)
    }

    async fn update(&self, id: Uuid, c: UserChanges) -> AppResult<Option<User>> {
        // nullable columns: flag says "touch it", value may be NULL to clear
        let (set_phone, set_age, set_gender, set_birth_date) = (
            c.phone.is_some(),
            c.age.is_some(),
            c.gender.is_some(),
            c.birth_date.is_some(),
        );
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                email         = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                first_name    = COALESCE($4, first_name),
                last_name     = COALESCE($5, last_name),
                phone         = CASE WHEN $6 THEN $7 ELSE phone END,
                age           = CASE WHEN $8 THEN $9 ELSE age END,
                gender        = CASE WHEN $10 THEN $11 ELSE gender END,
                birth_date    = CASE WHEN $12 THEN $13 ELSE birth_date END,
                role          = COALESCE($14, role),
                updated_at    = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&c.email)
        .bind(&c.password_hash)
        .bind(&c.first_name)
        .bind(&c.last_name)
        .bind(set_phone)
        .bind(c.phone.flatten())
        .bind(set_age)
        .bind(c.age.flatten())
        .bind(set_gender)
        .bind(c.gender.flatten().map(|g| g.as_str()))
        .bind(set_birth_date)
        .bind(c.birth_date.flatten())
        .bind(c.role.map(|r| r.as_str()))
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?;
        into_user(row)
    }

    async fn set_profile_picture(
        &self,
        id: Uuid,
        picture: Option<StoredObject>,
    ) -> AppResult<Option<User>> {
        let (url, key) = match picture {
            Some(p) => (Some(p.url), Some(p.key)),
            None => (None, None),
        };
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET profile_picture = $2, profile_picture_key = $3, updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(url)
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn delete(&self, id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn list(&self, page: PageRequest) -> AppResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.db)
            .await?;
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;
        let items = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page { items, total })
    }
}
