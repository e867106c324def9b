use crate::error::{Error, Result};
use crate::models::profile::Profile;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: Uuid) -> Result<Profile> {
        sqlx::query_as::<_, Profile>(r#"SELECT * FROM profiles WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("Profile not found".to_string()))
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, Profile>(r#"SELECT * FROM profiles WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Creates the caller's profile on first save; the role is only set on insert.
    pub async fn upsert(
        &self,
        id: Uuid,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        role: &str,
    ) -> Result<Profile> {
        let row = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, full_name, email, phone, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(full_name.trim())
        .bind(email.trim().to_lowercase())
        .bind(phone.map(str::trim).filter(|p| !p.is_empty()))
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::Conflict("Email is already used by another profile".to_string())
            }
            other => other.into(),
        })?;
        Ok(row)
    }
}
