use async_trait::async_trait;
use sqlx::PgPool;
use parkade_core::{Admin, AdminRepository, StoreError, StoreResult};
use crate::database::map_sqlx_error;

pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: String,
    username: String,
    password_hash: String,
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        let row = sqlx::query_as::<_, AdminRow>("SELECT id, username, password_hash FROM admins WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(row.map(|r| Admin {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
        }))
    }

    async fn save_admin(&self, admin: &Admin) -> StoreResult<()> {
        sqlx::query("INSERT INTO admins (id, username, password_hash) VALUES ($1, $2, $3)")
            .bind(&admin.id)
            .bind(&admin.username)
            .bind(&admin.password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, format!("admin {}", admin.username)))?;

        Ok(())
    }
}
