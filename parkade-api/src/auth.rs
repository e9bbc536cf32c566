use axum::{
    extract::State,
    Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use jsonwebtoken::{encode, Header, EncodingKey};
use chrono::{Utc, Duration};
use uuid::Uuid;
use anyhow::Context;
use parkade_core::{Admin, AdminRepository, StoreError};
use parkade_store::app_config::AdminCredentials;
use tracing::{info, warn};

use crate::{state::AppState, error::AppError, middleware::auth::{AdminClaims, ADMIN_ROLE}};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    expires_in: u64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/login", post(login))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let admin = verify_credentials(state.admins.as_ref(), &req.username, req.password)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Credential check failed: {:#}", e)))?;

    let Some(admin) = admin else {
        warn!(username = %req.username, "Rejected admin login");
        return Err(AppError::AuthenticationError("Invalid credentials".to_string()));
    };

    let claims = AdminClaims {
        sub: admin.id,
        username: admin.username,
        role: ADMIN_ROLE.to_owned(),
        exp: (Utc::now() + Duration::seconds(state.auth.expiration as i64)).timestamp() as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(state.auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok(Json(AuthResponse { token, expires_in: state.auth.expiration }))
}

/// The admin whose stored bcrypt hash matches `password`, if any.
pub async fn verify_credentials(
    admins: &dyn AdminRepository,
    username: &str,
    password: String,
) -> anyhow::Result<Option<Admin>> {
    let Some(admin) = admins.find_by_username(username).await? else {
        return Ok(None);
    };

    // bcrypt blocks; run it off the async workers
    let hash = admin.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await?
        .unwrap_or(false);

    Ok(verified.then_some(admin))
}

/// Creates the configured admin unless one with that username already exists.
pub async fn ensure_admin(admins: &dyn AdminRepository, creds: &AdminCredentials) -> anyhow::Result<()> {
    if admins.find_by_username(&creds.username).await?.is_some() {
        return Ok(());
    }

    let password = creds.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await?
        .context("Failed to hash bootstrap admin password")?;

    let admin = Admin {
        id: Uuid::new_v4().to_string(),
        username: creds.username.clone(),
        password_hash,
    };

    match admins.save_admin(&admin).await {
        Ok(()) => {
            info!(username = %admin.username, "Created bootstrap admin");
            Ok(())
        }
        // Another instance won the race
        Err(StoreError::Duplicate(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}
