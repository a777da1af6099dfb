use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{Claims, encode_token};
use crate::auth::password;
use crate::db;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::validate::{Validator, normalize_email};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_active: Option<bool>,
}

fn issue_token(state: &SharedState, user_id: Uuid) -> Result<String, ApiError> {
    let claims = Claims::new(user_id, state.config.token_lifetime_days);
    encode_token(&claims, &state.config.jwt_secret).map_err(ApiError::Internal)
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let (Some(name), Some(email), Some(pw)) = (&req.name, &req.email, &req.password) else {
        return Err(ApiError::Validation(vec![
            "All fields are required".to_string(),
        ]));
    };

    let mut v = Validator::new();
    v.name(name).email(email).password(pw);
    v.finish()?;

    let name = name.trim();
    let email = normalize_email(email);

    if db::users::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(ApiError::DuplicateEmail);
    }

    let pw_hash = password::hash(pw).map_err(ApiError::Internal)?;

    // Advisory lock so two concurrent first registrations cannot both
    // see an empty table and claim the admin flag.
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let is_admin = db::users::count_all(&mut *tx).await? == 0;

    let user = db::users::create(&mut *tx, name, &email, &pw_hash, is_admin)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                ApiError::DuplicateEmail
            }
            _ => ApiError::Database(e),
        })?;

    tx.commit().await?;

    let token = issue_token(&state, user.id)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "data": { "user": user, "token": token },
        })),
    ))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(email), Some(pw)) = (&req.email, &req.password) else {
        return Err(ApiError::Validation(vec![
            "Email and password are required".to_string(),
        ]));
    };

    let email = normalize_email(email);

    if state.login_limiter.check(&email).is_err() {
        return Err(ApiError::RateLimited);
    }

    // Unknown email and wrong password take the same path out so the
    // response cannot reveal which one was wrong.
    let Some(user) = db::users::find_by_email(&state.pool, &email).await? else {
        state.login_limiter.record_failure(&email);
        return Err(ApiError::InvalidCredentials);
    };

    let valid = password::verify(pw, &user.password_hash).map_err(ApiError::Internal)?;
    if !valid {
        state.login_limiter.record_failure(&email);
        return Err(ApiError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(ApiError::AccountDisabled);
    }

    state.login_limiter.reset(&email);

    let token = issue_token(&state, user.id)?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "data": { "user": user, "token": token },
    })))
}

pub async fn me(auth: AuthUser) -> Json<Value> {
    Json(json!({ "success": true, "data": { "user": auth.user } }))
}

pub async fn update_profile(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    if let Some(name) = &req.name {
        let mut v = Validator::new();
        v.name(name);
        v.finish()?;
    }

    let user = db::users::update_profile(
        &state.pool,
        auth.id(),
        req.name.as_deref().map(str::trim),
        req.avatar.as_deref(),
    )
    .await?
    .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "data": { "user": user },
    })))
}

// The upstream contract gated the user-administration routes behind "has a
// valid token" only; here they additionally require the admin flag.

pub async fn list_users(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<Value>, ApiError> {
    auth.require_admin()?;

    let users = db::users::list_all(&state.pool).await?;
    let total = users.len();

    Ok(Json(json!({
        "success": true,
        "data": { "users": users, "total": total },
    })))
}

pub async fn get_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    auth.require_admin()?;

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(json!({ "success": true, "data": { "user": user } })))
}

pub async fn update_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    auth.require_admin()?;

    let mut v = Validator::new();
    if let Some(name) = &req.name {
        v.name(name);
    }
    if let Some(email) = &req.email {
        v.email(email);
    }
    v.finish()?;

    let email = req.email.as_deref().map(normalize_email);

    let user = db::users::update(
        &state.pool,
        id,
        req.name.as_deref().map(str::trim),
        email.as_deref(),
        req.is_active,
    )
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            ApiError::DuplicateEmail
        }
        _ => ApiError::Database(e),
    })?
    .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "data": { "user": user },
    })))
}

pub async fn delete_user(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    auth.require_admin()?;

    let deleted = db::users::delete(&state.pool, id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully",
    })))
}
