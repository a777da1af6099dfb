use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::auth::jwt::{self, TokenError};
use crate::db;
use crate::error::ApiError;
use crate::models::User;
use crate::state::SharedState;

/// The authenticated caller, resolved on every request: token decoded,
/// user reloaded from the store, active flag checked. No server-side
/// session state.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.user.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let bearer: Option<TypedHeader<Authorization<Bearer>>> = parts
            .extract()
            .await
            .map_err(|_| ApiError::InvalidToken)?;

        let TypedHeader(bearer) = bearer.ok_or(ApiError::MissingToken)?;

        let claims =
            jwt::decode_token(bearer.token(), &state.config.jwt_secret).map_err(|e| match e {
                TokenError::Expired => ApiError::TokenExpired,
                TokenError::Invalid => ApiError::InvalidToken,
            })?;

        let user = db::users::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or(ApiError::UserNotFound)?;

        if !user.is_active {
            return Err(ApiError::AccountDisabled);
        }

        Ok(AuthUser { user })
    }
}

/// Same checks as [`AuthUser`], but any failure yields `None` instead of
/// rejecting the request. For routes that serve anonymous callers too.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<User>);

impl FromRequestParts<SharedState> for OptionalAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(
            AuthUser::from_request_parts(parts, state)
                .await
                .ok()
                .map(|auth| auth.user),
        ))
    }
}
