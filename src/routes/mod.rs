pub mod auth;
pub mod contacts;

use axum::Json;
use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::{Value, json};

use crate::auth::extractor::OptionalAuthUser;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/profile", put(auth::update_profile))
        .route("/api/auth/users", get(auth::list_users))
        .route(
            "/api/auth/users/{id}",
            get(auth::get_user)
                .put(auth::update_user)
                .delete(auth::delete_user),
        )
        // Contacts
        .route(
            "/api/contacts",
            get(contacts::list).post(contacts::create),
        )
        .route(
            "/api/contacts/search/advanced",
            get(contacts::search_advanced),
        )
        .route("/api/contacts/bulk", delete(contacts::bulk_delete))
        .route(
            "/api/contacts/{id}",
            get(contacts::get)
                .put(contacts::update)
                .delete(contacts::delete),
        )
        .route("/api/contacts/{id}/favorite", put(contacts::toggle_favorite))
}

/// Service banner. Greets the caller by name when a valid bearer token
/// is presented; anonymous requests still get 200.
pub async fn index(
    OptionalAuthUser(user): OptionalAuthUser,
    State(state): State<SharedState>,
) -> Json<Value> {
    let db_connected = !state.pool.is_closed();
    Json(json!({
        "message": "MyContacts API is up",
        "status": "OK",
        "database": if db_connected { "connected" } else { "disconnected" },
        "version": env!("CARGO_PKG_VERSION"),
        "user": user.map(|u| u.name),
        "endpoints": {
            "auth": "/api/auth",
            "contacts": "/api/contacts",
        },
    }))
}
