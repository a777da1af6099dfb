use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::contacts::{ListParams, SortColumn, SortOrder};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::validate::{Validator, normalize_email};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub is_favorite: Option<bool>,
    pub company: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContact {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub is_favorite: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub contact_ids: Option<Vec<String>>,
}

struct Page {
    page: i64,
    limit: i64,
    offset: i64,
}

fn page_window(page: Option<i64>, limit: Option<i64>) -> Page {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    Page {
        page,
        limit,
        // page and limit are unchecked client input; a huge page must
        // yield an empty page, not an arithmetic panic
        offset: (page - 1).saturating_mul(limit),
    }
}

fn pagination_body(window: &Page, returned: usize, total: i64) -> Value {
    let total_pages = if total == 0 {
        0
    } else {
        (total.saturating_add(window.limit) - 1) / window.limit
    };
    json!({
        "currentPage": window.page,
        "totalPages": total_pages,
        "totalContacts": total,
        "hasNext": window.offset.saturating_add(returned as i64) < total,
        "hasPrev": window.page > 1,
    })
}

fn map_duplicate(e: sqlx::Error) -> ApiError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            ApiError::DuplicateContact
        }
        _ => ApiError::Database(e),
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let window = page_window(query.page, query.limit);

    let params = ListParams {
        user_id: auth.id(),
        limit: window.limit,
        offset: window.offset,
        sort_by: SortColumn::parse(query.sort_by.as_deref().unwrap_or("name")),
        sort_order: SortOrder::parse(query.sort_order.as_deref().unwrap_or("asc")),
        search: query.search.filter(|s| !s.is_empty()),
        favorite: None,
        company: None,
    };

    let contacts = db::contacts::list(&state.pool, &params).await?;
    let total = db::contacts::count(&state.pool, &params).await?;
    let pagination = pagination_body(&window, contacts.len(), total);

    Ok(Json(json!({
        "success": true,
        "data": {
            "contacts": contacts,
            "pagination": pagination,
        },
    })))
}

pub async fn search_advanced(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<AdvancedQuery>,
) -> Result<Json<Value>, ApiError> {
    let window = page_window(query.page, query.limit);

    let params = ListParams {
        user_id: auth.id(),
        limit: window.limit,
        offset: window.offset,
        sort_by: SortColumn::parse(query.sort_by.as_deref().unwrap_or("name")),
        sort_order: SortOrder::parse(query.sort_order.as_deref().unwrap_or("asc")),
        search: query.search.filter(|s| !s.is_empty()),
        favorite: query.is_favorite,
        company: query.company.filter(|s| !s.is_empty()),
    };

    let contacts = db::contacts::list(&state.pool, &params).await?;
    let total = db::contacts::count(&state.pool, &params).await?;
    let pagination = pagination_body(&window, contacts.len(), total);

    Ok(Json(json!({
        "success": true,
        "data": {
            "contacts": contacts,
            "pagination": pagination,
            "filters": {
                "search": params.search,
                "isFavorite": params.favorite,
                "company": params.company,
            },
        },
    })))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let contact = db::contacts::find_by_id(&state.pool, id, auth.id())
        .await?
        .ok_or(ApiError::NotFound("Contact"))?;

    Ok(Json(json!({ "success": true, "data": { "contact": contact } })))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateContact>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut v = Validator::new();
    v.required(req.name.as_deref(), "Contact name is required");
    v.required(req.email.as_deref(), "Contact email is required");
    v.required(req.phone.as_deref(), "Phone number is required");
    if let Some(name) = &req.name {
        v.name(name);
    }
    if let Some(email) = &req.email {
        v.email(email);
    }
    if let Some(phone) = &req.phone {
        v.phone(phone);
    }
    v.finish()?;

    // required() guarantees these are present
    let name = req.name.as_deref().unwrap_or_default().trim();
    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let phone = req.phone.as_deref().unwrap_or_default().trim();

    let contact = db::contacts::create(
        &state.pool,
        auth.id(),
        name,
        &email,
        phone,
        req.company.as_deref().map(str::trim),
    )
    .await
    .map_err(map_duplicate)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Contact created successfully",
            "data": { "contact": contact },
        })),
    ))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContact>,
) -> Result<Json<Value>, ApiError> {
    let mut v = Validator::new();
    if let Some(name) = &req.name {
        v.name(name);
    }
    if let Some(email) = &req.email {
        v.email(email);
    }
    if let Some(phone) = &req.phone {
        v.phone(phone);
    }
    v.finish()?;

    let email = req.email.as_deref().map(normalize_email);

    let contact = db::contacts::update(
        &state.pool,
        id,
        auth.id(),
        req.name.as_deref().map(str::trim),
        email.as_deref(),
        req.phone.as_deref().map(str::trim),
        req.company.as_deref().map(str::trim),
        req.is_favorite,
    )
    .await
    .map_err(map_duplicate)?
    .ok_or(ApiError::NotFound("Contact"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Contact updated successfully",
        "data": { "contact": contact },
    })))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let deleted = db::contacts::delete(&state.pool, id, auth.id()).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Contact"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Contact deleted successfully",
    })))
}

pub async fn toggle_favorite(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let contact = db::contacts::toggle_favorite(&state.pool, id, auth.id())
        .await?
        .ok_or(ApiError::NotFound("Contact"))?;

    Ok(Json(json!({
        "success": true,
        "message": "Favorite status updated",
        "data": { "contact": contact },
    })))
}

/// All-or-nothing: if any requested id is missing or owned by someone
/// else, nothing is deleted.
pub async fn bulk_delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<Value>, ApiError> {
    let raw_ids = match req.contact_ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => {
            return Err(ApiError::Validation(vec![
                "contactIds must be a non-empty list".to_string(),
            ]));
        }
    };

    let mut errors = Vec::new();
    let mut ids: Vec<Uuid> = Vec::with_capacity(raw_ids.len());
    for raw in &raw_ids {
        match Uuid::parse_str(raw) {
            Ok(id) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            Err(_) => errors.push(format!("Invalid contact id: {raw}")),
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let owned = db::contacts::count_owned(&state.pool, &ids, auth.id()).await?;
    if owned < ids.len() as i64 {
        return Err(ApiError::PartialOwnership);
    }

    let deleted = db::contacts::bulk_delete(&state.pool, &ids, auth.id()).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Contacts deleted successfully",
        "data": { "deletedCount": deleted },
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_defaults_and_clamps() {
        let w = page_window(None, None);
        assert_eq!((w.page, w.limit, w.offset), (1, 10, 0));

        let w = page_window(Some(0), Some(500));
        assert_eq!((w.page, w.limit, w.offset), (1, 100, 0));

        let w = page_window(Some(3), Some(25));
        assert_eq!((w.page, w.limit, w.offset), (3, 25, 50));
    }

    #[test]
    fn page_window_survives_extreme_page_numbers() {
        let w = page_window(Some(i64::MAX), Some(100));
        assert_eq!(w.page, i64::MAX);
        assert_eq!(w.offset, i64::MAX);

        // far past the end of the data: empty page, sane flags
        let body = pagination_body(&w, 0, 42);
        assert_eq!(body["hasNext"], false);
        assert_eq!(body["hasPrev"], true);
        assert_eq!(body["totalContacts"], 42);
    }

    #[test]
    fn pagination_total_pages_is_ceiling() {
        let w = page_window(Some(1), Some(10));
        assert_eq!(pagination_body(&w, 10, 50)["totalPages"], 5);
        assert_eq!(pagination_body(&w, 10, 51)["totalPages"], 6);
        assert_eq!(pagination_body(&w, 1, 1)["totalPages"], 1);
        assert_eq!(pagination_body(&w, 0, 0)["totalPages"], 0);
    }

    #[test]
    fn pagination_next_prev_flags() {
        let first = page_window(Some(1), Some(10));
        let body = pagination_body(&first, 10, 25);
        assert_eq!(body["hasNext"], true);
        assert_eq!(body["hasPrev"], false);

        let last = page_window(Some(3), Some(10));
        let body = pagination_body(&last, 5, 25);
        assert_eq!(body["hasNext"], false);
        assert_eq!(body["hasPrev"], true);
    }
}
