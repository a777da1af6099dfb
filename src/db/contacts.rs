use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::Contact;

/// Whitelisted sort columns. Anything else falls back to name so the
/// ORDER BY clause is never built from raw client input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortColumn {
    Name,
    Email,
    Phone,
    CreatedAt,
    Company,
}

impl SortColumn {
    pub fn parse(value: &str) -> Self {
        match value {
            "email" => SortColumn::Email,
            "phone" => SortColumn::Phone,
            "createdAt" => SortColumn::CreatedAt,
            "company" => SortColumn::Company,
            _ => SortColumn::Name,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Email => "email",
            SortColumn::Phone => "phone",
            SortColumn::CreatedAt => "created_at",
            SortColumn::Company => "company",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Self {
        match value {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

pub struct ListParams {
    pub user_id: Uuid,
    pub limit: i64,
    pub offset: i64,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
    /// Case-insensitive substring, ORed across name/email/phone/company.
    pub search: Option<String>,
    pub favorite: Option<bool>,
    pub company: Option<String>,
}

/// Shared WHERE clause for list and count. Owner scoping comes first and
/// is unconditional.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &ListParams) {
    qb.push(" WHERE user_id = ");
    qb.push_bind(params.user_id);

    if let Some(search) = &params.search {
        let pattern = format!("%{search}%");
        qb.push(" AND (name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR email ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR phone ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR company ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(favorite) = params.favorite {
        qb.push(" AND is_favorite = ");
        qb.push_bind(favorite);
    }

    if let Some(company) = &params.company {
        qb.push(" AND company ILIKE ");
        qb.push_bind(format!("%{company}%"));
    }
}

pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Vec<Contact>, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT * FROM contacts");
    push_filters(&mut qb, params);

    // id tiebreak keeps page boundaries stable when the sort key has duplicates
    qb.push(format!(
        " ORDER BY {} {}, id ASC",
        params.sort_by.as_sql(),
        params.sort_order.as_sql()
    ));
    qb.push(" LIMIT ");
    qb.push_bind(params.limit);
    qb.push(" OFFSET ");
    qb.push_bind(params.offset);

    qb.build_query_as::<Contact>().fetch_all(pool).await
}

pub async fn count(pool: &PgPool, params: &ListParams) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM contacts");
    push_filters(&mut qb, params);

    let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(row.0)
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    email: &str,
    phone: &str,
    company: Option<&str>,
) -> Result<Contact, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        "INSERT INTO contacts (user_id, name, email, phone, company)
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(company)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Owner-scoped partial update. Absent fields keep their stored value.
pub async fn update(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    company: Option<&str>,
    is_favorite: Option<bool>,
) -> Result<Option<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        "UPDATE contacts SET
            name = COALESCE($3, name),
            email = COALESCE($4, email),
            phone = COALESCE($5, phone),
            company = COALESCE($6, company),
            is_favorite = COALESCE($7, is_favorite),
            updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(company)
    .bind(is_favorite)
    .fetch_optional(pool)
    .await
}

pub async fn toggle_favorite(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<Contact>, sqlx::Error> {
    sqlx::query_as::<_, Contact>(
        "UPDATE contacts SET is_favorite = NOT is_favorite, updated_at = now()
         WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contacts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn count_owned(
    pool: &PgPool,
    ids: &[Uuid],
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(ids)
            .fetch_one(pool)
            .await?;
    Ok(row.0)
}

pub async fn bulk_delete(
    pool: &PgPool,
    ids: &[Uuid],
    user_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM contacts WHERE user_id = $1 AND id = ANY($2)")
        .bind(user_id)
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_column_whitelist() {
        assert_eq!(SortColumn::parse("email"), SortColumn::Email);
        assert_eq!(SortColumn::parse("createdAt"), SortColumn::CreatedAt);
        assert_eq!(SortColumn::parse("company"), SortColumn::Company);
        // unknown fields fall back to name
        assert_eq!(SortColumn::parse("password_hash"), SortColumn::Name);
        assert_eq!(SortColumn::parse("; DROP TABLE contacts"), SortColumn::Name);
    }

    #[test]
    fn sort_order_defaults_ascending() {
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Asc);
    }
}
