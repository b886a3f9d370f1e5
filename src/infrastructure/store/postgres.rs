use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use super::{new_document_id, Direction, Document, DocumentData, DocumentStore, Filter, Query};
use crate::errors::StoreError;

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("field name pattern is valid")
});

/// Documents kept as JSONB rows of a single `documents` table.
///
/// Field names are inlined as literals so the expression indexes from the
/// migrations apply; they are checked against [`FIELD_NAME`] first.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PgDocumentStore { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

fn field_ref(field: &str) -> Result<String, StoreError> {
    if FIELD_NAME.is_match(field) {
        Ok(format!("(data -> '{field}')"))
    } else {
        Err(StoreError::Query(format!("invalid field name: {field}")))
    }
}

fn push_where(builder: &mut QueryBuilder<'_, Postgres>, collection: &str, query: &Query) -> Result<(), StoreError> {
    builder.push(" WHERE collection = ").push_bind(collection.to_string());

    for filter in &query.filters {
        builder.push(" AND ");
        match filter {
            Filter::Eq(field, value) => {
                builder.push(field_ref(field)?).push(" = ").push_bind(Json(value.clone()));
            }
            Filter::ArrayContains(field, value) => {
                builder
                    .push(field_ref(field)?)
                    .push(" @> ")
                    .push_bind(Json(Value::Array(vec![value.clone()])));
            }
            Filter::Gte(field, value) => {
                builder.push(field_ref(field)?).push(" >= ").push_bind(Json(value.clone()));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    #[instrument(skip(self, query), err)]
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id, data FROM documents");
        push_where(&mut builder, collection, query)?;

        builder.push(" ORDER BY ");
        if let Some((field, direction)) = &query.order_by {
            let column = field_ref(field)?;
            let direction = match direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            builder.push(format!(
                "COALESCE({column}, 'null'::jsonb) = 'null'::jsonb, {column} {direction}, "
            ));
        }
        builder.push("seq");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows: Vec<(String, Json<DocumentData>)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(data))| Document { id, data })
            .collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<(String, Json<DocumentData>)> = sqlx::query_as(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, Json(data))| Document { id, data }))
    }

    async fn insert(&self, collection: &str, data: DocumentData) -> Result<String, StoreError> {
        let id = new_document_id();
        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(&id)
            .bind(Json(data))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: DocumentData) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET data = data || $3 WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(patch))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn increment(&self, collection: &str, id: &str, field: &str, by: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET data = jsonb_set(
                data,
                ARRAY[$3::text],
                to_jsonb(COALESCE((data ->> $3)::bigint, 0) + $4)
            )
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(field)
        .bind(by)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn count(&self, collection: &str, query: &Query) -> Result<usize, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents");
        push_where(&mut builder, collection, query)?;

        let count: i64 = builder.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_are_inlined_only_when_plain_identifiers() {
        assert_eq!(field_ref("createdAt").unwrap(), "(data -> 'createdAt')");
        assert!(field_ref("x'); DROP TABLE documents; --").is_err());
    }

    #[test]
    fn builds_filters_with_bound_values() {
        let query = Query::published().array_contains("tags", "rust").gte("views", 3);
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id, data FROM documents");
        push_where(&mut builder, "blog", &query).unwrap();

        assert_eq!(
            builder.sql(),
            "SELECT id, data FROM documents WHERE collection = $1 \
             AND (data -> 'published') = $2 \
             AND (data -> 'tags') @> $3 \
             AND (data -> 'views') >= $4"
        );
    }
}
