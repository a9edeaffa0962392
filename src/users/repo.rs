use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub cpf: String,
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("{0} already taken by another user")]
    Duplicate(&'static str),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Which unique column a violated constraint belongs to.
fn duplicate_field(constraint: &str) -> Option<&'static str> {
    if constraint.contains("email") {
        Some("email")
    } else if constraint.contains("cpf") {
        Some("cpf")
    } else {
        None
    }
}

fn map_unique_violation(err: sqlx::Error) -> UserError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            if let Some(field) = db_err.constraint().and_then(duplicate_field) {
                return UserError::Duplicate(field);
            }
        }
    }
    UserError::Db(err)
}

impl User {
    /// Primary-key order; not guaranteed stable under concurrent writes.
    pub async fn list(db: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, nome, email, cpf
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn get(db: &PgPool, id: i64) -> Result<User, UserError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, nome, email, cpf
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(UserError::NotFound)
    }

    /// Single INSERT; the unique constraints on email and cpf are the
    /// enforcement boundary, so a violation can never leave a partial row.
    pub async fn create(
        db: &PgPool,
        nome: &str,
        email: &str,
        cpf: &str,
    ) -> Result<User, UserError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (nome, email, cpf)
            VALUES ($1, $2, $3)
            RETURNING id, nome, email, cpf
            "#,
        )
        .bind(nome)
        .bind(email)
        .bind(cpf)
        .fetch_one(db)
        .await
        .map_err(map_unique_violation)
    }

    /// Uniqueness pre-checks and the overwrite run in one transaction so a
    /// concurrent update cannot slip a conflicting value in between. A write
    /// racing past the pre-checks still trips the constraint and maps to the
    /// same `Duplicate` error.
    pub async fn update(
        db: &PgPool,
        id: i64,
        nome: &str,
        email: &str,
        cpf: &str,
    ) -> Result<User, UserError> {
        let mut tx = db.begin().await?;

        // Early returns drop the transaction, which rolls it back.
        let existing =
            sqlx::query_scalar::<_, i64>(r#"SELECT id FROM users WHERE id = $1 FOR UPDATE"#)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_none() {
            return Err(UserError::NotFound);
        }

        let email_taken = sqlx::query_scalar::<_, i64>(
            r#"SELECT id FROM users WHERE email = $1 AND id <> $2"#,
        )
        .bind(email)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if email_taken.is_some() {
            return Err(UserError::Duplicate("email"));
        }

        let cpf_taken =
            sqlx::query_scalar::<_, i64>(r#"SELECT id FROM users WHERE cpf = $1 AND id <> $2"#)
                .bind(cpf)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if cpf_taken.is_some() {
            return Err(UserError::Duplicate("cpf"));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET nome = $1, email = $2, cpf = $3
            WHERE id = $4
            RETURNING id, nome, email, cpf
            "#,
        )
        .bind(nome)
        .bind(email)
        .bind(cpf)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        tx.commit().await?;
        Ok(user)
    }

    pub async fn delete(db: &PgPool, id: i64) -> Result<(), UserError> {
        let res = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_fields() {
        assert_eq!(duplicate_field("users_email_key"), Some("email"));
        assert_eq!(duplicate_field("users_cpf_key"), Some("cpf"));
        assert_eq!(duplicate_field("users_pkey"), None);
    }

    #[test]
    fn user_row_serializes_wire_fields() {
        let user = User {
            id: 1,
            nome: "Ana".into(),
            email: "ana@x.com".into(),
            cpf: "111.111.111-11".into(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["nome"], "Ana");
        assert_eq!(json["cpf"], "111.111.111-11");
    }
}
