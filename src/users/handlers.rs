use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::state::AppState;

use super::dto::{DeleteResponse, Pagination, UserPayload, UserResponse};
use super::repo::{User, UserError};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        // reference clients call the collection with a trailing slash
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<UserPayload>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();
    if let Err(msg) = payload.validate() {
        warn!(%msg, "create rejected by validation");
        return Err((StatusCode::UNPROCESSABLE_ENTITY, msg));
    }

    match User::create(
        &state.db,
        payload.nome.trim(),
        &payload.email,
        payload.cpf.trim(),
    )
    .await
    {
        Ok(user) => {
            info!(user_id = user.id, "user created");
            Ok(Json(user.into()))
        }
        Err(UserError::Duplicate(field)) => {
            warn!(field, "create hit unique constraint");
            Err((StatusCode::CONFLICT, duplicate_message(field)))
        }
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<UserResponse>>, (StatusCode, String)> {
    let users = User::list(&state.db, p.limit, p.offset)
        .await
        .map_err(internal)?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    match User::get(&state.db, id).await {
        Ok(user) => Ok(Json(user.into())),
        Err(UserError::NotFound) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UserPayload>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();
    if let Err(msg) = payload.validate() {
        warn!(%msg, "update rejected by validation");
        return Err((StatusCode::UNPROCESSABLE_ENTITY, msg));
    }

    match User::update(
        &state.db,
        id,
        payload.nome.trim(),
        &payload.email,
        payload.cpf.trim(),
    )
    .await
    {
        Ok(user) => {
            info!(user_id = user.id, "user updated");
            Ok(Json(user.into()))
        }
        Err(UserError::NotFound) => Err(not_found()),
        Err(UserError::Duplicate(field)) => {
            warn!(field, user_id = id, "update would duplicate unique field");
            Err((StatusCode::BAD_REQUEST, duplicate_message(field)))
        }
        Err(e) => Err(internal(e)),
    }
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, (StatusCode, String)> {
    match User::delete(&state.db, id).await {
        Ok(()) => {
            info!(user_id = id, "user deleted");
            Ok(Json(DeleteResponse {
                mensagem: "Usuário deletado com sucesso".into(),
            }))
        }
        Err(UserError::NotFound) => Err(not_found()),
        Err(e) => Err(internal(e)),
    }
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Usuário não encontrado".into())
}

fn duplicate_message(field: &str) -> String {
    match field {
        "cpf" => "CPF já cadastrado por outro usuário".into(),
        _ => "Email já cadastrado por outro usuário".into(),
    }
}

fn internal(e: UserError) -> (StatusCode, String) {
    // Details stay in the log; the client gets a generic message.
    error!(error = %e, "database failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "erro interno".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_messages_name_the_field() {
        assert!(duplicate_message("email").starts_with("Email"));
        assert!(duplicate_message("cpf").starts_with("CPF"));
    }

    #[test]
    fn internal_hides_db_details() {
        let (status, msg) = internal(UserError::Db(sqlx::Error::RowNotFound));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.to_lowercase().contains("row"));
    }

    #[test]
    fn user_response_serialization() {
        let response = UserResponse {
            id: 1,
            nome: "Ana".into(),
            email: "ana@x.com".into(),
            cpf: "111.111.111-11".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("ana@x.com"));
        assert!(json.contains("nome"));
    }
}
