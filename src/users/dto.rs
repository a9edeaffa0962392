use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo::User;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref CPF_RE: Regex = Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").unwrap();
}

/// Body for POST /users and PUT /users/:id.
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub nome: String,
    pub email: String,
    pub cpf: String,
}

impl UserPayload {
    /// Shape checks the router cannot express; returns the first offending
    /// message.
    pub fn validate(&self) -> Result<(), String> {
        if self.nome.trim().is_empty() {
            return Err("nome não pode ser vazio".into());
        }
        if !EMAIL_RE.is_match(self.email.trim()) {
            return Err("email inválido".into());
        }
        if !CPF_RE.is_match(self.cpf.trim()) {
            return Err("cpf inválido, use o formato 000.000.000-00".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub cpf: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            nome: u.nome,
            email: u.email,
            cpf: u.cpf,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub mensagem: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(nome: &str, email: &str, cpf: &str) -> UserPayload {
        UserPayload {
            nome: nome.into(),
            email: email.into(),
            cpf: cpf.into(),
        }
    }

    #[test]
    fn accepts_canonical_payload() {
        assert!(payload("Ana", "ana@x.com", "111.111.111-11")
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_empty_nome() {
        let err = payload("  ", "ana@x.com", "111.111.111-11")
            .validate()
            .unwrap_err();
        assert!(err.contains("nome"));
    }

    #[test]
    fn rejects_bad_email() {
        let err = payload("Ana", "not-an-email", "111.111.111-11")
            .validate()
            .unwrap_err();
        assert!(err.contains("email"));
    }

    #[test]
    fn rejects_bad_cpf() {
        let err = payload("Ana", "ana@x.com", "11111111111")
            .validate()
            .unwrap_err();
        assert!(err.contains("cpf"));
    }

    #[test]
    fn pagination_defaults() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.limit, 100);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn delete_response_uses_mensagem_field() {
        let json = serde_json::to_string(&DeleteResponse {
            mensagem: "Usuário deletado com sucesso".into(),
        })
        .unwrap();
        assert!(json.contains("mensagem"));
    }
}
