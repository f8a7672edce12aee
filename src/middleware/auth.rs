use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::actor::{Actor, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

impl Claims {
    /// `sub` must be the user's UUID; a missing role counts as an employee.
    pub fn actor(&self) -> Option<Actor> {
        let id = Uuid::parse_str(&self.sub).ok()?;
        let role = self.role.as_deref().map(Role::parse).unwrap_or(Role::Employee);
        Some(Actor::new(id, role))
    }
}

fn unauthorized(code: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": code }))).into_response()
}

/// Validates the HS256 bearer token and stores the caller as an [`Actor`]
/// request extension.
pub async fn require_bearer_auth(
    State(secret): State<Arc<str>>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return unauthorized("missing_authorization");
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return unauthorized("bad_authorization");
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return unauthorized("unsupported_scheme");
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => data.claims,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return unauthorized("invalid_token");
        }
    };

    let Some(actor) = claims.actor() else {
        return unauthorized("invalid_subject");
    };
    req.extensions_mut().insert(actor);
    next.run(req).await
}
