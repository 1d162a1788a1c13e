use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64> {
        self.sub.parse().map_err(|_| {
            Error::Unauthorized("Token contained no recognizable user identification".to_string())
        })
    }
}

/// HS256 verification key for bearer tokens issued by the identity provider.
#[derive(Clone)]
pub struct JwtKeys {
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Unauthorized("Given token not valid for any token type".to_string()))
    }
}

fn reject(detail: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response()
}

pub async fn require_bearer_auth(
    State(keys): State<JwtKeys>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return reject("Authentication credentials were not provided.");
    };
    let Some(token) = header.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) else {
        return reject("Authorization header must contain a Bearer token.");
    };

    match keys.verify(token.trim()) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "bearer token rejected");
            err.into_response()
        }
    }
}
