use std::sync::Arc;

use validator::Validate;

use crate::database::catalog::{AuthoringStore, Repository};
use crate::dto::user_dto::SignUpPayload;
use crate::error::Result;
use crate::models::user::{NewUser, User};
use crate::utils::crypto::hash_password;

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Repository>,
}

impl UserService {
    pub fn new(store: Arc<dyn Repository>) -> Self {
        Self { store }
    }

    pub async fn sign_up(&self, payload: SignUpPayload) -> Result<User> {
        payload.validate()?;
        let password_hash = hash_password(&payload.password)?;
        let user = self
            .store
            .create_user(NewUser {
                username: payload.username.trim().to_string(),
                email: payload.email.trim().to_lowercase(),
                password_hash,
            })
            .await?;
        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }
}
