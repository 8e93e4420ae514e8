use async_trait::async_trait;
use serde_json::Value;

use super::client::CrmClient;
use super::error::ApiError;
use crate::auth::backend::{
    AuthBackend, AuthResponse, LoginRequest, ProfileResponse, RegisterRequest,
};

#[async_trait]
impl AuthBackend for CrmClient {
    async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.post("/login", request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.post("/register", request).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let _: Value = self.post("/logout", &serde_json::json!({})).await?;
        Ok(())
    }

    async fn profile(&self) -> Result<ProfileResponse, ApiError> {
        self.get("/profile").await
    }
}
