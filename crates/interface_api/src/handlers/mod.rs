//! Request handlers

pub mod health;
pub mod proposals;
pub mod policies;
pub mod claims;
pub mod payments;
pub mod vehicles;
pub mod plans;

use axum::{extract::FromRequestParts, http::request::Parts};
use validator::Validate;

use core_kernel::OperationMetadata;
use domain_workflow::{authorize, authorize_claim_advance, Action, ClaimStatus};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::middleware::CorrelationId;

/// The authenticated principal of a request
#[derive(Debug, Clone)]
pub struct Caller {
    pub claims: Claims,
    pub correlation_id: Option<String>,
}

impl Caller {
    pub fn metadata(&self) -> Option<OperationMetadata> {
        Some(self.claims.metadata(self.correlation_id.as_deref()))
    }

    /// Refuses with 403 unless the caller holds a role allowed to run `action`
    pub fn authorize(&self, action: Action) -> Result<(), ApiError> {
        authorize(action, &self.claims.roles)?;
        Ok(())
    }

    pub fn authorize_claim_advance(&self, target: ClaimStatus) -> Result<(), ApiError> {
        authorize_claim_advance(target, &self.claims.roles)?;
        Ok(())
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .cloned()
            .ok_or(ApiError::Unauthorized)?;
        let correlation_id = parts.extensions.get::<CorrelationId>().map(|c| c.0.clone());
        Ok(Self { claims, correlation_id })
    }
}

/// Runs the DTO's declarative checks
pub(crate) fn validated<T: Validate>(body: T) -> Result<T, ApiError> {
    body.validate()?;
    Ok(body)
}
