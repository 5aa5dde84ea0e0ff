//! Proposal DTOs

use serde::Deserialize;
use validator::Validate;

/// Body of a proposal rejection
///
/// The reason is checked by the workflow, which refuses blank text.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RejectRequest {
    #[validate(length(max = 2000, message = "Rejection reason is too long"))]
    pub reason: Option<String>,
}
