//! Contact form endpoint.
//!
//! Submissions are validated, logged and kept in memory. Nothing is sent.

use crate::error::ApiError;
use crate::{AppState, RequireAdmin};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use folio_types::{ItemId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A contact form as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A stored submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: ItemId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub timestamp: Timestamp,
}

impl ContactRequest {
    /// Checks required fields and the email shape.
    pub fn validate(self) -> Result<ContactSubmission, ApiError> {
        fn required(field: Option<String>) -> Result<String, ApiError> {
            field
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiError::BadRequest("All fields are required".to_string()))
        }

        let submission = ContactSubmission {
            id: ItemId::new(),
            first_name: required(self.first_name)?,
            last_name: required(self.last_name)?,
            email: required(self.email)?,
            subject: required(self.subject)?,
            message: required(self.message)?,
            timestamp: Timestamp::now(),
        };
        if !is_valid_email(&submission.email) {
            return Err(ApiError::BadRequest("Invalid email format".to_string()));
        }
        Ok(submission)
    }
}

/// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain
/// with text on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// In-memory submission log.
#[derive(Debug, Clone, Default)]
pub struct ContactLog {
    submissions: Arc<RwLock<Vec<ContactSubmission>>>,
}

impl ContactLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, submission: ContactSubmission) -> usize {
        let mut submissions = self.submissions.write().await;
        submissions.push(submission);
        submissions.len()
    }

    pub async fn list(&self) -> Vec<ContactSubmission> {
        self.submissions.read().await.clone()
    }
}

pub(crate) async fn submit(
    State(state): State<AppState>,
    body: Result<Json<ContactRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) =
        body.map_err(|_| ApiError::BadRequest("All fields are required".to_string()))?;
    let submission = request.validate()?;

    info!(
        from = %format!("{} {} <{}>", submission.first_name, submission.last_name, submission.email),
        subject = %submission.subject,
        "Contact form submission"
    );
    let total = state.contacts.push(submission).await;
    info!("Contact submission stored. Total: {}", total);

    Ok(Json(json!({
        "success": true,
        "message": "Your message has been sent successfully! I'll get back to you soon."
    })))
}

pub(crate) async fn submissions(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Json<Vec<ContactSubmission>> {
    Json(state.contacts.list().await)
}
