//! Client for the hosted auth admin API.
//!
//! Only invitations are needed: the hosted service creates the account and
//! emails the invite link. Requests authenticate with the service key.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared::roles::BaseRole;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::BackendConfig;

#[derive(Debug, Error)]
pub enum AuthAdminError {
    #[error("Hosted backend is not configured")]
    NotConfigured,

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Request to hosted auth failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Hosted auth rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from hosted auth")]
    UnexpectedResponse,
}

#[derive(Debug, Serialize)]
struct InviteData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
    role: &'a str,
}

#[derive(Debug, Serialize)]
struct InviteBody<'a> {
    email: &'a str,
    data: InviteData<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct InvitedUser {
    id: Uuid,
}

/// The invite endpoint returns the user object, either bare or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InviteResponse {
    Bare(InvitedUser),
    Wrapped { user: InvitedUser },
}

/// Parameters of an invitation.
#[derive(Debug, Clone)]
pub struct Invite<'a> {
    pub email: &'a str,
    pub full_name: Option<&'a str>,
    pub role: BaseRole,
    pub redirect_to: Option<&'a str>,
}

#[derive(Clone)]
pub struct AuthAdminClient {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl std::fmt::Debug for AuthAdminClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthAdminClient")
            .field("base_url", &self.base_url)
            .field("service_key", &"[REDACTED]")
            .finish()
    }
}

impl AuthAdminClient {
    pub fn new(config: &BackendConfig) -> Result<Self, AuthAdminError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn invite_url(&self) -> Result<url::Url, AuthAdminError> {
        if self.base_url.is_empty() || self.service_key.is_empty() {
            return Err(AuthAdminError::NotConfigured);
        }
        url::Url::parse(&format!("{}/auth/v1/invite", self.base_url))
            .map_err(|e| AuthAdminError::InvalidUrl(e.to_string()))
    }

    /// Invites a user by email and returns the new auth user id.
    pub async fn invite_user(&self, invite: &Invite<'_>) -> Result<Uuid, AuthAdminError> {
        let url = self.invite_url()?;
        let body = InviteBody {
            email: invite.email,
            data: InviteData {
                full_name: invite.full_name,
                role: invite.role.as_str(),
            },
            redirect_to: invite.redirect_to,
        };

        let response = self
            .client
            .post(url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(status = %status, email = %invite.email, "Invitation rejected by hosted auth");
            return Err(AuthAdminError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let user_id = match response
            .json::<InviteResponse>()
            .await
            .map_err(|_| AuthAdminError::UnexpectedResponse)?
        {
            InviteResponse::Bare(user) | InviteResponse::Wrapped { user } => user.id,
        };

        info!(user_id = %user_id, role = %invite.role, "User invited");
        Ok(user_id)
    }
}
