//! HTTP implementation of the sign-up collaborators.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    error::ApiError,
    protocol::{
        check_user_route, create_user_route, sign_in_route, CheckUserRequest, CheckUserResponse,
        CreateUserRequest, CreateUserResponse, SignInRequest, SignInResponse,
    },
};
use tracing::debug;

use crate::{
    controller::{CreateOutcome, CreateRecord, EmailCheck, ExistsCheck, NewAccount},
    error::CollaboratorError,
};

/// Talks to the sign-up API of a running server. One value serves as both the
/// existence check and the create collaborator.
#[derive(Clone)]
pub struct HttpSignupBackend {
    http: Client,
    server_url: String,
}

impl HttpSignupBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}{route}", self.server_url)
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResponse, CollaboratorError> {
        let response = self
            .http
            .post(self.endpoint(sign_in_route()))
            .json(&SignInRequest {
                email: email.trim().to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return response
                .json::<SignInResponse>()
                .await
                .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()));
        }
        Err(server_error(response).await)
    }
}

#[async_trait]
impl ExistsCheck for HttpSignupBackend {
    async fn check_email(&self, email: &str) -> Result<EmailCheck, CollaboratorError> {
        let response = self
            .http
            .post(self.endpoint(check_user_route()))
            .json(&CheckUserRequest {
                email: email.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(server_error(response).await);
        }

        let body: CheckUserResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        debug!(email_exists = body.email_exists, "email existence check settled");
        Ok(EmailCheck {
            email_exists: body.email_exists,
        })
    }
}

#[async_trait]
impl CreateRecord for HttpSignupBackend {
    async fn create_record(
        &self,
        account: &NewAccount,
    ) -> Result<CreateOutcome, CollaboratorError> {
        let response = self
            .http
            .post(self.endpoint(create_user_route()))
            .json(&CreateUserRequest {
                first_name: account.first_name.clone(),
                last_name: account.last_name.clone(),
                email: account.email.clone(),
                password: account.password.clone(),
            })
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        // The route answers rejections and server faults with the same
        // `{success, error}` body, so the body decides before the status does.
        match response.json::<CreateUserResponse>().await {
            Ok(body) if body.success => Ok(CreateOutcome::Created),
            Ok(body) => Ok(CreateOutcome::Rejected { error: body.error }),
            Err(err) if status.is_success() => {
                Err(CollaboratorError::InvalidResponse(err.to_string()))
            }
            Err(_) => Err(CollaboratorError::Server {
                status: status.as_u16(),
                message: default_status_message(status),
            }),
        }
    }
}

fn transport(err: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Transport(err.to_string())
}

async fn server_error(response: Response) -> CollaboratorError {
    let status = response.status();
    let message = response
        .json::<ApiError>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| default_status_message(status));
    CollaboratorError::Server {
        status: status.as_u16(),
        message,
    }
}

fn default_status_message(status: StatusCode) -> String {
    format!("The server responded with status {}", status.as_u16())
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
