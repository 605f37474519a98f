use serde::{Deserialize, Serialize};

use crate::domain::{RecordSummary, UserSummary};

pub fn check_user_route() -> &'static str {
    "/api/check-user"
}

pub fn create_user_route() -> &'static str {
    "/api/create-user"
}

pub fn sign_in_route() -> &'static str {
    "/api/sign-in"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckUserRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckUserResponse {
    pub email_exists: bool,
}

/// Body of `POST /api/create-user`. Missing keys deserialize as empty strings so
/// the route can answer with its own "All fields are required" message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<UserSummary>,
}

impl CreateUserResponse {
    pub fn created(user: UserSummary) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(user),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertRecordRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRecordResponse {
    pub success: bool,
    pub data: RecordSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductInfoRequest {
    pub link: String,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
