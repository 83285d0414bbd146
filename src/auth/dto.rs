use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// `null` reads as an empty string, same as an absent key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Request body for registration. Absent or null keys deserialize as empty
/// strings so the validator can report them.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password_confirm: String,
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub password: String,
}

/// Successful login: `token` already carries the `Bearer ` scheme prefix.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

/// Identity of the authenticated caller.
#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TestResponse {
    pub msg: &'static str,
}
