use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: i64,
    pub tenant_id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
