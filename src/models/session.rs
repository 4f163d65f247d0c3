use sqlx::FromRow;

// The caller behind a valid session
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct SessionUser {
    pub user_id: i64,
    pub tenant_id: i64,
}
