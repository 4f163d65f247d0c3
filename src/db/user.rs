use sqlx::{mysql::MySqlConnection, MySqlPool};

use crate::models::user::User;

pub const SELECT_USER: &str = "SELECT id, tenant_id, email, first_name, last_name, phone_no, \
     password_hash, is_active, created_date FROM users";

pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone_no: Option<&'a str>,
}

pub async fn insert_user(
    conn: &mut MySqlConnection,
    tenant_id: i64,
    user: &NewUser<'_>,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO users (tenant_id, email, first_name, last_name, phone_no, password_hash)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(tenant_id)
    .bind(user.email)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.phone_no)
    .bind(user.password_hash)
    .execute(conn)
    .await?;
    Ok(result.last_insert_id() as i64)
}

pub async fn create_user(
    pool: &MySqlPool,
    tenant_id: i64,
    user: &NewUser<'_>,
) -> Result<User, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let id = insert_user(&mut *conn, tenant_id, user).await?;
    sqlx::query_as::<_, User>(&format!("{} WHERE id = ?", SELECT_USER))
        .bind(id)
        .fetch_one(&mut *conn)
        .await
}

pub async fn get_user(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{} WHERE id = ? AND tenant_id = ?", SELECT_USER))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_all_users(pool: &MySqlPool, tenant_id: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{} WHERE tenant_id = ? ORDER BY id", SELECT_USER))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

pub async fn find_user_by_email(pool: &MySqlPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("{} WHERE email = ?", SELECT_USER))
        .bind(email)
        .fetch_optional(pool)
        .await
}

// Membership check used before assigning work or watching a project
pub async fn user_in_tenant(pool: &MySqlPool, tenant_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ? AND tenant_id = ?")
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
