use sqlx::MySqlPool;

use crate::db::user::{insert_user, NewUser};
use crate::models::{tenant::Tenant, user::User};

/// Creates a tenant and its first user in one transaction.
pub async fn create_tenant_with_admin(
    pool: &MySqlPool,
    name: &str,
    admin: NewUser<'_>,
) -> Result<(Tenant, User), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let tenant_id = sqlx::query("INSERT INTO tenants (name) VALUES (?)")
        .bind(name)
        .execute(&mut *tx)
        .await?
        .last_insert_id() as i64;

    let user_id = insert_user(&mut *tx, tenant_id, &admin).await?;

    let tenant = sqlx::query_as::<_, Tenant>("SELECT id, name, created_date FROM tenants WHERE id = ?")
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;
    let user = sqlx::query_as::<_, User>(&format!("{} WHERE id = ?", crate::db::user::SELECT_USER))
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok((tenant, user))
}
