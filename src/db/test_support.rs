// Rows shared by the database tests. Each `#[sqlx::test]` runs against its
// own freshly migrated database, so ids start at 1 but are read back anyway.

use chrono::NaiveDate;
use sqlx::MySqlPool;

#[derive(Debug, Clone, Copy)]
pub struct Seed {
    pub tenant_id: i64,
    pub user_id: i64,
    pub project_id: i64,
}

/// A tenant with one active user and one project.
pub async fn seed_tenant(pool: &MySqlPool, name: &str) -> Seed {
    let tenant_id = sqlx::query("INSERT INTO tenants (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_id() as i64;
    let user_id = seed_user(pool, tenant_id, &format!("admin@{}.example.com", name.to_lowercase())).await;
    let project_id = sqlx::query("INSERT INTO projects (tenant_id, name) VALUES (?, ?)")
        .bind(tenant_id)
        .bind(format!("{} rollout", name))
        .execute(pool)
        .await
        .unwrap()
        .last_insert_id() as i64;

    Seed {
        tenant_id,
        user_id,
        project_id,
    }
}

pub async fn seed_user(pool: &MySqlPool, tenant_id: i64, email: &str) -> i64 {
    sqlx::query("INSERT INTO users (tenant_id, email, phone_no, password_hash) VALUES (?, ?, ?, ?)")
        .bind(tenant_id)
        .bind(email)
        .bind("+15550100")
        .bind("not-a-real-hash")
        .execute(pool)
        .await
        .unwrap()
        .last_insert_id() as i64
}

pub async fn seed_task(pool: &MySqlPool, seed: Seed, name: &str, due_date: Option<NaiveDate>) -> i64 {
    sqlx::query("INSERT INTO tasks (tenant_id, project_id, name, assigned_to, due_date) VALUES (?, ?, ?, ?, ?)")
        .bind(seed.tenant_id)
        .bind(seed.project_id)
        .bind(name)
        .bind(seed.user_id)
        .bind(due_date)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_id() as i64
}

pub async fn count(pool: &MySqlPool, sql: &str, id: i64) -> i64 {
    sqlx::query_scalar(sql).bind(id).fetch_one(pool).await.unwrap()
}
