use std::collections::{BTreeMap, BTreeSet};

use sqlx::{mysql::MySqlConnection, MySqlPool};

use crate::db::PartialUpdate;
use crate::models::keyword::Keyword;

const SELECT_KEYWORD: &str =
    "SELECT id, tenant_id, name, created_date, last_updated_date FROM keywords";

/// Objects keywords can be attached to through `keyword_mappings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordTarget {
    Project(i64),
    Wbs(i64),
    Task(i64),
}

impl KeywordTarget {
    pub fn column(&self) -> &'static str {
        match self {
            KeywordTarget::Project(_) => "project_id",
            KeywordTarget::Wbs(_) => "wbs_id",
            KeywordTarget::Task(_) => "task_id",
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            KeywordTarget::Project(id) | KeywordTarget::Wbs(id) | KeywordTarget::Task(id) => id,
        }
    }
}

/// Folds a keyword name the way the `keywords` unique key compares it.
pub fn keyword_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Splits a comma separated keyword list, trimming names and dropping blanks.
/// Names that differ only in case collapse to the first spelling given; the
/// map is keyed by `keyword_key`.
pub fn parse_keyword_list(keywords: &str) -> BTreeMap<String, String> {
    let mut parsed = BTreeMap::new();
    for name in keywords.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        parsed.entry(keyword_key(name)).or_insert_with(|| name.to_string());
    }
    parsed
}

/// Returns `None` when the tenant already has a keyword with that name.
pub async fn create_keyword(
    pool: &MySqlPool,
    tenant_id: i64,
    name: &str,
) -> Result<Option<Keyword>, sqlx::Error> {
    if find_keyword_by_name(&mut *pool.acquire().await?, tenant_id, name)
        .await?
        .is_some()
    {
        return Ok(None);
    }

    let result = sqlx::query("INSERT INTO keywords (tenant_id, name) VALUES (?, ?)")
        .bind(tenant_id)
        .bind(name)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, Keyword>(&format!("{} WHERE id = ?", SELECT_KEYWORD))
        .bind(result.last_insert_id() as i64)
        .fetch_optional(pool)
        .await
}

async fn find_keyword_by_name(
    conn: &mut MySqlConnection,
    tenant_id: i64,
    name: &str,
) -> Result<Option<Keyword>, sqlx::Error> {
    sqlx::query_as::<_, Keyword>(&format!("{} WHERE tenant_id = ? AND name = ?", SELECT_KEYWORD))
        .bind(tenant_id)
        .bind(name)
        .fetch_optional(conn)
        .await
}

pub async fn get_all_keywords(pool: &MySqlPool, tenant_id: i64) -> Result<Vec<Keyword>, sqlx::Error> {
    sqlx::query_as::<_, Keyword>(&format!("{} WHERE tenant_id = ? ORDER BY name", SELECT_KEYWORD))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
}

pub async fn get_keyword(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<Option<Keyword>, sqlx::Error> {
    sqlx::query_as::<_, Keyword>(&format!("{} WHERE id = ? AND tenant_id = ?", SELECT_KEYWORD))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
}

pub async fn update_keyword(
    pool: &MySqlPool,
    tenant_id: i64,
    id: i64,
    name: Option<&str>,
) -> Result<Option<Keyword>, sqlx::Error> {
    if get_keyword(pool, tenant_id, id).await?.is_none() {
        return Ok(None);
    }

    let mut query = PartialUpdate::new("keywords");
    query.set("name", name.map(str::to_string));
    query
        .execute(&mut *pool.acquire().await?, &[("id", id), ("tenant_id", tenant_id)])
        .await?;

    get_keyword(pool, tenant_id, id).await
}

/// Deletes the keyword and every mapping that references it.
pub async fn delete_keyword(pool: &MySqlPool, tenant_id: i64, id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM keywords WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;
    if exists == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM keyword_mappings WHERE keyword_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM keywords WHERE id = ? AND tenant_id = ?")
        .bind(id)
        .bind(tenant_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Makes the keywords mapped to `target` equal to the comma separated list:
/// unknown names become tenant keywords, missing mappings are added and
/// mappings whose keyword is not listed are dropped. An empty list clears all.
pub async fn sync_keywords(
    conn: &mut MySqlConnection,
    tenant_id: i64,
    target: KeywordTarget,
    keywords: &str,
) -> Result<(), sqlx::Error> {
    let wanted = parse_keyword_list(keywords);
    let column = target.column();

    let mapped: Vec<(i64, String)> = sqlx::query_as(&format!(
        "SELECT k.id, k.name FROM keyword_mappings m
         JOIN keywords k ON m.keyword_id = k.id
         WHERE m.{} = ?",
        column
    ))
    .bind(target.id())
    .fetch_all(&mut *conn)
    .await?;

    let mut mapped_ids = BTreeSet::new();
    let mut mapped_keys = BTreeSet::new();
    for (keyword_id, name) in &mapped {
        let key = keyword_key(name);
        if wanted.contains_key(&key) {
            mapped_ids.insert(*keyword_id);
            mapped_keys.insert(key);
            continue;
        }
        sqlx::query(&format!(
            "DELETE FROM keyword_mappings WHERE keyword_id = ? AND {} = ?",
            column
        ))
        .bind(keyword_id)
        .bind(target.id())
        .execute(&mut *conn)
        .await?;
    }

    for (key, name) in &wanted {
        if mapped_keys.contains(key) {
            continue;
        }
        let keyword_id = match find_keyword_by_name(&mut *conn, tenant_id, name).await? {
            Some(keyword) => keyword.id,
            None => sqlx::query("INSERT INTO keywords (tenant_id, name) VALUES (?, ?)")
                .bind(tenant_id)
                .bind(name)
                .execute(&mut *conn)
                .await?
                .last_insert_id() as i64,
        };
        // insert() is false when the keyword is already mapped
        if !mapped_ids.insert(keyword_id) {
            continue;
        }
        sqlx::query(&format!(
            "INSERT INTO keyword_mappings (keyword_id, {}) VALUES (?, ?)",
            column
        ))
        .bind(keyword_id)
        .bind(target.id())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(parsed: &BTreeMap<String, String>) -> Vec<&str> {
        parsed.values().map(String::as_str).collect()
    }

    #[test]
    fn keyword_list_is_trimmed_and_deduplicated() {
        let parsed = parse_keyword_list(" audit, fedramp,,audit ,  ");
        assert_eq!(names(&parsed), vec!["audit", "fedramp"]);
    }

    #[test]
    fn case_variants_collapse_to_first_spelling() {
        let parsed = parse_keyword_list("Audit, audit, AUDIT ,FedRAMP");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("audit").map(String::as_str), Some("Audit"));
        assert_eq!(parsed.get("fedramp").map(String::as_str), Some("FedRAMP"));
    }

    #[test]
    fn empty_list_parses_to_nothing() {
        assert!(parse_keyword_list("").is_empty());
        assert!(parse_keyword_list(" , ,").is_empty());
    }

    #[test]
    fn targets_use_their_own_mapping_column() {
        assert_eq!(KeywordTarget::Wbs(9).column(), "wbs_id");
        assert_eq!(KeywordTarget::Project(1).id(), 1);
    }

    mod database {
        use super::*;
        use crate::db::test_support::{count, seed_task, seed_tenant};
        use crate::errors::ApiError;

        async fn mapped_names(pool: &MySqlPool, task_id: i64) -> Vec<String> {
            sqlx::query_scalar(
                "SELECT k.name FROM keyword_mappings m JOIN keywords k ON m.keyword_id = k.id
                 WHERE m.task_id = ? ORDER BY k.name",
            )
            .bind(task_id)
            .fetch_all(pool)
            .await
            .unwrap()
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn case_variants_map_a_keyword_once(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            let task_id = seed_task(&pool, seed, "Collect evidence", None).await;

            let mut conn = pool.acquire().await.unwrap();
            sync_keywords(&mut conn, seed.tenant_id, KeywordTarget::Task(task_id), "Audit, audit")
                .await
                .unwrap();
            assert_eq!(mapped_names(&pool, task_id).await, vec!["Audit"]);

            sync_keywords(&mut conn, seed.tenant_id, KeywordTarget::Task(task_id), "AUDIT, fedramp")
                .await
                .unwrap();
            assert_eq!(mapped_names(&pool, task_id).await, vec!["Audit", "fedramp"]);

            sync_keywords(&mut conn, seed.tenant_id, KeywordTarget::Task(task_id), "fedramp")
                .await
                .unwrap();
            assert_eq!(mapped_names(&pool, task_id).await, vec!["fedramp"]);
            assert_eq!(
                count(&pool, "SELECT COUNT(*) FROM keywords WHERE tenant_id = ?", seed.tenant_id).await,
                2
            );
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn created_keyword_belongs_to_the_caller(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            let other = seed_tenant(&pool, "Globex").await;

            let keyword = create_keyword(&pool, seed.tenant_id, "Audit").await.unwrap().unwrap();
            assert_eq!(keyword.tenant_id, seed.tenant_id);
            assert!(create_keyword(&pool, seed.tenant_id, "audit").await.unwrap().is_none());

            assert!(get_keyword(&pool, other.tenant_id, keyword.id).await.unwrap().is_none());
            assert!(update_keyword(&pool, other.tenant_id, keyword.id, Some("Mine"))
                .await
                .unwrap()
                .is_none());
            assert!(!delete_keyword(&pool, other.tenant_id, keyword.id).await.unwrap());
            assert!(!delete_keyword(&pool, seed.tenant_id, 999).await.unwrap());
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn renaming_onto_an_existing_keyword_is_a_conflict(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            create_keyword(&pool, seed.tenant_id, "Audit").await.unwrap();
            let fedramp = create_keyword(&pool, seed.tenant_id, "FedRAMP").await.unwrap().unwrap();

            let err = update_keyword(&pool, seed.tenant_id, fedramp.id, Some("audit"))
                .await
                .unwrap_err();
            let err = ApiError::from_write(err, || "Keyword with name audit already exists".into());
            assert!(matches!(err, ApiError::Conflict(_)));
        }

        #[sqlx::test(migrations = "./migrations")]
        async fn deleting_a_keyword_removes_its_mappings(pool: MySqlPool) {
            let seed = seed_tenant(&pool, "Acme").await;
            let task_id = seed_task(&pool, seed, "Collect evidence", None).await;

            let mut conn = pool.acquire().await.unwrap();
            sync_keywords(&mut conn, seed.tenant_id, KeywordTarget::Task(task_id), "Audit")
                .await
                .unwrap();
            sync_keywords(&mut conn, seed.tenant_id, KeywordTarget::Project(seed.project_id), "Audit")
                .await
                .unwrap();
            drop(conn);

            let audit = get_all_keywords(&pool, seed.tenant_id).await.unwrap().remove(0);
            assert!(delete_keyword(&pool, seed.tenant_id, audit.id).await.unwrap());
            assert_eq!(
                count(&pool, "SELECT COUNT(*) FROM keyword_mappings WHERE keyword_id = ?", audit.id).await,
                0
            );
            assert!(mapped_names(&pool, task_id).await.is_empty());
        }
    }
}
