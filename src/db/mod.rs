// src/db/mod.rs
//
// Data access, one module per entity. Every function takes the caller's
// tenant and never touches rows of another tenant.

use sqlx::{mysql::MySqlConnection, Encode, MySql, QueryBuilder, Type};

pub mod changes;
pub mod cost;
pub mod keyword;
pub mod project;
pub mod risk_impact;
pub mod session;
pub mod task;
pub mod tenant;
pub mod user;
pub mod user_notification;
pub mod user_watching;
pub mod wbs;
pub mod workflow_event_log;
pub mod workflow_flowchart;
pub mod workflow_task_assoc;

#[cfg(test)]
pub mod test_support;

/// `UPDATE <table> SET ...` that only assigns the columns present in a
/// partial update body.
pub struct PartialUpdate {
    query: QueryBuilder<'static, MySql>,
    assignments: usize,
}

impl PartialUpdate {
    pub fn new(table: &str) -> Self {
        PartialUpdate {
            query: QueryBuilder::new(format!("UPDATE {} SET ", table)),
            assignments: 0,
        }
    }

    pub fn set<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'static + Encode<'static, MySql> + Type<MySql> + Send,
    {
        if let Some(value) = value {
            if self.assignments > 0 {
                self.query.push(", ");
            }
            self.query.push(column).push(" = ").push_bind(value);
            self.assignments += 1;
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.assignments == 0
    }

    /// Runs the update restricted by `column = value` pairs joined with AND.
    /// Returns the number of rows affected.
    pub async fn execute(
        mut self,
        conn: &mut MySqlConnection,
        filters: &[(&str, i64)],
    ) -> Result<u64, sqlx::Error> {
        if self.is_empty() {
            return Ok(0);
        }
        self.query.push(" WHERE ");
        for (i, (column, value)) in filters.iter().enumerate() {
            if i > 0 {
                self.query.push(" AND ");
            }
            self.query.push(*column).push(" = ").push_bind(*value);
        }
        let result = self.query.build().execute(conn).await?;
        Ok(result.rows_affected())
    }

    #[cfg(test)]
    pub fn sql(&self) -> &str {
        self.query.sql()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_present_fields_are_assigned() {
        let mut update = PartialUpdate::new("costs");
        update
            .set("name", Some("Laptop".to_string()))
            .set::<String>("currency", None)
            .set("quantity", Some(3_i32));

        assert!(!update.is_empty());
        assert_eq!(update.sql(), "UPDATE costs SET name = ?, quantity = ?");
    }

    #[test]
    fn empty_update_has_no_assignments() {
        let mut update = PartialUpdate::new("keywords");
        update.set::<String>("name", None);
        assert!(update.is_empty());
    }
}
