use std::fmt::Display;

/// An updated row, the row as it was before, and what changed.
#[derive(Debug)]
pub struct Updated<T> {
    pub row: T,
    pub previous: T,
    pub changes: ChangeLog,
}

/// Field-level change detection for history rows and watcher messages.
#[derive(Debug, Default)]
pub struct ChangeLog {
    changes: Vec<String>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track<T>(&mut self, field: &str, current: &T, proposed: Option<&T>)
    where
        T: PartialEq + Display + ?Sized,
    {
        if let Some(proposed) = proposed {
            if proposed != current {
                self.push(field, proposed);
            }
        }
    }

    // For nullable columns; setting a value on an empty column counts as a change
    pub fn track_optional<T>(&mut self, field: &str, current: Option<&T>, proposed: Option<&T>)
    where
        T: PartialEq + Display + ?Sized,
    {
        if let Some(proposed) = proposed {
            if current != Some(proposed) {
                self.push(field, proposed);
            }
        }
    }

    fn push<T: Display + ?Sized>(&mut self, field: &str, value: &T) {
        self.changes
            .push(format!("Updated {} to {}", field.replace('_', " "), value));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.changes
    }

    /// One line for the watcher notification.
    pub fn summary(&self) -> String {
        self.changes.join(".    ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unchanged_and_absent_fields_are_ignored() {
        let mut log = ChangeLog::new();
        log.track("name", "Phase 1", Some("Phase 1"));
        log.track::<str>("description", "old", None);
        assert!(log.is_empty());
        assert_eq!(log.summary(), "");
    }

    #[test]
    fn changes_are_named_with_spaces_and_joined() {
        let mut log = ChangeLog::new();
        log.track("name", "Phase 1", Some("Phase 2"));
        log.track_optional("user_id", None, Some(&7_i64));
        log.track_optional("due_date", Some("2024-01-01"), Some("2024-01-01"));

        assert_eq!(
            log.entries(),
            &["Updated name to Phase 2".to_string(), "Updated user id to 7".to_string()]
        );
        assert_eq!(log.summary(), "Updated name to Phase 2.    Updated user id to 7");
    }
}
