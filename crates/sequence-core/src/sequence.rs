use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{violation, Db, Violation};
use crate::error::{Result, SequenceError};
use crate::types::{RecordId, Sequence, SequenceInput, SequenceWithSteps};

const SELECT_SEQUENCE: &str =
    "SELECT id, name, open_tracking_enabled, click_tracking_enabled FROM sequences";

fn sequence_from_row(row: &Row<'_>) -> rusqlite::Result<Sequence> {
    Ok(Sequence {
        id: row.get(0)?,
        name: row.get(1)?,
        open_tracking_enabled: row.get(2)?,
        click_tracking_enabled: row.get(3)?,
    })
}

fn map_write_error(err: rusqlite::Error, name: &str) -> SequenceError {
    match violation(&err) {
        Some(Violation::Unique) => {
            tracing::warn!(name, "sequence name collided at the store");
            SequenceError::NameTaken(name.to_string())
        }
        _ => err.into(),
    }
}

// ---------------------------------------------------------------------------
// SequenceRegistry
// ---------------------------------------------------------------------------

/// Identity and uniqueness rules for sequences.
///
/// Lookups return `Ok(None)` when nothing matches; absence is a normal
/// outcome here. `create` and `update` do not repeat the caller's uniqueness
/// pre-check, but the store's unique index still rejects a colliding write
/// with [`SequenceError::NameTaken`].
#[derive(Clone)]
pub struct SequenceRegistry {
    db: Db,
}

impl SequenceRegistry {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn find_by_id(&self, id: RecordId) -> Result<Option<Sequence>> {
        self.db.with_conn(|conn| find_by_id(conn, id))
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Sequence>> {
        self.db.with_conn(|conn| {
            let sql = format!("{SELECT_SEQUENCE} WHERE name = ?1");
            Ok(conn
                .query_row(&sql, params![name], sequence_from_row)
                .optional()?)
        })
    }

    /// A sequence other than `exclude_id` that already uses `name`.
    pub fn find_other_with_same_name(
        &self,
        name: &str,
        exclude_id: RecordId,
    ) -> Result<Option<Sequence>> {
        self.db.with_conn(|conn| {
            let sql = format!("{SELECT_SEQUENCE} WHERE name = ?1 AND id != ?2");
            Ok(conn
                .query_row(&sql, params![name, exclude_id], sequence_from_row)
                .optional()?)
        })
    }

    /// Load a sequence together with its steps in creation order.
    ///
    /// Both reads happen under one store lock. If the steps cannot be loaded
    /// the whole lookup reports absence instead of a partial entity.
    pub fn find_with_steps(&self, id: RecordId) -> Result<Option<SequenceWithSteps>> {
        self.db.with_conn(|conn| {
            let Some(sequence) = find_by_id(conn, id)? else {
                return Ok(None);
            };
            match crate::step::steps_for_sequence(conn, sequence.id) {
                Ok(steps) => Ok(Some(SequenceWithSteps { sequence, steps })),
                Err(e) => {
                    tracing::warn!(sequence_id = id, error = %e, "failed to load steps");
                    Ok(None)
                }
            }
        })
    }

    /// Insert a new sequence. Steps are never written here.
    pub fn create(&self, input: &SequenceInput) -> Result<Sequence> {
        let sequence = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sequences (name, open_tracking_enabled, click_tracking_enabled)
                 VALUES (?1, ?2, ?3)",
                params![
                    input.name,
                    input.open_tracking_enabled,
                    input.click_tracking_enabled
                ],
            )
            .map_err(|e| map_write_error(e, &input.name))?;
            Ok(Sequence {
                id: conn.last_insert_rowid(),
                name: input.name.clone(),
                open_tracking_enabled: input.open_tracking_enabled,
                click_tracking_enabled: input.click_tracking_enabled,
            })
        })?;
        tracing::info!(id = sequence.id, name = %sequence.name, "created sequence");
        Ok(sequence)
    }

    /// Copy the mutable fields of `incoming` onto `existing` and persist
    /// them. Only the sequence row is written; its steps are untouched.
    pub fn update(&self, existing: &mut Sequence, incoming: &SequenceInput) -> Result<()> {
        let mut updated = existing.clone();
        updated.apply(incoming);
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE sequences
                 SET name = ?1, open_tracking_enabled = ?2, click_tracking_enabled = ?3
                 WHERE id = ?4",
                params![
                    updated.name,
                    updated.open_tracking_enabled,
                    updated.click_tracking_enabled,
                    updated.id
                ],
            )
            .map_err(|e| map_write_error(e, &updated.name))
        })?;
        if changed == 0 {
            return Err(SequenceError::SequenceNotFound(updated.id));
        }
        tracing::info!(id = updated.id, name = %updated.name, "updated sequence");
        *existing = updated;
        Ok(())
    }
}

fn find_by_id(conn: &Connection, id: RecordId) -> Result<Option<Sequence>> {
    let sql = format!("{SELECT_SEQUENCE} WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], sequence_from_row)
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepRegistry;
    use crate::types::StepInput;
    use std::sync::{Arc, Barrier};

    fn registry() -> SequenceRegistry {
        SequenceRegistry::new(Db::open_in_memory().unwrap())
    }

    #[test]
    fn create_then_find_by_id_and_name() {
        let reg = registry();
        let created = reg
            .create(&SequenceInput::new("Sequence1", false, true))
            .unwrap();
        assert!(created.id > 0);

        let by_id = reg.find_by_id(created.id).unwrap().unwrap();
        assert_eq!(by_id, created);
        let by_name = reg.find_by_name("Sequence1").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[test]
    fn absence_is_none_not_error() {
        let reg = registry();
        assert!(reg.find_by_id(0).unwrap().is_none());
        assert!(reg.find_by_id(12345).unwrap().is_none());
        assert!(reg.find_by_name("Nobody").unwrap().is_none());
        assert!(reg.find_with_steps(1).unwrap().is_none());
    }

    #[test]
    fn name_lookup_is_case_sensitive() {
        let reg = registry();
        reg.create(&SequenceInput::new("Sequence1", false, false))
            .unwrap();
        assert!(reg.find_by_name("sequence1").unwrap().is_none());
        reg.create(&SequenceInput::new("sequence1", false, false))
            .unwrap();
    }

    #[test]
    fn duplicate_name_rejected_by_store() {
        let reg = registry();
        reg.create(&SequenceInput::new("Dup", false, false)).unwrap();
        let err = reg
            .create(&SequenceInput::new("Dup", true, true))
            .unwrap_err();
        assert!(matches!(err, SequenceError::NameTaken(ref n) if n == "Dup"));
    }

    #[test]
    fn find_other_with_same_name_ignores_self() {
        let reg = registry();
        let a = reg.create(&SequenceInput::new("Alpha", false, false)).unwrap();
        let b = reg.create(&SequenceInput::new("Beta", false, false)).unwrap();

        assert!(reg.find_other_with_same_name("Alpha", a.id).unwrap().is_none());
        let other = reg.find_other_with_same_name("Alpha", b.id).unwrap().unwrap();
        assert_eq!(other.id, a.id);
    }

    #[test]
    fn update_copies_fields_and_keeps_steps() {
        let db = Db::open_in_memory().unwrap();
        let reg = SequenceRegistry::new(db.clone());
        let steps = StepRegistry::new(db);

        let mut seq = reg.create(&SequenceInput::new("Before", false, true)).unwrap();
        steps
            .create(&StepInput::new("Step1", "blah contents", seq.id))
            .unwrap();

        reg.update(&mut seq, &SequenceInput::new("After", true, false))
            .unwrap();
        assert_eq!(seq.name, "After");
        assert!(seq.open_tracking_enabled);
        assert!(!seq.click_tracking_enabled);

        let view = reg.find_with_steps(seq.id).unwrap().unwrap();
        assert_eq!(view.sequence, seq);
        assert_eq!(view.steps.len(), 1);
        assert_eq!(view.steps[0].subject, "Step1");
    }

    #[test]
    fn update_to_own_name_succeeds() {
        let reg = registry();
        let mut seq = reg.create(&SequenceInput::new("Same", false, false)).unwrap();
        reg.update(&mut seq, &SequenceInput::new("Same", true, true))
            .unwrap();
        assert!(reg.find_by_id(seq.id).unwrap().unwrap().open_tracking_enabled);
    }

    #[test]
    fn update_to_taken_name_leaves_record_unchanged() {
        let reg = registry();
        reg.create(&SequenceInput::new("Taken", false, false)).unwrap();
        let mut seq = reg.create(&SequenceInput::new("Mine", false, false)).unwrap();

        let err = reg
            .update(&mut seq, &SequenceInput::new("Taken", true, true))
            .unwrap_err();
        assert!(matches!(err, SequenceError::NameTaken(_)));
        assert_eq!(seq.name, "Mine");
        assert_eq!(reg.find_by_id(seq.id).unwrap().unwrap().name, "Mine");
    }

    #[test]
    fn find_with_steps_on_new_sequence_is_empty() {
        let reg = registry();
        let seq = reg.create(&SequenceInput::new("Fresh", false, false)).unwrap();
        let view = reg.find_with_steps(seq.id).unwrap().unwrap();
        assert!(view.steps.is_empty());
    }

    #[test]
    fn concurrent_creates_admit_exactly_one() {
        let reg = registry();
        let barrier = Arc::new(Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = reg.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    reg.create(&SequenceInput::new("Racer", false, false))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, SequenceError::NameTaken(_))));
    }
}
