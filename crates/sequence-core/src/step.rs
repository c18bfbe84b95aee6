use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{violation, Db, Violation};
use crate::error::{Result, SequenceError};
use crate::types::{RecordId, Step, StepInput};

const SELECT_STEP: &str = "SELECT id, subject, content, sequence_id FROM sequence_steps";

fn step_from_row(row: &Row<'_>) -> rusqlite::Result<Step> {
    Ok(Step {
        id: row.get(0)?,
        subject: row.get(1)?,
        content: row.get(2)?,
        sequence_id: row.get(3)?,
    })
}

fn map_write_error(err: rusqlite::Error, subject: &str, sequence_id: RecordId) -> SequenceError {
    match violation(&err) {
        Some(Violation::Unique) => {
            tracing::warn!(subject, sequence_id, "step subject collided at the store");
            SequenceError::SubjectTaken(subject.to_string())
        }
        Some(Violation::ForeignKey) => SequenceError::ParentNotFound(sequence_id),
        None => err.into(),
    }
}

/// All steps of one sequence, oldest first.
pub(crate) fn steps_for_sequence(conn: &Connection, sequence_id: RecordId) -> Result<Vec<Step>> {
    let sql = format!("{SELECT_STEP} WHERE sequence_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql)?;
    let steps = stmt
        .query_map(params![sequence_id], step_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(steps)
}

// ---------------------------------------------------------------------------
// StepRegistry
// ---------------------------------------------------------------------------

/// Identity, parent-existence and per-sequence subject uniqueness for steps.
///
/// Callers confirm the parent sequence through
/// [`SequenceRegistry::find_by_id`](crate::SequenceRegistry::find_by_id) and
/// check [`subject_available`](Self::subject_available) before `create`.
/// The store's foreign key and composite unique index back both checks.
#[derive(Clone)]
pub struct StepRegistry {
    db: Db,
}

impl StepRegistry {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub fn find_by_id(&self, id: RecordId) -> Result<Option<Step>> {
        self.db.with_conn(|conn| {
            let sql = format!("{SELECT_STEP} WHERE id = ?1");
            Ok(conn
                .query_row(&sql, params![id], step_from_row)
                .optional()?)
        })
    }

    /// True iff no step under `sequence_id` already uses `subject`.
    pub fn subject_available(&self, subject: &str, sequence_id: RecordId) -> Result<bool> {
        self.db.with_conn(|conn| {
            let taken: bool = conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM sequence_steps WHERE subject = ?1 AND sequence_id = ?2)",
                params![subject, sequence_id],
                |row| row.get(0),
            )?;
            Ok(!taken)
        })
    }

    /// A step of `sequence_id`, other than `exclude_id`, that already uses
    /// `subject`.
    pub fn find_other_with_same_subject(
        &self,
        subject: &str,
        sequence_id: RecordId,
        exclude_id: RecordId,
    ) -> Result<Option<Step>> {
        self.db.with_conn(|conn| {
            let sql = format!("{SELECT_STEP} WHERE subject = ?1 AND sequence_id = ?2 AND id != ?3");
            Ok(conn
                .query_row(&sql, params![subject, sequence_id, exclude_id], step_from_row)
                .optional()?)
        })
    }

    pub fn create(&self, input: &StepInput) -> Result<Step> {
        let step = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sequence_steps (subject, content, sequence_id) VALUES (?1, ?2, ?3)",
                params![input.subject, input.content, input.sequence_id],
            )
            .map_err(|e| map_write_error(e, &input.subject, input.sequence_id))?;
            Ok(Step {
                id: conn.last_insert_rowid(),
                subject: input.subject.clone(),
                content: input.content.clone(),
                sequence_id: input.sequence_id,
            })
        })?;
        tracing::info!(
            id = step.id,
            sequence_id = step.sequence_id,
            subject = %step.subject,
            "created step"
        );
        Ok(step)
    }

    /// Copy `subject` and `content` from `incoming` onto `existing` and
    /// persist them. `sequence_id` is never written.
    pub fn update(&self, existing: &mut Step, incoming: &StepInput) -> Result<()> {
        let mut updated = existing.clone();
        updated.apply(incoming);
        let changed = self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE sequence_steps SET subject = ?1, content = ?2 WHERE id = ?3",
                params![updated.subject, updated.content, updated.id],
            )
            .map_err(|e| map_write_error(e, &updated.subject, updated.sequence_id))
        })?;
        if changed == 0 {
            return Err(SequenceError::StepNotFound(updated.id));
        }
        tracing::info!(id = updated.id, "updated step");
        *existing = updated;
        Ok(())
    }

    /// Permanently remove `step`.
    pub fn delete(&self, step: &Step) -> Result<()> {
        let removed = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "DELETE FROM sequence_steps WHERE id = ?1",
                params![step.id],
            )?)
        })?;
        if removed == 0 {
            return Err(SequenceError::StepNotFound(step.id));
        }
        tracing::info!(id = step.id, sequence_id = step.sequence_id, "deleted step");
        Ok(())
    }
}
