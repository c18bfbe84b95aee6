//! Field-level checks applied to decoded request bodies before any registry
//! call. Every failing field is reported in one message.

use crate::error::{Result, SequenceError};
use crate::types::{SequenceInput, StepInput};
use regex::Regex;
use std::sync::OnceLock;

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 30;
pub const SUBJECT_MIN_LEN: usize = 3;
pub const CONTENT_MIN_LEN: usize = 3;

static ALPHANUM_RE: OnceLock<Regex> = OnceLock::new();

fn alphanum_re() -> &'static Regex {
    ALPHANUM_RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap())
}

/// Accumulates per-field failures.
#[derive(Default)]
struct Violations(Vec<String>);

impl Violations {
    fn required_min(&mut self, field: &str, value: &str, min: usize) {
        if value.is_empty() {
            self.0.push(format!("{field}: non zero value required"));
        } else if value.chars().count() < min {
            self.0.push(format!("{field}: must be at least {min} characters"));
        }
    }

    fn max(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.0.push(format!("{field}: must be at most {max} characters"));
        }
    }

    fn alphanumeric(&mut self, field: &str, value: &str) {
        if !value.is_empty() && !alphanum_re().is_match(value) {
            self.0.push(format!("{field}: must contain only letters and digits"));
        }
    }

    fn finish(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(SequenceError::Validation(self.0.join("; ")))
        }
    }
}

impl SequenceInput {
    pub fn validate(&self) -> Result<()> {
        let mut v = Violations::default();
        v.required_min("name", &self.name, NAME_MIN_LEN);
        v.max("name", &self.name, NAME_MAX_LEN);
        v.alphanumeric("name", &self.name);
        v.finish()
    }
}

impl StepInput {
    pub fn validate(&self) -> Result<()> {
        let mut v = Violations::default();
        v.required_min("subject", &self.subject, SUBJECT_MIN_LEN);
        v.required_min("content", &self.content, CONTENT_MIN_LEN);
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(err: SequenceError) -> String {
        match err {
            SequenceError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn name_at_boundaries() {
        assert!(SequenceInput::new("abc", false, false).validate().is_ok());
        assert!(SequenceInput::new("a".repeat(30), false, false)
            .validate()
            .is_ok());

        let short = SequenceInput::new("ab", false, false).validate().unwrap_err();
        assert!(message(short).contains("at least 3"));
        let long = SequenceInput::new("a".repeat(31), false, false)
            .validate()
            .unwrap_err();
        assert!(message(long).contains("at most 30"));
    }

    #[test]
    fn name_must_be_alphanumeric() {
        for name in ["has space", "dash-ed", "under_score", "ümlaut"] {
            let err = SequenceInput::new(name, true, true).validate().unwrap_err();
            assert!(message(err).contains("letters and digits"), "{name}");
        }
    }

    #[test]
    fn empty_name_is_required() {
        let err = SequenceInput::default().validate().unwrap_err();
        assert!(message(err).contains("name: non zero value required"));
    }

    #[test]
    fn step_fields_at_boundaries() {
        assert!(StepInput::new("abc", "xyz", 1).validate().is_ok());

        let err = StepInput::new("ab", "xyz", 1).validate().unwrap_err();
        assert!(message(err).contains("subject: must be at least 3"));

        let err = StepInput::new("blah", "a", 1).validate().unwrap_err();
        assert!(message(err).contains("content: must be at least 3"));
    }

    #[test]
    fn all_failing_fields_are_reported() {
        let err = StepInput::new("", "a", 1).validate().unwrap_err();
        let msg = message(err);
        assert!(msg.contains("subject: non zero value required"));
        assert!(msg.contains("content: must be at least 3"));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert!(StepInput::new("äöü", "日本語", 1).validate().is_ok());
    }
}
