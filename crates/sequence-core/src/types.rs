use serde::{Deserialize, Serialize};

/// Store-assigned primary key. Always non-negative.
pub type RecordId = i64;

/// Parse a path identifier. Only non-negative integers that fit the store's
/// key type are accepted.
pub fn parse_id(raw: &str) -> Option<RecordId> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u64 = raw.parse().ok()?;
    RecordId::try_from(value).ok()
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// A persisted sequence. Its steps are not part of this representation;
/// see [`SequenceWithSteps`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub id: RecordId,
    pub name: String,
    pub open_tracking_enabled: bool,
    pub click_tracking_enabled: bool,
}

impl Sequence {
    /// Copy the mutable fields of `incoming` onto this record.
    pub fn apply(&mut self, incoming: &SequenceInput) {
        self.name = incoming.name.clone();
        self.open_tracking_enabled = incoming.open_tracking_enabled;
        self.click_tracking_enabled = incoming.click_tracking_enabled;
    }
}

/// Request body for creating or updating a sequence.
///
/// Missing fields decode to their zero value and are rejected by validation
/// rather than by the decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub open_tracking_enabled: bool,
    #[serde(default)]
    pub click_tracking_enabled: bool,
}

impl SequenceInput {
    pub fn new(name: impl Into<String>, open_tracking: bool, click_tracking: bool) -> Self {
        Self {
            name: name.into(),
            open_tracking_enabled: open_tracking,
            click_tracking_enabled: click_tracking,
        }
    }
}

/// Composed view of a sequence and its steps in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceWithSteps {
    pub sequence: Sequence,
    pub steps: Vec<Step>,
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: RecordId,
    pub subject: String,
    pub content: String,
    pub sequence_id: RecordId,
}

impl Step {
    /// Copy `subject` and `content` from `incoming`. The owning sequence is
    /// fixed at creation and never changes here.
    pub fn apply(&mut self, incoming: &StepInput) {
        self.subject = incoming.subject.clone();
        self.content = incoming.content.clone();
    }
}

/// Request body for creating or updating a step. `sequence_id` is ignored on
/// update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepInput {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sequence_id: RecordId,
}

impl StepInput {
    pub fn new(
        subject: impl Into<String>,
        content: impl Into<String>,
        sequence_id: RecordId,
    ) -> Self {
        Self {
            subject: subject.into(),
            content: content.into(),
            sequence_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_non_negative_integers() {
        assert_eq!(parse_id("0"), Some(0));
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id("9223372036854775807"), Some(i64::MAX));
    }

    #[test]
    fn parse_id_rejects_everything_else() {
        for raw in [
            "",
            "-1",
            "+5",
            "abc",
            "1.5",
            " 7",
            "18446744073709551615",
        ] {
            assert_eq!(parse_id(raw), None, "expected rejection: {raw:?}");
        }
    }

    #[test]
    fn sequence_serializes_camel_case() {
        let seq = Sequence {
            id: 3,
            name: "Sequence1".into(),
            open_tracking_enabled: false,
            click_tracking_enabled: true,
        };
        let json = serde_json::to_value(&seq).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["openTrackingEnabled"], false);
        assert_eq!(json["clickTrackingEnabled"], true);
        assert!(json.get("steps").is_none());
    }

    #[test]
    fn missing_input_fields_default_to_zero_values() {
        let input: StepInput = serde_json::from_str(r#"{"subject":"Step1"}"#).unwrap();
        assert_eq!(input.subject, "Step1");
        assert_eq!(input.content, "");
        assert_eq!(input.sequence_id, 0);
    }

    #[test]
    fn wrong_field_type_fails_to_decode() {
        let result: std::result::Result<SequenceInput, _> =
            serde_json::from_str(r#"{"name":"Sequence123","openTrackingEnabled":"abc"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn step_apply_keeps_sequence_id() {
        let mut step = Step {
            id: 1,
            subject: "Step1".into(),
            content: "blah contents".into(),
            sequence_id: 7,
        };
        step.apply(&StepInput::new("Other", "other body", 99));
        assert_eq!(step.subject, "Other");
        assert_eq!(step.content, "other body");
        assert_eq!(step.sequence_id, 7);
    }
}
