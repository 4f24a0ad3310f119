//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for streaming course generation.

use course_generator_core::domain::{ProgressUpdate, UnitKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Generates every lesson and quiz of a course. The structure is
    /// extracted first if the course does not have one yet.
    Generate { course_id: Uuid },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnitKindMessage {
    Lesson,
    Quiz,
}

impl From<UnitKind> for UnitKindMessage {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Lesson => UnitKindMessage::Lesson,
            UnitKind::Quiz => UnitKindMessage::Quiz,
        }
    }
}

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The structure is known and unit generation is about to begin.
    GenerationStarted {
        course_id: Uuid,
        total_units: usize,
    },

    /// One lesson or quiz has finished. Sent once per unit, in order.
    Progress {
        course_id: Uuid,
        completed_units: usize,
        total_units: usize,
        kind: UnitKindMessage,
        module: String,
        title: String,
        body: String,
        placeholder: bool,
    },

    /// Every unit has finished and the document was stored with the course.
    CourseCompleted {
        course_id: Uuid,
        placeholder_count: usize,
        markdown: String,
    },

    /// Reports a failure to the client, which should display an error message.
    Error { message: String },
}

impl ServerMessage {
    pub fn progress(course_id: Uuid, update: &ProgressUpdate) -> Self {
        ServerMessage::Progress {
            course_id,
            completed_units: update.progress.completed_units,
            total_units: update.progress.total_units,
            kind: update.unit.kind.into(),
            module: update.unit.module.clone(),
            title: update.unit.title.clone(),
            body: update.unit.body.clone(),
            placeholder: update.unit.placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_generator_core::domain::{GenerationProgress, UnitReport};
    use serde_json::json;

    #[test]
    fn generate_message_is_parsed_from_tagged_json() {
        let id = Uuid::new_v4();
        let raw = json!({ "type": "generate", "course_id": id }).to_string();

        let ClientMessage::Generate { course_id } = serde_json::from_str(&raw).unwrap();
        assert_eq!(course_id, id);
    }

    #[test]
    fn progress_message_serializes_with_snake_case_tags() {
        let update = ProgressUpdate {
            progress: GenerationProgress {
                total_units: 3,
                completed_units: 1,
            },
            unit: UnitReport {
                kind: UnitKind::Lesson,
                module: "Basics".to_string(),
                title: "What is X?".to_string(),
                body: "X is a thing.".to_string(),
                placeholder: false,
            },
        };

        let value = serde_json::to_value(ServerMessage::progress(Uuid::nil(), &update)).unwrap();

        assert_eq!(value["type"], "progress");
        assert_eq!(value["kind"], "lesson");
        assert_eq!(value["completed_units"], 1);
        assert_eq!(value["total_units"], 3);
    }
}
