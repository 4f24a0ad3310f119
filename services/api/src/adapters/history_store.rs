//! services/api/src/adapters/history_store.rs
//!
//! This module contains the chat-history adapter, the concrete implementation
//! of the `ChatHistoryStore` port. History lives in a local JSON key-value file;
//! the turns are the record under the fixed key `"messages"`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_generator_core::domain::{ChatRole, ChatTurn};
use course_generator_core::ports::{ChatHistoryStore, StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// Key of the chat-history record inside the store file.
pub const MESSAGES_KEY: &str = "messages";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed store that implements the `ChatHistoryStore` port.
pub struct JsonFileHistoryStore {
    path: PathBuf,
    // Serialises read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_records(&self) -> StoreResult<Map<String, Value>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(records)) => Ok(records),
            Ok(_) => Err(StoreError::Corrupt(
                "the store file is not a JSON object".to_string(),
            )),
            Err(e) => Err(StoreError::Corrupt(e.to_string())),
        }
    }

    // Callers hold `self.lock`.
    async fn write_turns(
        &self,
        mut records: Map<String, Value>,
        turns: &[ChatTurn],
    ) -> StoreResult<()> {
        let turns: Vec<ChatTurnRecord> = turns.iter().map(ChatTurnRecord::from_domain).collect();
        let messages =
            serde_json::to_value(turns).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        records.insert(MESSAGES_KEY.to_string(), messages);

        let body = serde_json::to_string_pretty(&Value::Object(records))
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tokio::fs::write(&self.path, body).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RoleRecord {
    User,
    Assistant,
}

#[derive(Serialize, Deserialize)]
struct ChatTurnRecord {
    role: RoleRecord,
    content: String,
    created_at: DateTime<Utc>,
}

impl ChatTurnRecord {
    fn from_domain(turn: &ChatTurn) -> Self {
        Self {
            role: match turn.role {
                ChatRole::User => RoleRecord::User,
                ChatRole::Assistant => RoleRecord::Assistant,
            },
            content: turn.content.clone(),
            created_at: turn.created_at,
        }
    }

    fn to_domain(self) -> ChatTurn {
        ChatTurn {
            role: match self.role {
                RoleRecord::User => ChatRole::User,
                RoleRecord::Assistant => ChatRole::Assistant,
            },
            content: self.content,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `ChatHistoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatHistoryStore for JsonFileHistoryStore {
    async fn load_history(&self) -> StoreResult<Vec<ChatTurn>> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;
        take_turns(&mut records)
    }

    /// Overwrites the `"messages"` record wholesale; other records in the
    /// file are kept.
    async fn save_history(&self, turns: &[ChatTurn]) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let records = self.read_records().await?;
        self.write_turns(records, turns).await
    }

    async fn append_history(&self, turns: &[ChatTurn]) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_records().await?;
        let mut history = take_turns(&mut records)?;
        history.extend_from_slice(turns);
        self.write_turns(records, &history).await
    }
}

fn take_turns(records: &mut Map<String, Value>) -> StoreResult<Vec<ChatTurn>> {
    let Some(messages) = records.remove(MESSAGES_KEY) else {
        return Ok(Vec::new());
    };
    let turns: Vec<ChatTurnRecord> =
        serde_json::from_value(messages).map_err(|e| StoreError::Corrupt(e.to_string()))?;
    Ok(turns.into_iter().map(ChatTurnRecord::to_domain).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_loads_as_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));

        assert!(store.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn saved_turns_load_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));
        let turns = vec![
            ChatTurn::user("Course 'Intro to X'"),
            ChatTurn::assistant("| Module | Lesson |"),
        ];

        store.save_history(&turns).await.unwrap();

        assert_eq!(store.load_history().await.unwrap(), turns);
    }

    #[tokio::test]
    async fn save_overwrites_and_clear_empties() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHistoryStore::new(dir.path().join("history.json"));

        store
            .save_history(&[ChatTurn::user("first"), ChatTurn::assistant("reply")])
            .await
            .unwrap();
        store.save_history(&[ChatTurn::user("second")]).await.unwrap();

        let loaded = store.load_history().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content, "second");

        store.clear_history().await.unwrap();
        assert!(store.load_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_records_survive_a_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        tokio::fs::write(&path, r#"{"settings": {"theme": "dark"}}"#)
            .await
            .unwrap();
        let store = JsonFileHistoryStore::new(&path);

        store.save_history(&[ChatTurn::user("hello")]).await.unwrap();

        let raw: Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["settings"]["theme"], "dark");
        assert_eq!(raw[MESSAGES_KEY][0]["role"], "user");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_keep_every_turn() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JsonFileHistoryStore::new(dir.path().join("history.json")));
        store.save_history(&[ChatTurn::user("seed")]).await.unwrap();

        let appends: Vec<_> = (0..20)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append_history(&[
                            ChatTurn::user(format!("request {i}")),
                            ChatTurn::assistant(format!("outline {i}")),
                        ])
                        .await
                })
            })
            .collect();
        for append in appends {
            append.await.unwrap().unwrap();
        }

        let loaded = store.load_history().await.unwrap();
        assert_eq!(loaded.len(), 41);
        assert_eq!(loaded[0].content, "seed");
        // Each append lands as an adjacent user/assistant pair.
        for pair in loaded[1..].chunks(2) {
            let i = pair[0].content.trim_start_matches("request ");
            assert_eq!(pair[1].content, format!("outline {i}"));
        }
    }

    #[tokio::test]
    async fn garbage_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        let store = JsonFileHistoryStore::new(&path);

        assert!(matches!(
            store.load_history().await.unwrap_err(),
            StoreError::Corrupt(_)
        ));
    }
}
