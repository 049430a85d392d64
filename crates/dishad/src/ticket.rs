//! Ticket adapter: bounded, redacted support-ticket creation.
//!
//! When guards fail we try to leave a trail for a human, but the
//! response must not wait on a slow store. The adapter redacts PII
//! first, then races the store call against a hard deadline:
//! - done in time: the generated id
//! - deadline hit: the in-flight call is dropped and the sentinel
//!   `TIMEOUT-TICKET` is returned
//! - store error: `None`, the contract goes out without a ticket
//!
//! The adapter never returns an error to the pipeline.

use crate::collaborators::TicketStore;
use crate::redact;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use disha_shared::contract::{ReasonCode, TIMEOUT_TICKET_ID};
use disha_shared::error::DishaError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Prefix for generated ticket ids.
pub const TICKET_PREFIX: &str = "DSH";

/// A persisted support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub reasons: Vec<ReasonCode>,
    pub redacted_text: String,
    pub created_at: DateTime<Utc>,
}

/// Generate an id of the form `DSH-YYYYMMDD-<8 hex chars>`.
pub fn new_ticket_id() -> String {
    let date_part = Utc::now().format("%Y%m%d");
    let unique = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", TICKET_PREFIX, date_part, &unique[..8])
}

pub struct TicketAdapter {
    store: Arc<dyn TicketStore>,
    deadline: Duration,
}

impl TicketAdapter {
    pub fn new(store: Arc<dyn TicketStore>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Redact, then attempt creation under the deadline. All failure
    /// modes degrade to a return value.
    pub async fn create_ticket(
        &self,
        original_text: &str,
        reasons: &[ReasonCode],
        session_id: Option<&str>,
    ) -> Option<String> {
        let redacted = redact::redact(original_text);

        match tokio::time::timeout(self.deadline, self.store.create(&redacted, reasons)).await {
            Ok(Ok(id)) => {
                info!(
                    ticket_id = %id,
                    session_id = session_id.unwrap_or("-"),
                    ?reasons,
                    "Created support ticket"
                );
                Some(id)
            }
            Ok(Err(e)) => {
                error!("Ticket creation failed: {}", e);
                None
            }
            Err(_) => {
                warn!(
                    "Ticket creation exceeded {}ms deadline, detaching",
                    self.deadline.as_millis()
                );
                Some(TIMEOUT_TICKET_ID.to_string())
            }
        }
    }
}

/// Append-only JSONL ticket store.
pub struct FileTicketStore {
    path: PathBuf,
}

impl FileTicketStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TicketStore for FileTicketStore {
    async fn create(
        &self,
        redacted_text: &str,
        reasons: &[ReasonCode],
    ) -> Result<String, DishaError> {
        let ticket = Ticket {
            id: new_ticket_id(),
            reasons: reasons.to_vec(),
            redacted_text: redacted_text.to_string(),
            created_at: Utc::now(),
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut line = serde_json::to_string(&ticket)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;

        Ok(ticket.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    /// Captures the text the adapter hands to the store.
    struct RecordingStore {
        seen: Mutex<Option<String>>,
    }

    #[async_trait]
    impl TicketStore for RecordingStore {
        async fn create(
            &self,
            redacted_text: &str,
            _reasons: &[ReasonCode],
        ) -> Result<String, DishaError> {
            *self.seen.lock().unwrap() = Some(redacted_text.to_string());
            Ok(new_ticket_id())
        }
    }

    struct SlowStore;

    #[async_trait]
    impl TicketStore for SlowStore {
        async fn create(
            &self,
            _redacted_text: &str,
            _reasons: &[ReasonCode],
        ) -> Result<String, DishaError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("never".to_string())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl TicketStore for FailingStore {
        async fn create(
            &self,
            _redacted_text: &str,
            _reasons: &[ReasonCode],
        ) -> Result<String, DishaError> {
            Err(DishaError::TicketStore("disk full".to_string()))
        }
    }

    #[test]
    fn ticket_id_format() {
        let id = new_ticket_id();
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], TICKET_PREFIX);
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn pii_never_reaches_the_store() {
        let store = Arc::new(RecordingStore {
            seen: Mutex::new(None),
        });
        let adapter = TicketAdapter::new(store.clone(), Duration::from_millis(500));

        let id = adapter
            .create_ticket(
                "My email is a@b.com, phone 555-123-4567",
                &[ReasonCode::NoCitation],
                None,
            )
            .await;
        assert!(id.is_some());

        let seen = store.seen.lock().unwrap().clone().unwrap();
        assert!(!seen.contains("a@b.com"));
        assert!(!seen.contains("555-123-4567"));
        assert!(seen.contains("[REDACTED EMAIL]"));
        assert!(seen.contains("[REDACTED PHONE]"));
    }

    #[tokio::test]
    async fn slow_store_yields_sentinel_within_deadline() {
        let adapter = TicketAdapter::new(Arc::new(SlowStore), Duration::from_millis(50));
        let start = Instant::now();
        let id = adapter
            .create_ticket("query", &[ReasonCode::LowConfidence], None)
            .await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(id.as_deref(), Some(TIMEOUT_TICKET_ID));
    }

    #[tokio::test]
    async fn store_error_yields_no_ticket() {
        let adapter = TicketAdapter::new(Arc::new(FailingStore), Duration::from_millis(500));
        let id = adapter
            .create_ticket("query", &[ReasonCode::NoCitation], None)
            .await;
        assert!(id.is_none());
    }

    #[tokio::test]
    async fn file_store_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.jsonl");
        let store = FileTicketStore::new(&path);

        let id1 = store
            .create("first", &[ReasonCode::NoCitation])
            .await
            .unwrap();
        let id2 = store
            .create("second", &[ReasonCode::StaleSource])
            .await
            .unwrap();
        assert_ne!(id1, id2);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let ticket: Ticket = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(ticket.id, id1);
        assert_eq!(ticket.redacted_text, "first");
    }
}
