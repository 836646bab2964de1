use crate::error::{AppError, AppResult};
use crate::models::{BarterRequest, Poll, Session};
use crate::workflow::{BarterStatus, TrackingStep};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub timestamp: i64,
    pub event_type: String, // "request_created", "status_changed", "tracking_step", etc.
    pub request_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub details: serde_json::Value,
}

/// Append-only JSON-lines trail of exchange activity
pub struct AuditTrailService {
    log_file: PathBuf,
    file_handle: Arc<Mutex<std::fs::File>>,
}

impl AuditTrailService {
    /// Open (or create) today's audit file under `log_directory`
    pub fn new(log_directory: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(log_directory)
            .map_err(|e| AppError::Message(format!("Failed to create log directory: {}", e)))?;

        let date = chrono::Utc::now().format("%Y-%m-%d");
        let log_file = log_directory.join(format!("audit_{}.log", date));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .map_err(|e| AppError::Message(format!("Failed to open audit log file: {}", e)))?;

        info!("Audit trail initialized: {:?}", log_file);

        Ok(Self {
            log_file,
            file_handle: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_file
    }

    /// Write one entry. Failures are logged and swallowed so an audit
    /// problem never fails the action being audited.
    pub async fn record(&self, entry: AuditLogEntry) {
        if let Err(e) = self.log(entry).await {
            warn!("Audit write failed: {}", e);
        }
    }

    /// Log an audit entry
    pub async fn log(&self, entry: AuditLogEntry) -> AppResult<()> {
        let json = serde_json::to_string(&entry)?;

        let mut file = self.file_handle.lock().await;
        writeln!(file, "{}", json)
            .map_err(|e| AppError::Message(format!("Failed to write audit log: {}", e)))?;

        file.flush()
            .map_err(|e| AppError::Message(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    pub async fn log_request_created(&self, request: &BarterRequest) {
        self.record(entry(
            "request_created",
            Some(request.id),
            Some(request.from_user_id),
            serde_json::json!({
                "type": request.request_type,
                "to_user_id": request.to_user_id,
                "to_skill_id": request.to_skill_id,
                "to_item_id": request.to_item_id,
            }),
        ))
        .await
    }

    pub async fn log_status_changed(
        &self,
        request_id: Uuid,
        actor: Option<Uuid>,
        from: BarterStatus,
        to: BarterStatus,
    ) {
        self.record(entry(
            "status_changed",
            Some(request_id),
            actor,
            serde_json::json!({ "from": from.as_str(), "to": to.as_str() }),
        ))
        .await
    }

    pub async fn log_tracking_step(&self, request_id: Uuid, actor: Uuid, step: TrackingStep) {
        self.record(entry(
            "tracking_step",
            Some(request_id),
            Some(actor),
            serde_json::json!({ "step": step.as_str(), "index": step.index() + 1 }),
        ))
        .await
    }

    pub async fn log_session_changed(&self, session: &Session, actor: Uuid, action: &str) {
        self.record(entry(
            "session_changed",
            Some(session.barter_request_id),
            Some(actor),
            serde_json::json!({
                "session_id": session.id,
                "action": action,
                "status": session.status,
                "scheduled_for": session.starts_at().to_string(),
            }),
        ))
        .await
    }

    pub async fn log_poll_created(&self, poll: &Poll, cost: i32) {
        self.record(entry(
            "poll_created",
            None,
            Some(poll.user_id),
            serde_json::json!({ "poll_id": poll.id, "cost": cost }),
        ))
        .await
    }

    pub async fn log_poll_vote(&self, poll_id: Uuid, voter: Uuid, option_index: i32, reward: i32) {
        self.record(entry(
            "poll_vote",
            None,
            Some(voter),
            serde_json::json!({
                "poll_id": poll_id,
                "option_index": option_index,
                "reward": reward,
            }),
        ))
        .await
    }
}

fn entry(
    event_type: &str,
    request_id: Option<Uuid>,
    user_id: Option<Uuid>,
    details: serde_json::Value,
) -> AuditLogEntry {
    AuditLogEntry {
        timestamp: chrono::Utc::now().timestamp(),
        event_type: event_type.to_string(),
        request_id,
        user_id,
        details,
    }
}
