use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::DomainResult;
use crate::ports::audit::AuditLogRepository;
use crate::util::now_ms;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RequestCreated,
    RequestApproved,
    RequestRejected,
    RequestCompleted,
    RequestCancelled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RequestCreated => "request_created",
            AuditAction::RequestApproved => "request_approved",
            AuditAction::RequestRejected => "request_rejected",
            AuditAction::RequestCompleted => "request_completed",
            AuditAction::RequestCancelled => "request_cancelled",
        }
    }
}

/// Append-only record of one lifecycle mutation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    pub entry_id: String,
    pub actor_id: String,
    pub action: AuditAction,
    pub request_id: String,
    pub dog_id: String,
    pub detail: Option<String>,
    pub created_at_ms: i64,
}

/// Best-effort audit trail over the adoption lifecycle. Append failures are
/// logged and swallowed so a broken trail never blocks the mutation that
/// already happened.
#[derive(Clone)]
pub struct AuditTrail {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditTrail {
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    pub async fn record(
        &self,
        actor_id: &str,
        action: AuditAction,
        request_id: &str,
        dog_id: &str,
        detail: Option<String>,
    ) {
        let entry = AuditEntry {
            entry_id: crate::util::uuid_v7_without_dashes(),
            actor_id: actor_id.to_string(),
            action,
            request_id: request_id.to_string(),
            dog_id: dog_id.to_string(),
            detail,
            created_at_ms: now_ms(),
        };
        if let Err(err) = self.repository.append(&entry).await {
            tracing::warn!(
                error = %err,
                action = action.as_str(),
                request_id,
                "audit append failed"
            );
        }
    }

    /// Trail of one request, oldest entry first.
    pub async fn for_request(&self, request_id: &str) -> DomainResult<Vec<AuditEntry>> {
        self.repository.list_by_request(request_id).await
    }
}
