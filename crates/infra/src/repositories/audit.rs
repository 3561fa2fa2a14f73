use std::sync::Arc;

use patitas_domain::DomainResult;
use patitas_domain::audit::AuditEntry;
use patitas_domain::error::DomainError;
use patitas_domain::ports::BoxFuture;
use patitas_domain::ports::audit::AuditLogRepository;
use serde_json::Value;
use surrealdb::{Surreal, engine::remote::ws::Client};
use tokio::sync::RwLock;

use super::surreal::{connect, decode_rows, map_surreal_error};
use crate::db::DbConfig;

const AUDIT_FIELDS: &str = "SELECT * OMIT id FROM audit_logs";

#[derive(Default)]
pub struct InMemoryAuditRepository {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLogRepository for InMemoryAuditRepository {
    fn append(&self, entry: &AuditEntry) -> BoxFuture<'_, DomainResult<()>> {
        let entry = entry.clone();
        let entries = self.entries.clone();
        Box::pin(async move {
            entries.write().await.push(entry);
            Ok(())
        })
    }

    fn list_by_request(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Vec<AuditEntry>>> {
        let request_id = request_id.to_string();
        let entries = self.entries.clone();
        Box::pin(async move {
            let mut matching: Vec<_> = entries
                .read()
                .await
                .iter()
                .filter(|entry| entry.request_id == request_id)
                .cloned()
                .collect();
            matching.sort_by(|a, b| {
                a.created_at_ms
                    .cmp(&b.created_at_ms)
                    .then_with(|| a.entry_id.cmp(&b.entry_id))
            });
            Ok(matching)
        })
    }
}

#[derive(Clone)]
pub struct SurrealAuditRepository {
    client: Arc<Surreal<Client>>,
}

impl SurrealAuditRepository {
    pub fn with_client(client: Arc<Surreal<Client>>) -> Self {
        Self { client }
    }

    pub async fn new(db_config: &DbConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: connect(db_config).await?,
        })
    }
}

impl AuditLogRepository for SurrealAuditRepository {
    fn append(&self, entry: &AuditEntry) -> BoxFuture<'_, DomainResult<()>> {
        let entry = entry.clone();
        let client = self.client.clone();
        Box::pin(async move {
            let data = serde_json::to_value(&entry).map_err(|err| {
                DomainError::Validation(format!("invalid audit payload: {err}"))
            })?;
            let response = client
                .query("CREATE audit_logs CONTENT $data")
                .bind(("data", data))
                .await
                .map_err(map_surreal_error)?;
            response.check().map_err(map_surreal_error)?;
            Ok(())
        })
    }

    fn list_by_request(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Vec<AuditEntry>>> {
        let request_id = request_id.to_string();
        let client = self.client.clone();
        Box::pin(async move {
            let mut response = client
                .query(format!(
                    "{AUDIT_FIELDS} WHERE request_id = $request_id \
                     ORDER BY created_at_ms ASC, entry_id ASC"
                ))
                .bind(("request_id", request_id))
                .await
                .map_err(map_surreal_error)?;
            let rows: Vec<Value> = response
                .take(0)
                .map_err(|err| DomainError::Validation(format!("invalid query result: {err}")))?;
            decode_rows(rows, "audit entry")
        })
    }
}
