use crate::DomainResult;
use crate::audit::AuditEntry;

use super::BoxFuture;

#[allow(clippy::needless_pass_by_value)]
pub trait AuditLogRepository: Send + Sync {
    fn append(&self, entry: &AuditEntry) -> BoxFuture<'_, DomainResult<()>>;

    /// Entries of one request, oldest first.
    fn list_by_request(&self, request_id: &str) -> BoxFuture<'_, DomainResult<Vec<AuditEntry>>>;
}
