//! Audit trail: every authenticated operation records actor, action,
//! resource, and outcome — denials and failures included.
//!
//! Entries go to the structured log and to the bounded Redis list in one
//! call. A storage hiccup must not fail the request that is being
//! audited, so persistence errors are logged and swallowed here.

use models::{AuditEntry, AuditOutcome};
use tracing::{info, warn};

use crate::auth::Identity;
use crate::database;
use crate::error::AppError;
use crate::state::AppState;

pub async fn record(state: &AppState, entry: AuditEntry) {
    info!(
        actor = %entry.actor,
        action = %entry.action,
        resource = %entry.resource,
        outcome = ?entry.outcome,
        "audit"
    );

    if let Err(e) =
        database::push_audit(state.redis_connection.clone(), &entry, state.config.audit_limit).await
    {
        warn!("Failed to persist audit entry: {e}");
    }
}

/// Permission gate used at the top of every handler: a missing permission
/// is itself an audited event.
pub async fn authorize(
    state: &AppState,
    identity: &Identity,
    permission: &str,
    action: &str,
    resource: &str,
) -> Result<(), AppError> {
    if identity.can(permission) {
        return Ok(());
    }

    record(
        state,
        AuditEntry::new(&identity.actor, action, resource, AuditOutcome::Denied)
            .with_detail(format!("missing permission {permission}")),
    )
    .await;

    Err(AppError::Forbidden)
}

/// Record the outcome of a finished operation, passing the result through.
pub async fn finish<T>(
    state: &AppState,
    identity: &Identity,
    action: &str,
    resource: &str,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    let outcome = if result.is_ok() {
        AuditOutcome::Success
    } else {
        AuditOutcome::Error
    };

    let mut entry = AuditEntry::new(&identity.actor, action, resource, outcome);
    if let Err(e) = &result {
        entry = entry.with_detail(e.to_string());
    }
    record(state, entry).await;

    result
}
