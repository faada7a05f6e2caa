//! Admin audit trail.
//!
//! Recording is best-effort: [`AuditRecorder::record`] never returns an error and
//! never panics. A missing actor skips the write, a failing store is logged at
//! `ERROR` and reported as [`AuditOutcome::Failed`]. The admin operation that
//! triggered it has already succeeded and its response is not affected.

use std::{convert::Infallible, fmt::Display};

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    identity::{SessionIdentity, resolve_identity},
    models::NewAuditEntry,
    repository::RepositoryState,
};

/// AuditAction
///
/// Closed set of admin operations that leave a trail. Stored as the literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum AuditAction {
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    ArchiveProduct,
    DuplicateProduct,
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    CreateArtisan,
    UpdateArtisan,
    DeleteArtisan,
    UpdateOrderStatus,
    DeleteOrder,
    UpdateUserRole,
    DeleteUser,
    CreateCoupon,
    UpdateCoupon,
    DeleteCoupon,
    ToggleCoupon,
}

impl AuditAction {
    pub const ALL: [Self; 19] = [
        Self::CreateProduct,
        Self::UpdateProduct,
        Self::DeleteProduct,
        Self::ArchiveProduct,
        Self::DuplicateProduct,
        Self::CreateCategory,
        Self::UpdateCategory,
        Self::DeleteCategory,
        Self::CreateArtisan,
        Self::UpdateArtisan,
        Self::DeleteArtisan,
        Self::UpdateOrderStatus,
        Self::DeleteOrder,
        Self::UpdateUserRole,
        Self::DeleteUser,
        Self::CreateCoupon,
        Self::UpdateCoupon,
        Self::DeleteCoupon,
        Self::ToggleCoupon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateProduct => "CREATE_PRODUCT",
            Self::UpdateProduct => "UPDATE_PRODUCT",
            Self::DeleteProduct => "DELETE_PRODUCT",
            Self::ArchiveProduct => "ARCHIVE_PRODUCT",
            Self::DuplicateProduct => "DUPLICATE_PRODUCT",
            Self::CreateCategory => "CREATE_CATEGORY",
            Self::UpdateCategory => "UPDATE_CATEGORY",
            Self::DeleteCategory => "DELETE_CATEGORY",
            Self::CreateArtisan => "CREATE_ARTISAN",
            Self::UpdateArtisan => "UPDATE_ARTISAN",
            Self::DeleteArtisan => "DELETE_ARTISAN",
            Self::UpdateOrderStatus => "UPDATE_ORDER_STATUS",
            Self::DeleteOrder => "DELETE_ORDER",
            Self::UpdateUserRole => "UPDATE_USER_ROLE",
            Self::DeleteUser => "DELETE_USER",
            Self::CreateCoupon => "CREATE_COUPON",
            Self::UpdateCoupon => "UPDATE_COUPON",
            Self::DeleteCoupon => "DELETE_COUPON",
            Self::ToggleCoupon => "TOGGLE_COUPON",
        }
    }
}

/// AuditEvent
///
/// What happened, to which entity. The actor is supplied separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub action: AuditAction,
    /// Resource kind, e.g. "Product".
    pub entity: String,
    pub entity_id: String,
    pub details: Option<String>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, entity: impl Into<String>, entity_id: impl Display) -> Self {
        Self {
            action,
            entity: entity.into(),
            entity_id: entity_id.to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Recorded,
    /// No identifiable actor; nothing was written.
    Skipped,
    /// The store rejected the write; already logged.
    Failed,
}

/// AuditRecorder
///
/// Appends audit entries through the repository. Cheap to clone.
#[derive(Clone)]
pub struct AuditRecorder {
    repo: RepositoryState,
}

impl AuditRecorder {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    pub async fn record(&self, actor: Option<&SessionIdentity>, event: AuditEvent) -> AuditOutcome {
        let Some(actor) = actor else {
            tracing::debug!(action = %event.action, "audit skipped: no session actor");
            return AuditOutcome::Skipped;
        };

        let entry = NewAuditEntry {
            action: event.action,
            entity: event.entity,
            entity_id: event.entity_id,
            details: event.details,
            admin_id: actor.id,
            admin_name: actor.display_name.clone(),
        };

        match self.repo.insert_audit_entry(&entry).await {
            Ok(_) => AuditOutcome::Recorded,
            Err(e) => {
                tracing::error!(
                    action = %entry.action,
                    entity = %entry.entity,
                    entity_id = %entry.entity_id,
                    admin_id = %entry.admin_id,
                    error = %e,
                    "failed to write audit log entry"
                );
                AuditOutcome::Failed
            }
        }
    }
}

/// Auditor
///
/// Request-scoped recorder: carries whatever identity the request's session resolves
/// to, so handlers only describe the event.
pub struct Auditor {
    recorder: AuditRecorder,
    actor: Option<SessionIdentity>,
}

impl Auditor {
    pub async fn record(&self, event: AuditEvent) -> AuditOutcome {
        self.recorder.record(self.actor.as_ref(), event).await
    }
}

impl<S> FromRequestParts<S> for Auditor
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        Ok(Self {
            recorder: AuditRecorder::new(RepositoryState::from_ref(state)),
            actor: resolve_identity(&parts.headers, &config),
        })
    }
}
