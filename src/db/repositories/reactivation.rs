use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::domain::{AccountId, ReactivationStatus};
use crate::entities::reactivation_requests;

pub use reactivation_requests::Model as ReactivationRequest;

/// Repository for reactivation requests
pub struct ReactivationRepository {
    conn: DatabaseConnection,
}

impl ReactivationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, email: &str, message: &str) -> Result<ReactivationRequest> {
        reactivation_requests::ActiveModel {
            email: Set(email.to_string()),
            message: Set(message.to_string()),
            requested_at: Set(chrono::Utc::now().to_rfc3339()),
            status: Set(ReactivationStatus::Pending),
            reviewed_at: Set(None),
            reviewed_by: Set(None),
            admin_notes: Set(String::new()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to create reactivation request")
    }

    pub async fn get(&self, id: i32) -> Result<Option<ReactivationRequest>> {
        reactivation_requests::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query reactivation request")
    }

    /// Newest first.
    pub async fn list(
        &self,
        status: Option<ReactivationStatus>,
    ) -> Result<Vec<ReactivationRequest>> {
        let mut query = reactivation_requests::Entity::find();
        if let Some(status) = status {
            query = query.filter(reactivation_requests::Column::Status.eq(status));
        }

        query
            .order_by_desc(reactivation_requests::Column::RequestedAt)
            .all(&self.conn)
            .await
            .context("Failed to list reactivation requests")
    }

    /// Moves a pending request to its terminal status. Returns `None` when the
    /// request is not pending anymore (or does not exist).
    pub async fn review(
        &self,
        id: i32,
        status: ReactivationStatus,
        reviewer: AccountId,
        notes: &str,
    ) -> Result<Option<ReactivationRequest>> {
        let result = reactivation_requests::Entity::update_many()
            .col_expr(reactivation_requests::Column::Status, Expr::value(status))
            .col_expr(
                reactivation_requests::Column::ReviewedAt,
                Expr::value(Some(chrono::Utc::now().to_rfc3339())),
            )
            .col_expr(
                reactivation_requests::Column::ReviewedBy,
                Expr::value(Some(reviewer.value())),
            )
            .col_expr(
                reactivation_requests::Column::AdminNotes,
                Expr::value(notes.to_string()),
            )
            .filter(reactivation_requests::Column::Id.eq(id))
            .filter(reactivation_requests::Column::Status.eq(ReactivationStatus::Pending))
            .exec(&self.conn)
            .await
            .context("Failed to review reactivation request")?;

        if result.rows_affected != 1 {
            return Ok(None);
        }

        self.get(id).await
    }
}
