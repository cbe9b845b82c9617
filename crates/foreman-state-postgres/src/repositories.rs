use async_trait::async_trait;
use foreman_core::{
    domain::flow_session::{FlowSession, OwnerId},
    domain::repository::FlowSessionRepository,
    FlowError,
};
use sqlx::Row;
use tracing::debug;

use crate::PostgresConnection;

/// Postgres implementation of the FlowSessionRepository
///
/// The full session is stored as one JSONB document per owner; flow type,
/// status, version and timestamps are denormalized into columns so queries
/// and the optimistic-concurrency check never parse the document.
#[derive(Clone)]
pub struct PostgresFlowSessionRepository {
    conn: PostgresConnection,
}

impl PostgresFlowSessionRepository {
    /// Create a new Postgres flow session repository
    pub fn new(conn: PostgresConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl FlowSessionRepository for PostgresFlowSessionRepository {
    async fn find_by_owner(&self, owner: &OwnerId) -> Result<Option<FlowSession>, FlowError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: find_by_owner called for {}", owner.0);
            return Ok(None);
        }

        let query = "SELECT data FROM flow_sessions WHERE owner_id = $1";

        match sqlx::query(query)
            .bind(&owner.0)
            .fetch_optional(self.conn.pool()?)
            .await
        {
            Ok(Some(row)) => {
                let data: serde_json::Value = row.try_get("data").map_err(|e| {
                    FlowError::SerializationError(format!("Error getting data: {}", e))
                })?;

                let session: FlowSession = serde_json::from_value(data).map_err(|e| {
                    FlowError::SerializationError(format!(
                        "Error deserializing flow session: {}",
                        e
                    ))
                })?;
                Ok(Some(session))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(FlowError::StateStoreError(format!("Database error: {}", e))),
        }
    }

    async fn upsert(
        &self,
        session: &FlowSession,
        expected_version: Option<u64>,
    ) -> Result<(), FlowError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: upsert called for {}", session.owner_id.0);
            return Ok(());
        }

        let data = serde_json::to_value(session).map_err(|e| {
            FlowError::SerializationError(format!("Error serializing flow session: {}", e))
        })?;
        let flow_type = session.flow_type.as_str();
        let status = format!("{:?}", session.status).to_lowercase();

        match expected_version {
            None => {
                let query = "
                    INSERT INTO flow_sessions (owner_id, flow_type, status, version, data, created_at, updated_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    ON CONFLICT (owner_id) DO UPDATE SET
                        flow_type = $2,
                        status = $3,
                        version = $4,
                        data = $5,
                        created_at = $6,
                        updated_at = $7
                ";

                sqlx::query(query)
                    .bind(&session.owner_id.0)
                    .bind(flow_type)
                    .bind(&status)
                    .bind(session.version as i64)
                    .bind(&data)
                    .bind(session.created_at)
                    .bind(session.updated_at)
                    .execute(self.conn.pool()?)
                    .await
                    .map_err(|e| {
                        FlowError::StateStoreError(format!("Failed to save flow session: {}", e))
                    })?;

                Ok(())
            }
            Some(expected) => {
                // Compare-and-swap on the version column; zero rows touched
                // means another writer got there first
                let query = "
                    UPDATE flow_sessions SET
                        flow_type = $3,
                        status = $4,
                        version = $5,
                        data = $6,
                        updated_at = $7
                    WHERE owner_id = $1 AND version = $2
                ";

                let result = sqlx::query(query)
                    .bind(&session.owner_id.0)
                    .bind(expected as i64)
                    .bind(flow_type)
                    .bind(&status)
                    .bind(session.version as i64)
                    .bind(&data)
                    .bind(session.updated_at)
                    .execute(self.conn.pool()?)
                    .await
                    .map_err(|e| {
                        FlowError::StateStoreError(format!("Failed to save flow session: {}", e))
                    })?;

                if result.rows_affected() == 0 {
                    return Err(FlowError::SessionConflict(session.owner_id.0.clone()));
                }

                Ok(())
            }
        }
    }

    async fn delete(&self, owner: &OwnerId) -> Result<(), FlowError> {
        if self.conn.is_test_mode() {
            debug!("Test mode PostgreSQL: delete called for {}", owner.0);
            return Ok(());
        }

        let query = "DELETE FROM flow_sessions WHERE owner_id = $1";

        sqlx::query(query)
            .bind(&owner.0)
            .execute(self.conn.pool()?)
            .await
            .map_err(|e| {
                FlowError::StateStoreError(format!("Failed to delete flow session: {}", e))
            })?;

        Ok(())
    }
}
