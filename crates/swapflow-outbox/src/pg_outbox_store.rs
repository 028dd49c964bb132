//! `PostgreSQL` implementation of the `OutboxStore` trait.

use std::time::Instant;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use swapflow_core::error::OutboxError;
use swapflow_core::outbox::{BatchProcessor, OutboxStore};
use swapflow_core::swap::{Swap, SwapData, SwapId};

use crate::queries;

/// PostgreSQL-backed outbox store.
#[derive(Debug, Clone)]
pub struct PgOutboxStore {
    pool: PgPool,
}

impl PgOutboxStore {
    /// Creates a new `PgOutboxStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A swap joined with the outbox row that locks it.
#[derive(Debug, sqlx::FromRow)]
struct ClaimedRow {
    outbox_id: i64,
    id: Uuid,
    who: String,
    token: String,
    amount: Decimal,
    usd: Decimal,
    side: bool,
}

impl ClaimedRow {
    fn into_swap(self) -> Result<Swap, OutboxError> {
        let token = self.token.parse().map_err(|e| {
            OutboxError::MalformedRecord(format!("outbox row {}: {e}", self.outbox_id))
        })?;
        Ok(Swap::reconstruct(
            SwapId::from_uuid(self.id),
            SwapData {
                who: self.who,
                token,
                amount: self.amount,
                usd: self.usd,
                side: self.side,
            },
        ))
    }
}

/// A claimed row whose swap cannot be decoded. It leaves the backlog with the
/// rest of the batch and is kept in `swap_outbox_rejected`.
struct RejectedRow {
    outbox_id: i64,
    swap_id: Uuid,
    reason: OutboxError,
}

async fn rollback(tx: Transaction<'_, Postgres>, after: &'static str) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, after, "rollback failed");
    }
}

fn storage_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> OutboxError {
    move |e| OutboxError::StorageUnavailable(format!("{operation}: {e}"))
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    #[instrument(skip(self, swap), fields(swap_id = %swap.id()))]
    async fn append(&self, swap: &Swap) -> Result<(), OutboxError> {
        let mut tx = self.pool.begin().await.map_err(storage_error("begin"))?;

        sqlx::query(queries::INSERT_SWAP)
            .bind(swap.id().as_uuid())
            .bind(swap.who())
            .bind(swap.token().as_str())
            .bind(swap.amount())
            .bind(swap.usd())
            .bind(swap.side())
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    OutboxError::DuplicateKey(swap.id())
                }
                other => storage_error("insert swap")(other),
            })?;

        sqlx::query(queries::INSERT_OUTBOX)
            .bind(swap.id().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(storage_error("insert outbox"))?;

        tx.commit().await.map_err(storage_error("commit"))?;
        Ok(())
    }

    #[instrument(skip(self, processor))]
    async fn claim_process_delete(
        &self,
        max_batch: usize,
        processor: &dyn BatchProcessor,
    ) -> Result<usize, OutboxError> {
        let started = Instant::now();
        let limit = i64::try_from(max_batch).unwrap_or(i64::MAX);

        let mut tx = self.pool.begin().await.map_err(storage_error("begin"))?;

        let rows: Vec<ClaimedRow> = sqlx::query_as(queries::CLAIM_BATCH)
            .bind(limit)
            .fetch_all(&mut *tx)
            .await
            .map_err(storage_error("lock"))?;

        if rows.is_empty() {
            tx.rollback().await.map_err(storage_error("rollback"))?;
            return Ok(0);
        }

        let mut outbox_ids = Vec::with_capacity(rows.len());
        let mut swaps = Vec::with_capacity(rows.len());
        let mut rejected = Vec::new();
        for row in rows {
            let (outbox_id, swap_id) = (row.outbox_id, row.id);
            outbox_ids.push(outbox_id);
            match row.into_swap() {
                Ok(swap) => swaps.push(swap),
                Err(reason) => rejected.push(RejectedRow {
                    outbox_id,
                    swap_id,
                    reason,
                }),
            }
        }
        debug!(
            claimed = outbox_ids.len(),
            rejected = rejected.len(),
            "claimed outbox batch"
        );

        for row in &rejected {
            error!(
                outbox_id = row.outbox_id,
                swap_id = %row.swap_id,
                error = %row.reason,
                "quarantining undecodable outbox row"
            );
            let quarantined = sqlx::query(queries::INSERT_REJECTED)
                .bind(row.outbox_id)
                .bind(row.swap_id)
                .bind(row.reason.to_string())
                .execute(&mut *tx)
                .await;
            if let Err(e) = quarantined {
                rollback(tx, "failed quarantine").await;
                return Err(storage_error("quarantine")(e));
            }
        }

        let delivered = if swaps.is_empty() {
            0
        } else {
            match processor.process(&swaps).await {
                Ok(delivered) => delivered,
                Err(e) => {
                    rollback(tx, "failed process").await;
                    return Err(e.into());
                }
            }
        };

        sqlx::query(queries::DELETE_CLAIMED)
            .bind(&outbox_ids)
            .execute(&mut *tx)
            .await
            .map_err(storage_error("delete"))?;

        tx.commit().await.map_err(storage_error("commit"))?;

        debug!(
            delivered,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "committed outbox batch"
        );
        Ok(delivered)
    }

    async fn backlog_depth(&self) -> Result<u64, OutboxError> {
        let count: i64 = sqlx::query_scalar(queries::COUNT_BACKLOG)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error("count backlog"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
