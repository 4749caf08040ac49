//! Run write/read operations.

use anyhow::Result;
use sqlx::Row;

use super::db::{unix_timestamp, HistoryDb};
use super::types::{RunCounts, RunId, RunState, RunSummary};
use crate::scheduler::Trigger;

impl HistoryDb {
    /// Record a newly queued run.
    pub async fn add_run(&self, trigger: Trigger, force: bool) -> Result<RunId> {
        let now = unix_timestamp();
        let id = sqlx::query(
            r#"
            INSERT INTO runs (trigger_kind, forced, state, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(trigger.as_str())
        .bind(force)
        .bind(RunState::Queued.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        Ok(id)
    }

    pub async fn set_state(&self, id: RunId, state: RunState) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            UPDATE runs
            SET state = ?1,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(state.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a run finished with its final state and counts.
    pub async fn finish_run(&self, id: RunId, state: RunState, counts: &RunCounts) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            UPDATE runs
            SET state = ?1,
                updated_at = ?2,
                finished_at = ?2,
                copied = ?3,
                missing = ?4,
                error = ?5
            WHERE id = ?6
            "#,
        )
        .bind(state.as_str())
        .bind(now)
        .bind(counts.copied)
        .bind(counts.missing)
        .bind(counts.error.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Runs left `running` by a process that died are marked failed.
    pub async fn recover_interrupted(&self) -> Result<u64> {
        let now = unix_timestamp();
        let result = sqlx::query(
            r#"
            UPDATE runs
            SET state = 'failed',
                updated_at = ?1,
                error = 'interrupted'
            WHERE state = 'running'
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Most recent runs first.
    pub async fn list_runs(&self, limit: i64) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, trigger_kind, forced, state, created_at, finished_at, copied, missing, error
            FROM runs
            ORDER BY created_at DESC, id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let trigger: String = row.get("trigger_kind");
            let state: String = row.get("state");
            out.push(RunSummary {
                id: row.get("id"),
                trigger: Trigger::parse(&trigger),
                force: row.get("forced"),
                state: RunState::parse(&state),
                created_at: row.get("created_at"),
                finished_at: row.get("finished_at"),
                copied: row.get("copied"),
                missing: row.get("missing"),
                error: row.get("error"),
            });
        }
        Ok(out)
    }
}
