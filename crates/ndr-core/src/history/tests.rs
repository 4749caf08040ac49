//! Tests for history (in-memory DB helper from db).

use crate::history::db::open_memory;
use crate::history::{RunCounts, RunState};
use crate::scheduler::Trigger;

#[tokio::test]
async fn run_lifecycle_roundtrip() {
    let db = open_memory().await.unwrap();
    let id = db.add_run(Trigger::Explicit, true).await.unwrap();
    let runs = db.list_runs(10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, id);
    assert_eq!(runs[0].state, RunState::Queued);
    assert_eq!(runs[0].trigger, Trigger::Explicit);
    assert!(runs[0].force);
    assert_eq!(runs[0].finished_at, None);

    db.set_state(id, RunState::Running).await.unwrap();
    assert_eq!(db.list_runs(10).await.unwrap()[0].state, RunState::Running);

    let counts = RunCounts {
        copied: 3,
        missing: 1,
        error: Some("missing com.a:b:1.0".into()),
    };
    db.finish_run(id, RunState::Failed, &counts).await.unwrap();
    let run = &db.list_runs(10).await.unwrap()[0];
    assert_eq!(run.state, RunState::Failed);
    assert_eq!(run.copied, 3);
    assert_eq!(run.missing, 1);
    assert_eq!(run.error.as_deref(), Some("missing com.a:b:1.0"));
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn newest_first_and_limited() {
    let db = open_memory().await.unwrap();
    let a = db.add_run(Trigger::Automatic, false).await.unwrap();
    let b = db.add_run(Trigger::Explicit, false).await.unwrap();
    let c = db.add_run(Trigger::Automatic, false).await.unwrap();
    let ids: Vec<i64> = db.list_runs(2).await.unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![c, b]);
    assert_eq!(db.list_runs(10).await.unwrap()[2].id, a);
}

#[tokio::test]
async fn interrupted_runs_become_failed() {
    let db = open_memory().await.unwrap();
    let id = db.add_run(Trigger::Explicit, false).await.unwrap();
    db.set_state(id, RunState::Running).await.unwrap();
    let done = db.add_run(Trigger::Explicit, false).await.unwrap();
    db.finish_run(done, RunState::Completed, &RunCounts::default())
        .await
        .unwrap();

    assert_eq!(db.recover_interrupted().await.unwrap(), 1);
    let runs = db.list_runs(10).await.unwrap();
    let interrupted = runs.iter().find(|r| r.id == id).unwrap();
    assert_eq!(interrupted.state, RunState::Failed);
    assert_eq!(interrupted.error.as_deref(), Some("interrupted"));
}

#[tokio::test]
async fn open_at_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state dir").join("history.db");
    let db = crate::history::HistoryDb::open_at(&path).await.unwrap();
    db.add_run(Trigger::Explicit, false).await.unwrap();
    assert!(path.exists());
}
