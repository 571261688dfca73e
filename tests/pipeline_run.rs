//! End-to-end run against the real filesystem artifact store.

use std::sync::Arc;

use devflow_core::content::{ContentPayload, TemplateId};
use devflow_core::state::ReviewStatus;
use devflow_engine::{FsArtifactStore, NodeId, Pipeline};
use devflow_test_utils::ScriptedContentService;

#[tokio::test]
async fn test_full_run_writes_artifacts_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ScriptedContentService::approving());
    service.script(
        TemplateId::CodeGeneration,
        ContentPayload::Code {
            generated_code: "Filename: app.py\nCode:\n```python\nprint('app')\n```\n\
                             Filename: models.py\nCode:\n```python\nclass Item: pass\n```\n"
                .to_string(),
        },
    );

    let store = Arc::new(FsArtifactStore::new(dir.path()));
    let pipeline = Pipeline::new(service, store, 60).unwrap();

    let report = pipeline.run("Build a to-do list app").await.unwrap();

    assert_eq!(report.state.status, ReviewStatus::Approved);
    assert_eq!(report.trace.last().unwrap().node, NodeId::QaTesting);

    let app = std::fs::read_to_string(dir.path().join("app.py")).unwrap();
    assert_eq!(app, "print('app')");
    let models = std::fs::read_to_string(dir.path().join("models.py")).unwrap();
    assert_eq!(models, "class Item: pass");
}

#[tokio::test]
async fn test_failed_run_reports_partial_trace() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ScriptedContentService::rejecting());
    let store = Arc::new(FsArtifactStore::new(dir.path()));
    let pipeline = Pipeline::new(service, store, 10).unwrap();

    let failure = pipeline.run("Build a to-do list app").await.unwrap_err();
    assert_eq!(failure.trace.len(), 10);
    // The run never got past the story loop
    assert!(failure
        .trace
        .iter()
        .all(|entry| matches!(
            entry.node,
            NodeId::GenerateUserStories | NodeId::ProductOwnerReview | NodeId::ReviseUserStories
        )));
}

#[tokio::test]
async fn test_cancel_between_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(ScriptedContentService::approving());
    let store = Arc::new(FsArtifactStore::new(dir.path()));
    let pipeline = Pipeline::new(service, store, 60).unwrap();

    pipeline.cancel_token().cancel();
    let failure = pipeline.run("Build a to-do list app").await.unwrap_err();
    assert!(matches!(
        failure.error,
        devflow_core::error::DevflowError::Cancelled
    ));
}
