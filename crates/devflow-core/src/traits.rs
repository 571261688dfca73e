use futures::future::BoxFuture;

use crate::content::{ContentPayload, ContentRequest};
use crate::error::Result;

/// Content service — external generator of structured content.
///
/// The single suspension point of a run: stages block on `generate`
/// and the executor blocks on the stage. Implementations own their
/// timeout and retry policy; the engine never retries.
pub trait ContentService: Send + Sync + 'static {
    /// Generate structured content for a template and its variables.
    ///
    /// The returned payload must match `request.template.payload_kind()`;
    /// implementations validate the shape at this boundary and surface
    /// a `SchemaMismatch` fault rather than hand back malformed data.
    fn generate(&self, request: &ContentRequest) -> BoxFuture<'_, Result<ContentPayload>>;
}

/// Artifact store — persistence for generated code files.
pub trait ArtifactStore: Send + Sync + 'static {
    /// Persist one named artifact. Must be atomic per artifact: a
    /// crash mid-write never leaves a half-written file visible.
    fn save(&self, name: &str, content: &str) -> BoxFuture<'_, Result<()>>;
}
