pub mod config;
pub mod content;
pub mod error;
pub mod state;
pub mod traits;

pub use config::PipelineConfig;
pub use content::{ContentPayload, ContentRequest, PayloadKind, TemplateId};
pub use error::{DevflowError, Result};
pub use state::{DesignDocument, PipelineState, ReviewStatus};
