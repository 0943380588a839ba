pub mod llm;
pub mod prompt;
pub mod reply;
pub mod schema;

pub use llm::{AzureChatClient, ChatModel, ModelConfig};
pub use reply::ReplyError;
pub use schema::EntityRecord;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why an analysis produced no entities even though it was attempted.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("model request failed: {0}")]
    Model(String),

    #[error("could not parse model reply: {source}")]
    Parse {
        #[source]
        source: ReplyError,
        raw: String,
    },
}

/// Outcome of one analysis: the entities found, or why there are none.
#[derive(Debug)]
pub enum Analysis {
    /// The model answered and the reply parsed; the list may be empty.
    Found(Vec<EntityRecord>),
    Failed(AnalysisError),
}

impl Analysis {
    /// The entities found, or an empty slice for a failed analysis.
    pub fn entities(&self) -> &[EntityRecord] {
        match self {
            Analysis::Found(entities) => entities,
            Analysis::Failed(_) => &[],
        }
    }

    pub fn into_entities(self) -> Vec<EntityRecord> {
        match self {
            Analysis::Found(entities) => entities,
            Analysis::Failed(_) => Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<&AnalysisError> {
        match self {
            Analysis::Found(_) => None,
            Analysis::Failed(e) => Some(e),
        }
    }
}

/// Asks a chat model to tag the entities in a document's text.
#[derive(Clone)]
pub struct EntityAnalyzer {
    model: Arc<dyn ChatModel>,
}

impl EntityAnalyzer {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn from_config(config: ModelConfig) -> Self {
        Self::new(Arc::new(AzureChatClient::new(config)))
    }

    /// Extract entities from `text` with exactly one model call.
    ///
    /// Never fails outright: transport and parse problems come back as
    /// [`Analysis::Failed`] after being logged.
    pub async fn analyze_text(&self, text: &str) -> Analysis {
        let prompt = prompt::build_entity_prompt(text);

        let raw = match self.model.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                let message = format!("{e:#}");
                warn!(error = %message, "entity model request failed");
                return Analysis::Failed(AnalysisError::Model(message));
            }
        };
        debug!(raw = %raw, "raw model reply");

        match reply::parse_entities(&raw) {
            Ok(entities) => {
                info!(entities = entities.len(), "extracted entities");
                Analysis::Found(entities)
            }
            Err(source) => {
                warn!(error = %source, raw = %raw, "model reply is not entity JSON");
                Analysis::Failed(AnalysisError::Parse { source, raw })
            }
        }
    }
}
