use crate::dom::NodeId;
use thiserror::Error;

/// Errors raised by the highlighter and its document hosts
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    /// The injected page bridge answered with something we could not decode
    #[error("Bridge protocol error: {0}")]
    BridgeProtocol(String),

    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Invalid DOM operation: {0}")]
    InvalidOperation(String),

    #[error("Panel node '{0}' is missing")]
    PanelNodeMissing(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("File watch error: {0}")]
    Watch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HighlightError>;
