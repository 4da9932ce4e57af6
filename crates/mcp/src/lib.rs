//! MCP (Model Context Protocol) server for the car catalog.
//!
//! Exposes a single `search_cars` tool over stdio so that external agents can
//! query the same catalog the chat shell uses. The tool only reads; it never
//! calls a language model.

mod server;

pub use server::{CarSearchMcp, SearchCarsInput, DEFAULT_TOOL_LIMIT};

use carfinder_core::search::SearchError;
use rmcp::ErrorData;
use thiserror::Error;

/// Errors specific to MCP tool calls
#[derive(Error, Debug)]
pub enum McpError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// JSON-RPC error code reported to the client
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::Validation(_) => -32602,
            McpError::Search(_) | McpError::Internal(_) => -32603,
        }
    }

    pub fn into_error_data(self) -> ErrorData {
        let message = self.to_string();
        match self {
            McpError::Validation(_) => ErrorData::invalid_params(message, None),
            McpError::Search(_) | McpError::Internal(_) => ErrorData::internal_error(message, None),
        }
    }
}

pub type McpResult<T> = Result<T, McpError>;
