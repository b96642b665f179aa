//! Effect system — side-effects declared by stages for external execution.

use crate::id::*;
use serde::{Deserialize, Serialize};

/// A side-effect declared by a pipeline stage. NOT executed by the stage —
/// the calling layer (the pipeline executor, the conversation manager)
/// decides when and how to execute it.
///
/// This is the key composability mechanism. A stage running in-process
/// has its effects executed by a simple loop right after it returns. A
/// stage running under a test harness has its effects captured for
/// assertions instead.
///
/// The Custom variant ensures future effect types can be represented
/// without changing the enum. When a new effect type stabilizes
/// (used by 3+ implementations), it graduates to a named variant.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Write a value to persistent state (e.g. append a conversation
    /// message, store a pipeline-run record).
    WriteMemory {
        /// The scope to write into.
        scope: Scope,
        /// The key to write.
        key: String,
        /// The value to store.
        value: serde_json::Value,
    },

    /// Delete a value from persistent state.
    DeleteMemory {
        /// The scope to delete from.
        scope: Scope,
        /// The key to delete.
        key: String,
    },

    /// Emit a log/trace event. Observers and telemetry consume these.
    Log {
        /// Severity level.
        level: LogLevel,
        /// Log message.
        message: String,
        /// Optional structured data.
        data: Option<serde_json::Value>,
    },

    /// Future effect types. Named string + arbitrary payload.
    /// Use this for domain-specific effects that aren't general
    /// enough for a named variant.
    Custom {
        /// The custom effect type identifier.
        effect_type: String,
        /// Arbitrary payload.
        data: serde_json::Value,
    },
}

/// Where state lives. Scopes are hierarchical — a session scope is
/// narrower than a collection scope, which is narrower than global.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Per-conversation-session (messages, summaries).
    Session(SessionId),
    /// Per-document-collection (pipeline configs, cached retrievals).
    Collection(CollectionId),
    /// Per-user (default pipeline, default provider/model).
    User(UserId),
    /// Shared across all users and collections.
    Global,
    /// Future scopes.
    Custom(String),
}

/// Log severity levels.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Finest-grained tracing.
    Trace,
    /// Debug-level detail.
    Debug,
    /// Informational messages.
    Info,
    /// Warnings.
    Warn,
    /// Errors.
    Error,
}
