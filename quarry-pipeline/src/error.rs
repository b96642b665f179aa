use thiserror::Error;

/// Errors raised by the pipeline executor itself (as opposed to errors
/// surfaced by an individual stage, which are `layer0::StageError`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// A stage returned `StageOutcome { success: false, .. }`.
    #[error("stage '{stage}' failed: {reason}")]
    StageFailed {
        /// Name of the stage that failed.
        stage: String,
        /// The stage's own error message.
        reason: String,
    },

    /// A stage returned `Err(StageError)`.
    #[error("stage '{stage}' errored: {source}")]
    StageError {
        /// Name of the stage that errored.
        stage: String,
        /// The underlying stage error.
        #[source]
        source: layer0::error::StageError,
    },

    /// A hook halted the pipeline run.
    #[error("halted by hook at stage '{stage}': {reason}")]
    HookHalt {
        /// Name of the stage the hook fired at.
        stage: String,
        /// The hook's stated reason.
        reason: String,
    },

    /// A hook's `ModifyInput`/`ModifyOutput` payload didn't deserialize
    /// back into a `PipelineContext`.
    #[error("hook at stage '{stage}' returned an unusable context: {reason}")]
    MalformedHookPayload {
        /// Name of the stage the hook fired at.
        stage: String,
        /// Why the payload was rejected.
        reason: String,
    },

    /// The pipeline run exceeded its deadline.
    #[error("pipeline run exceeded its deadline of {0:?}")]
    DeadlineExceeded(std::time::Duration),
}
