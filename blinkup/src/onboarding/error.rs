/// Errors returned synchronously by the onboarding API.
///
/// These are failures of the call itself. Failures of the onboarding flow are delivered
/// through the invocation's `ResultCallback` instead.
#[crate::blinkup_error]
pub enum BlinkUpError {
    /// Another invocation on the same orchestrator has not finished
    #[error("invocation {invocation_id} is still in progress")]
    InvocationInProgress {
        /// Id of the in-flight invocation
        invocation_id: u64,
    },

    /// The plugin action is not handled by this core
    #[error("unsupported action: {action}")]
    UnsupportedAction {
        /// The action name as received
        action: String,
    },
}

/// Result type for onboarding API calls
pub type BlinkUpResult<T> = std::result::Result<T, BlinkUpError>;
