use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use strum::{Display, EnumString};
use tokio::sync::watch;

/// Error code reported to the scripted app layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, uniffi::Enum)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OnboardingErrorCode {
    /// The invocation payload was malformed
    InvalidArguments,
    /// The BlinkUp service rejected the API key
    InvalidApiKey,
    /// Server verification failed during device setup
    VerifyApiKeyFail,
    /// Token acquisition failed for another reason (only with `TokenErrorPolicy::DeliverFailure`)
    TransportError,
}

/// Why an invocation failed.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FailureKind {
    /// Missing or wrongly typed positional argument
    InvalidArguments {
        /// Validation details
        reason: String,
    },
    /// Authentication rejected during token acquisition
    InvalidApiKey,
    /// The setup flow's server error handler fired
    ServerVerificationFailed {
        /// The SDK's message
        message: String,
    },
    /// Uncatalogued token acquisition error
    OtherTransportError {
        /// The SDK's message
        message: String,
    },
}

impl FailureKind {
    /// The code delivered to the caller
    #[must_use]
    pub const fn code(&self) -> OnboardingErrorCode {
        match self {
            Self::InvalidArguments { .. } => OnboardingErrorCode::InvalidArguments,
            Self::InvalidApiKey => OnboardingErrorCode::InvalidApiKey,
            Self::ServerVerificationFailed { .. } => OnboardingErrorCode::VerifyApiKeyFail,
            Self::OtherTransportError { .. } => OnboardingErrorCode::TransportError,
        }
    }

    /// Human-readable detail sent along with the code, if any
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::InvalidArguments { reason } => Some(reason.clone()),
            Self::InvalidApiKey => None,
            Self::ServerVerificationFailed { message } | Self::OtherTransportError { message } => {
                Some(message.clone())
            }
        }
    }
}

/// Terminal result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum OnboardingOutcome {
    /// Setup or clear completed
    Success,
    /// The invocation failed
    Failure {
        /// What went wrong
        kind: FailureKind,
    },
}

impl OnboardingOutcome {
    /// Short label for log lines
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Success => "success".to_string(),
            Self::Failure { kind } => kind.code().to_string(),
        }
    }
}

/// Receives the outcome of an invocation. Implemented by the plugin layer, which forwards it to
/// the scripted caller (e.g. Cordova's `CallbackContext`).
///
/// Exactly one of the two methods is called, at most once, per invocation.
#[uniffi::export(with_foreign)]
pub trait ResultCallback: Send + Sync {
    /// The invocation completed successfully
    fn success(&self);

    /// The invocation failed with `code`; `detail` carries the validation or SDK message
    fn error(&self, code: OnboardingErrorCode, detail: Option<String>);
}

/// Returned when an outcome is delivered to a channel that already delivered one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The channel's latch was already consumed
    #[error("outcome already delivered, dropped {rejected}")]
    AlreadyDelivered {
        /// Label of the outcome that was dropped
        rejected: String,
    },
}

/// At-most-once sink for the outcome of one invocation.
///
/// The first call to [`ResultChannel::succeed`] or [`ResultChannel::fail`] consumes the latch and
/// reaches the [`ResultCallback`]; later calls are rejected with [`DeliveryError`]. The delivered
/// outcome is also published on a watch channel for async waiters.
pub struct ResultChannel {
    callback: Arc<dyn ResultCallback>,
    delivered: AtomicBool,
    outcome: watch::Sender<Option<OnboardingOutcome>>,
}

impl ResultChannel {
    /// Wraps `callback` in a fresh latch
    #[must_use]
    pub fn new(callback: Arc<dyn ResultCallback>) -> Self {
        let (outcome, _) = watch::channel(None);
        Self {
            callback,
            delivered: AtomicBool::new(false),
            outcome,
        }
    }

    /// Delivers `Success`.
    ///
    /// # Errors
    /// [`DeliveryError::AlreadyDelivered`] if an outcome was already delivered.
    pub fn succeed(&self) -> Result<(), DeliveryError> {
        self.deliver(OnboardingOutcome::Success)
    }

    /// Delivers a failure of `kind`.
    ///
    /// # Errors
    /// [`DeliveryError::AlreadyDelivered`] if an outcome was already delivered.
    pub fn fail(&self, kind: FailureKind) -> Result<(), DeliveryError> {
        self.deliver(OnboardingOutcome::Failure { kind })
    }

    /// Delivers `outcome` if the latch is still open.
    ///
    /// # Errors
    /// [`DeliveryError::AlreadyDelivered`] if an outcome was already delivered.
    pub fn deliver(&self, outcome: OnboardingOutcome) -> Result<(), DeliveryError> {
        if self.delivered.swap(true, Ordering::AcqRel) {
            crate::warn!(
                "result_channel.duplicate_delivery rejected={}",
                outcome.label()
            );
            return Err(DeliveryError::AlreadyDelivered {
                rejected: outcome.label(),
            });
        }

        match &outcome {
            OnboardingOutcome::Success => self.callback.success(),
            OnboardingOutcome::Failure { kind } => self.callback.error(kind.code(), kind.detail()),
        }
        self.outcome.send_replace(Some(outcome));
        Ok(())
    }

    /// Whether the latch has been consumed
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered.load(Ordering::Acquire)
    }

    /// The delivered outcome, if any
    #[must_use]
    pub fn outcome(&self) -> Option<OnboardingOutcome> {
        self.outcome.borrow().clone()
    }

    /// Subscribes to the delivered outcome
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<OnboardingOutcome>> {
        self.outcome.subscribe()
    }
}
