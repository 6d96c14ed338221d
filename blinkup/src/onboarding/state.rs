use crate::onboarding::result_channel::OnboardingOutcome;

/// Progress of one invocation through the onboarding flow.
///
/// `Idle → TokenPending → (TokenAcquired) → SetupPending → Done`. Device setup starts right
/// after token acquisition is requested, so `SetupPending` is normally entered while the token is
/// still pending; [`TokenStatus`] tracks that phase independently.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FlowState {
    /// Validated, waiting for the UI thread
    Idle,
    /// Token acquisition requested
    TokenPending,
    /// Token acquired before device setup was started
    TokenAcquired,
    /// Device setup started
    SetupPending,
    /// An outcome was delivered
    Done {
        /// The delivered outcome
        outcome: OnboardingOutcome,
    },
    /// Cancelled by the caller before an outcome was delivered
    Cancelled,
}

impl FlowState {
    /// Whether no further transition can happen
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Cancelled)
    }

    /// Short label for log lines
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TokenPending => "token_pending",
            Self::TokenAcquired => "token_acquired",
            Self::SetupPending => "setup_pending",
            Self::Done { .. } => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Status of the token acquisition phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, uniffi::Enum)]
pub enum TokenStatus {
    /// Not requested yet
    #[default]
    NotRequested,
    /// Requested, no callback yet
    Pending,
    /// The success callback fired
    Acquired,
    /// The error callback fired
    Failed,
}

/// Mutable progress of an invocation, guarded by the invocation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowProgress {
    /// Flow state
    pub state: FlowState,
    /// Token phase status
    pub token: TokenStatus,
    /// Whether any controller call was issued
    pub sdk_engaged: bool,
    /// Whether the start sequence is running; a cancel then leaves `controller.cancel()` to it
    pub presenting: bool,
}

impl Default for FlowProgress {
    fn default() -> Self {
        Self {
            state: FlowState::Idle,
            token: TokenStatus::NotRequested,
            sdk_engaged: false,
            presenting: false,
        }
    }
}

impl FlowProgress {
    /// Idle → `TokenPending` when the token request is issued.
    pub fn token_requested(&mut self) {
        self.token = TokenStatus::Pending;
        if self.state == FlowState::Idle {
            self.state = FlowState::TokenPending;
        }
    }

    /// Records the token success callback; silent, never terminal.
    pub fn token_acquired(&mut self) {
        self.token = TokenStatus::Acquired;
        if self.state == FlowState::TokenPending {
            self.state = FlowState::TokenAcquired;
        }
    }

    /// Records the token error callback without ending the flow.
    pub fn token_failed(&mut self) {
        self.token = TokenStatus::Failed;
    }

    /// Enters `SetupPending` unless the flow already ended.
    pub fn setup_requested(&mut self) {
        if !self.state.is_terminal() {
            self.state = FlowState::SetupPending;
        }
    }

    /// Claims the next controller call of the start sequence. Returns `false` once cancelled.
    ///
    /// A flow that already reached `Done` keeps going, so device setup still starts after a
    /// synchronous token failure.
    pub fn begin_sdk_call(&mut self) -> bool {
        if self.state == FlowState::Cancelled {
            return false;
        }
        self.sdk_engaged = true;
        self.presenting = true;
        true
    }

    /// Ends the start sequence. Returns whether a cancel arrived meanwhile that the controller
    /// still has to hear about.
    pub fn end_presenting(&mut self) -> bool {
        let was_presenting = std::mem::replace(&mut self.presenting, false);
        was_presenting && self.sdk_engaged && self.state == FlowState::Cancelled
    }

    /// Ends the flow with `outcome`. Returns `false` if it had already ended.
    pub fn finish(&mut self, outcome: OnboardingOutcome) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = FlowState::Done { outcome };
        true
    }

    /// Cancels the flow. Returns `false` if it had already ended.
    pub fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = FlowState::Cancelled;
        true
    }
}
