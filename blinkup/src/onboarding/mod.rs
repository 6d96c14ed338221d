//! BlinkUp Onboarding
//!
//! The core behind the plugin's `invokeBlinkUp` action.
//!
//! # Overview
//!
//! An invocation moves through:
//! - [`InvocationRequest`]: strict validation of `[apiKey, developerPlanId, timeoutMs, useCachedPlanId]`
//! - [`PlanIdResolver`]: picks the plan id from the developer override or the cached value
//! - [`OnboardingOrchestrator`]: runs token acquisition, then network selection and device setup
//! - [`ResultChannel`]: reports exactly one outcome to the caller's [`ResultCallback`]
//!
//! Token acquisition and device setup are started back to back. The token phase is silent on
//! success; its errors are classified by [`classify_token_error`] and shown to the operator
//! through [`MessageDisplay`]. Only an authentication failure (`INVALID_API_KEY`) is delivered
//! by default, see [`TokenErrorPolicy`](crate::primitives::config::TokenErrorPolicy).
//!
//! The plan id the SDK used is cached under [`PLAN_ID_KEY`] in the host's
//! `DeviceKeyValueStore` when setup completes, and removed when the device's configuration is
//! cleared.
//!
//! # Usage
//!
//! ## Platform Usage (Kotlin)
//!
//! ```kotlin
//! // 1. Create the orchestrator once per plugin instance
//! val orchestrator = OnboardingOrchestrator(
//!     SdkController(activity),
//!     PreferencesStore(activity),
//!     ToastDisplay(activity),
//!     ActivityUiExecutor(activity),
//!     null, // use the process-wide BlinkUpConfig
//! )
//!
//! // 2. Forward plugin calls
//! val handle = orchestrator.execute("invokeBlinkUp", args.toString(), CordovaResultCallback(ctx))
//!
//! // 3. Optionally abandon the flow
//! handle.cancel()
//! ```
//!
//! ## Outcomes
//!
//! | Outcome | Code |
//! |---------|------|
//! | Setup or clear completed | success |
//! | Invalid payload | `INVALID_ARGUMENTS` |
//! | Token request rejected with 401 | `INVALID_API_KEY` |
//! | Server error during setup | `VERIFY_API_KEY_FAIL` |
//! | Other token error (opt-in) | `TRANSPORT_ERROR` |

mod arguments;
mod callbacks;
mod classify;
mod collaborators;
mod error;
mod orchestrator;
mod plan_id;
mod result_channel;
mod state;


// Public API exports
pub use arguments::{parse_arguments, ArgumentError, ArgumentValue, InvocationRequest};
pub use callbacks::{ServerErrorHandler, SetupCompletionTargets, TokenAcquireCallback, UiTask};
pub use classify::{classify_token_error, TokenError, INVALID_API_KEY_MESSAGE};
pub use collaborators::{BlinkUpController, MessageDisplay, MessageDuration, UiExecutor};
pub use error::{BlinkUpError, BlinkUpResult};
pub use orchestrator::{InvocationHandle, OnboardingOrchestrator, INVOKE_BLINKUP_ACTION};
pub use plan_id::{PlanIdResolver, PlanIdSelection, PLAN_ID_KEY};
pub use result_channel::{
    DeliveryError, FailureKind, OnboardingErrorCode, OnboardingOutcome, ResultCallback,
    ResultChannel,
};
pub use state::{FlowProgress, FlowState, TokenStatus};
