//! Objects handed to the host so SDK callbacks can reach the invocation that started them.
//!
//! Each object holds its invocation's context; callbacks arriving after the invocation ended
//! are ignored.

use std::sync::Arc;

use crate::blinkup_export;
use crate::onboarding::orchestrator::InvocationContext;

/// Token acquisition callback pair.
#[derive(uniffi::Object)]
pub struct TokenAcquireCallback {
    context: Arc<InvocationContext>,
}

impl TokenAcquireCallback {
    pub(crate) fn new(context: Arc<InvocationContext>) -> Arc<Self> {
        Arc::new(Self { context })
    }
}

#[blinkup_export]
impl TokenAcquireCallback {
    /// The SDK acquired a setup token. Silent: no outcome is delivered.
    pub fn on_success(&self, plan_id: String, token_id: String) {
        self.context.on_token_acquired(&plan_id, &token_id);
    }

    /// The SDK failed to acquire a setup token.
    pub fn on_error(&self, message: String) {
        self.context.on_token_error(&message);
    }
}

/// Server error handler for the device setup flow.
#[derive(uniffi::Object)]
pub struct ServerErrorHandler {
    context: Arc<InvocationContext>,
}

impl ServerErrorHandler {
    pub(crate) fn new(context: Arc<InvocationContext>) -> Arc<Self> {
        Arc::new(Self { context })
    }
}

#[blinkup_export]
impl ServerErrorHandler {
    /// Server verification failed during setup.
    pub fn on_error(&self, message: String) {
        self.context.on_server_error(&message);
    }
}

/// Continuations for the host's activity-result handler.
///
/// Android: `onActivityResult` hands the result to the SDK, which starts the "BlinkUp complete"
/// or "clear complete" screen; those screens call into this object.
#[derive(uniffi::Object)]
pub struct SetupCompletionTargets {
    context: Arc<InvocationContext>,
}

impl SetupCompletionTargets {
    pub(crate) fn new(context: Arc<InvocationContext>) -> Arc<Self> {
        Arc::new(Self { context })
    }
}

#[blinkup_export]
impl SetupCompletionTargets {
    /// The device was set up. `plan_id` is the plan id the SDK used, cached for later runs.
    pub fn setup_complete(&self, plan_id: Option<String>) {
        self.context.on_setup_complete(plan_id.as_deref());
    }

    /// The device's wireless configuration was cleared. The cached plan id is removed.
    pub fn clear_complete(&self) {
        self.context.on_clear_complete();
    }
}

/// The presenting half of an invocation, run on the UI thread.
#[derive(uniffi::Object)]
pub struct UiTask {
    context: Arc<InvocationContext>,
}

impl UiTask {
    pub(crate) fn new(context: Arc<InvocationContext>) -> Arc<Self> {
        Arc::new(Self { context })
    }
}

#[blinkup_export]
impl UiTask {
    /// Resolves the plan id and starts token acquisition and device setup.
    /// A no-op if the invocation was cancelled first.
    pub fn run(&self) {
        self.context.present();
    }
}
