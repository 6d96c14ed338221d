//! Interfaces implemented by the native host around the onboarding core.

use std::sync::Arc;

use crate::onboarding::callbacks::{
    ServerErrorHandler, SetupCompletionTargets, TokenAcquireCallback, UiTask,
};

/// The BlinkUp SDK controller (`BlinkupController` on Android, `BUBasicController` on iOS).
///
/// The host forwards each call to the SDK and invokes the supplied callback objects when the SDK
/// reports back, from whatever thread the SDK uses.
///
/// ## Kotlin
///
/// ```kotlin
/// class SdkController(private val activity: Activity) : BlinkUpController {
///     private val controller = BlinkupController.getInstance()
///
///     override fun configurePlanId(planId: String) = controller.setPlanID(planId)
///
///     override fun acquireSetupToken(apiKey: String, callback: TokenAcquireCallback) {
///         controller.acquireSetupToken(activity, apiKey, object : BlinkupController.TokenAcquireCallback {
///             override fun onSuccess(planId: String, id: String) = callback.onSuccess(planId, id)
///             override fun onError(message: String) = callback.onError(message)
///         })
///     }
///     // ...
/// }
/// ```
#[uniffi::export(with_foreign)]
pub trait BlinkUpController: Send + Sync {
    /// Sets the plan id used for the next setup. Not called when the SDK should generate one.
    fn configure_plan_id(&self, plan_id: String);

    /// Registers the continuations the host's activity-result handler invokes when the BlinkUp
    /// or clear screens complete.
    fn register_completion_targets(&self, targets: Arc<SetupCompletionTargets>);

    /// Starts acquiring a setup token for `api_key`.
    fn acquire_setup_token(&self, api_key: String, callback: Arc<TokenAcquireCallback>);

    /// Presents network selection and device setup.
    ///
    /// `timeout_ms` is passed through untouched; enforcing it is up to the SDK.
    fn select_wifi_and_setup_device(
        &self,
        api_key: String,
        timeout_ms: u64,
        server_error_handler: Arc<ServerErrorHandler>,
    );

    /// Best-effort request to abandon the running flow. The SDK may ignore it.
    fn cancel(&self);
}

/// How long a transient message stays on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MessageDuration {
    /// `Toast.LENGTH_SHORT`
    Short,
    /// `Toast.LENGTH_LONG`
    Long,
}

/// Transient, human-readable diagnostics for the operator (a toast on Android).
#[uniffi::export(with_foreign)]
pub trait MessageDisplay: Send + Sync {
    /// Shows `message` for `duration`
    fn show_message(&self, message: String, duration: MessageDuration);
}

/// Schedules work on the platform's UI thread.
///
/// Plugin calls arrive on a background thread, but presenting the BlinkUp screens must happen
/// on the UI thread. Implementations must eventually call [`UiTask::run`] exactly once there.
///
/// ## Kotlin
///
/// ```kotlin
/// class ActivityUiExecutor(private val activity: Activity) : UiExecutor {
///     override fun runOnUiThread(task: UiTask) = activity.runOnUiThread { task.run() }
/// }
/// ```
#[uniffi::export(with_foreign)]
pub trait UiExecutor: Send + Sync {
    /// Runs `task` on the UI thread
    fn run_on_ui_thread(&self, task: Arc<UiTask>);
}
