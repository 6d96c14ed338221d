use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::blinkup_export;
use crate::onboarding::arguments::{
    parse_arguments, ArgumentError, ArgumentValue, InvocationRequest,
};
use crate::onboarding::callbacks::{
    ServerErrorHandler, SetupCompletionTargets, TokenAcquireCallback, UiTask,
};
use crate::onboarding::classify::{classify_token_error, TokenError};
use crate::onboarding::collaborators::{
    BlinkUpController, MessageDisplay, MessageDuration, UiExecutor,
};
use crate::onboarding::error::{BlinkUpError, BlinkUpResult};
use crate::onboarding::plan_id::{PlanIdResolver, PlanIdSelection};
use crate::onboarding::result_channel::{
    FailureKind, OnboardingOutcome, ResultCallback, ResultChannel,
};
use crate::onboarding::state::{FlowProgress, FlowState, TokenStatus};
use crate::primitives::config::{current_config, BlinkUpConfig, TokenErrorPolicy};
use crate::primitives::key_value_store::DeviceKeyValueStore;

/// Plugin action handled by [`OnboardingOrchestrator::execute`], matched case-insensitively.
pub const INVOKE_BLINKUP_ACTION: &str = "invokeBlinkUp";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Everything one invocation needs, shared by the callback objects handed to the host.
pub(crate) struct InvocationContext {
    id: u64,
    request: InvocationRequest,
    progress: Mutex<FlowProgress>,
    plan_id: Mutex<Option<PlanIdSelection>>,
    channel: Arc<ResultChannel>,
    cancellation: CancellationToken,
    controller: Arc<dyn BlinkUpController>,
    display: Arc<dyn MessageDisplay>,
    resolver: Arc<PlanIdResolver>,
    config: Arc<BlinkUpConfig>,
}

impl InvocationContext {
    fn progress(&self) -> MutexGuard<'_, FlowProgress> {
        lock(&self.progress)
    }

    fn is_finished(&self) -> bool {
        self.progress().state.is_terminal()
    }

    /// Runs the start sequence on the UI thread:
    /// resolve plan id → configure controller → register completion targets →
    /// acquire token → start device setup.
    ///
    /// Never holds a lock while calling into the controller, since SDK callbacks may arrive
    /// synchronously. A cancel landing while this runs stops the sequence at the next controller
    /// call, and `controller.cancel()` is issued here if the SDK was already reached.
    pub(crate) fn present(self: &Arc<Self>) {
        if self.cancellation.is_cancelled() {
            crate::info!(
                "onboarding.present_skipped id={} reason=cancelled timestamp={}",
                self.id,
                timestamp()
            );
            return;
        }

        let selection = self
            .resolver
            .resolve(&self.request, self.config.build_flavor());
        let plan_id = selection.plan_id().map(str::to_string);
        crate::info!(
            "onboarding.plan_id_resolved id={} source={} timestamp={}",
            self.id,
            selection.source(),
            timestamp()
        );
        *lock(&self.plan_id) = Some(selection);

        if let Some(plan_id) = plan_id {
            if !self.enter_controller() {
                return;
            }
            self.controller.configure_plan_id(plan_id);
        }

        if !self.enter_controller() {
            return;
        }
        self.controller
            .register_completion_targets(SetupCompletionTargets::new(Arc::clone(self)));

        if !self.enter_controller() {
            return;
        }
        self.progress().token_requested();
        crate::info!(
            "onboarding.token_requested id={} timestamp={}",
            self.id,
            timestamp()
        );
        self.controller.acquire_setup_token(
            self.request.api_key().to_string(),
            TokenAcquireCallback::new(Arc::clone(self)),
        );

        if !self.enter_controller() {
            return;
        }
        self.progress().setup_requested();
        crate::info!(
            "onboarding.setup_requested id={} timeout_ms={} timestamp={}",
            self.id,
            self.request.timeout_ms(),
            timestamp()
        );
        self.controller.select_wifi_and_setup_device(
            self.request.api_key().to_string(),
            self.request.timeout_ms(),
            ServerErrorHandler::new(Arc::clone(self)),
        );

        let cancelled_meanwhile = self.progress().end_presenting();
        if cancelled_meanwhile {
            self.cancel_controller();
        }
    }

    /// Checkpoint before each controller call of the start sequence. Returns `false` once the
    /// invocation was cancelled, after forwarding the cancel to the controller if it was reached.
    fn enter_controller(&self) -> bool {
        let cancel_sdk = {
            let mut progress = self.progress();
            if progress.begin_sdk_call() {
                return true;
            }
            progress.end_presenting()
        };

        crate::info!(
            "onboarding.present_stopped id={} reason=cancelled timestamp={}",
            self.id,
            timestamp()
        );
        if cancel_sdk {
            self.cancel_controller();
        }
        false
    }

    fn cancel_controller(&self) {
        crate::debug!("onboarding.controller_cancel id={}", self.id);
        self.controller.cancel();
    }

    pub(crate) fn on_token_acquired(&self, plan_id: &str, _token_id: &str) {
        let mut progress = self.progress();
        if progress.state.is_terminal() {
            crate::debug!(
                "onboarding.late_callback id={} callback=token_success state={}",
                self.id,
                progress.state.label()
            );
            return;
        }
        progress.token_acquired();
        drop(progress);

        crate::info!(
            "onboarding.token_acquired id={} plan_id={} timestamp={}",
            self.id,
            plan_id,
            timestamp()
        );
    }

    pub(crate) fn on_token_error(&self, message: &str) {
        {
            let mut progress = self.progress();
            if progress.state.is_terminal() {
                crate::debug!(
                    "onboarding.late_callback id={} callback=token_error state={}",
                    self.id,
                    progress.state.label()
                );
                return;
            }
            progress.token_failed();
        }

        let error = classify_token_error(message);
        let duration = match error {
            TokenError::InvalidApiKey => MessageDuration::Long,
            TokenError::Other(_) => MessageDuration::Short,
        };
        self.display.show_message(error.operator_message(), duration);

        match error {
            TokenError::InvalidApiKey => {
                crate::warn!(
                    "onboarding.token_failed id={} classification=invalid_api_key timestamp={}",
                    self.id,
                    timestamp()
                );
                self.finish(OnboardingOutcome::Failure {
                    kind: FailureKind::InvalidApiKey,
                });
            }
            TokenError::Other(message) => match self.config.token_error_policy() {
                TokenErrorPolicy::DisplayOnly => {
                    crate::warn!(
                        "onboarding.token_failed id={} classification=other delivered=false message={} timestamp={}",
                        self.id,
                        message,
                        timestamp()
                    );
                }
                TokenErrorPolicy::DeliverFailure => {
                    crate::warn!(
                        "onboarding.token_failed id={} classification=other delivered=true message={} timestamp={}",
                        self.id,
                        message,
                        timestamp()
                    );
                    self.finish(OnboardingOutcome::Failure {
                        kind: FailureKind::OtherTransportError { message },
                    });
                }
            },
        }
    }

    pub(crate) fn on_server_error(&self, message: &str) {
        crate::warn!(
            "onboarding.server_error id={} message={} timestamp={}",
            self.id,
            message,
            timestamp()
        );
        self.finish(OnboardingOutcome::Failure {
            kind: FailureKind::ServerVerificationFailed {
                message: message.to_string(),
            },
        });
    }

    pub(crate) fn on_setup_complete(&self, plan_id: Option<&str>) {
        let outcome = OnboardingOutcome::Success;
        if !self.enter_done(&outcome) {
            return;
        }
        if let Some(plan_id) = plan_id {
            if let Err(e) = self.resolver.store_plan_id(plan_id) {
                crate::error!(
                    "onboarding.plan_id_cache_failed id={} error={} timestamp={}",
                    self.id,
                    e,
                    timestamp()
                );
            }
        }
        self.deliver(outcome);
    }

    pub(crate) fn on_clear_complete(&self) {
        let outcome = OnboardingOutcome::Success;
        if !self.enter_done(&outcome) {
            return;
        }
        if let Err(e) = self.resolver.clear_cached_plan_id() {
            crate::error!(
                "onboarding.plan_id_clear_failed id={} error={} timestamp={}",
                self.id,
                e,
                timestamp()
            );
        }
        self.deliver(outcome);
    }

    /// Moves to `Done` and delivers `outcome`, unless the flow already ended.
    fn finish(&self, outcome: OnboardingOutcome) {
        if self.enter_done(&outcome) {
            self.deliver(outcome);
        }
    }

    /// Moves to `Done`. Returns `false` if the flow already ended; nothing else may happen then.
    fn enter_done(&self, outcome: &OnboardingOutcome) -> bool {
        if self.progress().finish(outcome.clone()) {
            return true;
        }
        crate::debug!(
            "onboarding.late_outcome_ignored id={} outcome={}",
            self.id,
            outcome.label()
        );
        false
    }

    fn deliver(&self, outcome: OnboardingOutcome) {
        let label = outcome.label();
        match self.channel.deliver(outcome) {
            Ok(()) => crate::info!(
                "onboarding.completed id={} outcome={} timestamp={}",
                self.id,
                label,
                timestamp()
            ),
            Err(e) => crate::error!(
                "onboarding.delivery_failed id={} error={} timestamp={}",
                self.id,
                e,
                timestamp()
            ),
        }
    }

    /// Cancels the invocation. Returns `false` if it had already ended.
    ///
    /// While the start sequence runs, forwarding the cancel to the controller is left to it.
    fn cancel(&self) -> bool {
        let cancel_sdk = {
            let mut progress = self.progress();
            if !progress.cancel() {
                return false;
            }
            progress.sdk_engaged && !progress.presenting
        };

        self.cancellation.cancel();
        if cancel_sdk {
            self.cancel_controller();
        }
        crate::info!(
            "onboarding.cancelled id={} controller_cancelled={} timestamp={}",
            self.id,
            cancel_sdk,
            timestamp()
        );
        true
    }
}

/// Handle to one invocation, returned to the plugin layer.
#[derive(uniffi::Object)]
pub struct InvocationHandle {
    invocation_id: u64,
    channel: Arc<ResultChannel>,
    cancellation: CancellationToken,
    context: Option<Arc<InvocationContext>>,
}

impl std::fmt::Debug for InvocationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationHandle")
            .field("invocation_id", &self.invocation_id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl InvocationHandle {
    fn rejected(invocation_id: u64, channel: Arc<ResultChannel>) -> Arc<Self> {
        Arc::new(Self {
            invocation_id,
            channel,
            cancellation: CancellationToken::new(),
            context: None,
        })
    }

    fn started(context: &Arc<InvocationContext>) -> Arc<Self> {
        Arc::new(Self {
            invocation_id: context.id,
            channel: Arc::clone(&context.channel),
            cancellation: context.cancellation.clone(),
            context: Some(Arc::clone(context)),
        })
    }
}

#[blinkup_export]
impl InvocationHandle {
    /// Id of this invocation, as used in log lines
    #[must_use]
    pub fn invocation_id(&self) -> u64 {
        self.invocation_id
    }

    /// Current flow state. A rejected invocation is already `Done`.
    #[must_use]
    pub fn state(&self) -> FlowState {
        self.context.as_ref().map_or_else(
            || {
                self.channel
                    .outcome()
                    .map_or(FlowState::Idle, |outcome| FlowState::Done { outcome })
            },
            |context| context.progress().state.clone(),
        )
    }

    /// Status of the token acquisition phase
    #[must_use]
    pub fn token_status(&self) -> TokenStatus {
        self.context
            .as_ref()
            .map_or(TokenStatus::NotRequested, |context| context.progress().token)
    }

    /// The plan id chosen for this invocation, once the UI task has run
    #[must_use]
    pub fn plan_id_selection(&self) -> Option<PlanIdSelection> {
        self.context
            .as_ref()
            .and_then(|context| lock(&context.plan_id).clone())
    }

    /// The delivered outcome, if any
    #[must_use]
    pub fn outcome(&self) -> Option<OnboardingOutcome> {
        self.channel.outcome()
    }

    /// Whether the invocation reached `Done` or was cancelled
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.context
            .as_ref()
            .is_none_or(|context| context.is_finished())
    }

    /// Cancels the invocation: pending callbacks are ignored, nothing is delivered and the
    /// controller is asked, best effort, to stop. Returns `false` if it had already ended.
    pub fn cancel(&self) -> bool {
        self.context
            .as_ref()
            .is_some_and(|context| context.cancel())
    }

    /// Waits until an outcome is delivered. Returns `None` if the invocation is cancelled first.
    pub async fn wait_for_outcome(&self) -> Option<OnboardingOutcome> {
        let mut receiver = self.channel.subscribe();
        loop {
            let current = receiver.borrow_and_update().clone();
            if current.is_some() {
                return current;
            }

            tokio::select! {
                () = self.cancellation.cancelled() => return self.channel.outcome(),
                changed = receiver.changed() => {
                    if changed.is_err() {
                        return self.channel.outcome();
                    }
                }
            }
        }
    }
}

/// Entry point of the onboarding core: one per plugin instance.
///
/// Only one invocation may be in flight at a time; each gets its own context, so nothing is
/// shared between invocations apart from the collaborators.
///
/// ## Kotlin
///
/// ```kotlin
/// val orchestrator = OnboardingOrchestrator(
///     SdkController(activity), PreferencesStore(activity), ToastDisplay(activity),
///     ActivityUiExecutor(activity), null,
/// )
///
/// override fun execute(action: String, data: JSONArray, callbackContext: CallbackContext): Boolean {
///     orchestrator.execute(action, data.toString(), CordovaResultCallback(callbackContext))
///     return true
/// }
///
/// override fun onActivityResult(requestCode: Int, resultCode: Int, intent: Intent?) {
///     if (resultCode == Activity.RESULT_CANCELED) {
///         orchestrator.cancelCurrent()
///         return
///     }
///     BlinkupController.getInstance().handleActivityResult(cordova.activity, resultCode)
/// }
/// ```
#[derive(uniffi::Object)]
pub struct OnboardingOrchestrator {
    controller: Arc<dyn BlinkUpController>,
    display: Arc<dyn MessageDisplay>,
    ui_executor: Arc<dyn UiExecutor>,
    resolver: Arc<PlanIdResolver>,
    config: Arc<BlinkUpConfig>,
    next_invocation_id: AtomicU64,
    current: Mutex<Option<Arc<InvocationContext>>>,
}

#[blinkup_export]
impl OnboardingOrchestrator {
    /// Creates an orchestrator. Without `config` the process-wide configuration is used.
    #[uniffi::constructor]
    pub fn new(
        controller: Arc<dyn BlinkUpController>,
        kv_store: Arc<dyn DeviceKeyValueStore>,
        display: Arc<dyn MessageDisplay>,
        ui_executor: Arc<dyn UiExecutor>,
        config: Option<Arc<BlinkUpConfig>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            controller,
            display,
            ui_executor,
            resolver: Arc::new(PlanIdResolver::new(kv_store)),
            config: config.unwrap_or_else(current_config),
            next_invocation_id: AtomicU64::new(0),
            current: Mutex::new(None),
        })
    }

    /// Handles a raw plugin call: `action` must be `invokeBlinkUp` (any case) and `payload` a
    /// JSON array of the four positional arguments.
    ///
    /// # Errors
    /// - `BlinkUpError::UnsupportedAction` for any other action; `callback` is not called
    /// - `BlinkUpError::InvocationInProgress` if a valid payload arrives while an invocation is in
    ///   flight; `callback` is not called
    pub fn execute(
        &self,
        action: String,
        payload: String,
        callback: Arc<dyn ResultCallback>,
    ) -> Result<Arc<InvocationHandle>, BlinkUpError> {
        if !action.eq_ignore_ascii_case(INVOKE_BLINKUP_ACTION) {
            crate::warn!("onboarding.unsupported_action action={}", action);
            return Err(BlinkUpError::UnsupportedAction { action });
        }
        self.start(parse_arguments(&payload), callback)
    }

    /// Starts an invocation from positional arguments
    /// `[apiKey, developerPlanId, timeoutMs, useCachedPlanId]`.
    ///
    /// Invalid arguments are reported through `callback` as `INVALID_ARGUMENTS` and the returned
    /// handle is already finished. Otherwise the presenting sequence is handed to the UI executor.
    ///
    /// # Errors
    /// `BlinkUpError::InvocationInProgress` if the arguments are valid but an invocation is in
    /// flight; `callback` is not called.
    pub fn invoke_blinkup(
        &self,
        arguments: Vec<ArgumentValue>,
        callback: Arc<dyn ResultCallback>,
    ) -> Result<Arc<InvocationHandle>, BlinkUpError> {
        self.start(Ok(arguments), callback)
    }

    /// Cancels the in-flight invocation, if any. Returns whether something was cancelled.
    ///
    /// The SDK reports nothing when the operator backs out of the BlinkUp screens, so the host
    /// must call this on a cancelled activity result; otherwise the invocation stays in flight
    /// and every later call fails with `InvocationInProgress`.
    pub fn cancel_current(&self) -> bool {
        let current = lock(&self.current).clone();
        current.is_some_and(|context| context.cancel())
    }
}

impl OnboardingOrchestrator {
    fn start(
        &self,
        arguments: Result<Vec<ArgumentValue>, ArgumentError>,
        callback: Arc<dyn ResultCallback>,
    ) -> BlinkUpResult<Arc<InvocationHandle>> {
        let invocation_id = self.next_invocation_id.fetch_add(1, Ordering::Relaxed) + 1;
        let channel = Arc::new(ResultChannel::new(callback));

        // Validation comes first: a bad payload is always answered, even while another
        // invocation is in flight, and never occupies the slot.
        let request = match arguments
            .and_then(|arguments| InvocationRequest::from_arguments(&arguments))
        {
            Ok(request) => request,
            Err(e) => {
                crate::warn!(
                    "onboarding.invalid_arguments id={} reason={} timestamp={}",
                    invocation_id,
                    e,
                    timestamp()
                );
                if let Err(e) = channel.fail(FailureKind::InvalidArguments {
                    reason: e.to_string(),
                }) {
                    crate::error!("onboarding.delivery_failed id={} error={}", invocation_id, e);
                }
                return Ok(InvocationHandle::rejected(invocation_id, channel));
            }
        };

        let mut current = lock(&self.current);
        if let Some(active) = current.as_ref().filter(|context| !context.is_finished()) {
            crate::warn!(
                "onboarding.rejected_concurrent id={} active_id={} timestamp={}",
                invocation_id,
                active.id,
                timestamp()
            );
            return Err(BlinkUpError::InvocationInProgress {
                invocation_id: active.id,
            });
        }

        crate::info!(
            "onboarding.started id={} timeout_ms={} use_cached_plan_id={} developer_plan_id_set={} timestamp={}",
            invocation_id,
            request.timeout_ms(),
            request.use_cached_plan_id(),
            !request.developer_plan_id().is_empty(),
            timestamp()
        );

        let context = Arc::new(InvocationContext {
            id: invocation_id,
            request,
            progress: Mutex::new(FlowProgress::default()),
            plan_id: Mutex::new(None),
            channel,
            cancellation: CancellationToken::new(),
            controller: Arc::clone(&self.controller),
            display: Arc::clone(&self.display),
            resolver: Arc::clone(&self.resolver),
            config: Arc::clone(&self.config),
        });
        *current = Some(Arc::clone(&context));
        drop(current);

        self.ui_executor
            .run_on_ui_thread(UiTask::new(Arc::clone(&context)));

        Ok(InvocationHandle::started(&context))
    }
}
