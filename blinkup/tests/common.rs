#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use blinkup::onboarding::{
    BlinkUpController, MessageDisplay, MessageDuration, OnboardingErrorCode, ResultCallback,
    ServerErrorHandler, SetupCompletionTargets, TokenAcquireCallback, UiExecutor, UiTask,
};
use blinkup::primitives::key_value_store::{DeviceKeyValueStore, KeyValueStoreError};
use blinkup::primitives::logger::{LogLevel, Logger};

/// Stand-in for the SDK controller, holding on to the callbacks it receives
#[derive(Default)]
pub struct FakeSdk {
    pub configured_plan_ids: Mutex<Vec<String>>,
    pub setups_started: Mutex<Vec<(String, u64)>>,
    pub cancelled: Mutex<bool>,
    token_callback: Mutex<Option<Arc<TokenAcquireCallback>>>,
    server_error_handler: Mutex<Option<Arc<ServerErrorHandler>>>,
    completion_targets: Mutex<Option<Arc<SetupCompletionTargets>>>,
}

impl FakeSdk {
    pub fn token_callback(&self) -> Arc<TokenAcquireCallback> {
        self.token_callback
            .lock()
            .unwrap()
            .clone()
            .expect("token acquisition was not started")
    }

    pub fn server_error_handler(&self) -> Arc<ServerErrorHandler> {
        self.server_error_handler
            .lock()
            .unwrap()
            .clone()
            .expect("device setup was not started")
    }

    pub fn completion_targets(&self) -> Arc<SetupCompletionTargets> {
        self.completion_targets
            .lock()
            .unwrap()
            .clone()
            .expect("completion targets were not registered")
    }
}

impl BlinkUpController for FakeSdk {
    fn configure_plan_id(&self, plan_id: String) {
        self.configured_plan_ids.lock().unwrap().push(plan_id);
    }

    fn register_completion_targets(&self, targets: Arc<SetupCompletionTargets>) {
        *self.completion_targets.lock().unwrap() = Some(targets);
    }

    fn acquire_setup_token(&self, _api_key: String, callback: Arc<TokenAcquireCallback>) {
        *self.token_callback.lock().unwrap() = Some(callback);
    }

    fn select_wifi_and_setup_device(
        &self,
        api_key: String,
        timeout_ms: u64,
        server_error_handler: Arc<ServerErrorHandler>,
    ) {
        self.setups_started
            .lock()
            .unwrap()
            .push((api_key, timeout_ms));
        *self.server_error_handler.lock().unwrap() = Some(server_error_handler);
    }

    fn cancel(&self) {
        *self.cancelled.lock().unwrap() = true;
    }
}

/// `SharedPreferences`-like store
#[derive(Default)]
pub struct InMemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryPreferences {
    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

impl DeviceKeyValueStore for InMemoryPreferences {
    fn get(&self, key: String) -> Result<String, KeyValueStoreError> {
        self.value(&key).ok_or(KeyValueStoreError::KeyNotFound)
    }

    fn set(&self, key: String, value: String) -> Result<(), KeyValueStoreError> {
        self.values.lock().unwrap().insert(key, value);
        Ok(())
    }

    fn delete(&self, key: String) -> Result<(), KeyValueStoreError> {
        self.values
            .lock()
            .unwrap()
            .remove(&key)
            .map(|_| ())
            .ok_or(KeyValueStoreError::KeyNotFound)
    }
}

#[derive(Default)]
pub struct Toasts {
    pub shown: Mutex<Vec<(String, MessageDuration)>>,
}

impl MessageDisplay for Toasts {
    fn show_message(&self, message: String, duration: MessageDuration) {
        self.shown.lock().unwrap().push((message, duration));
    }
}

/// Runs UI tasks on a separate thread, like `runOnUiThread` from a plugin thread
pub struct ThreadUiExecutor;

impl UiExecutor for ThreadUiExecutor {
    fn run_on_ui_thread(&self, task: Arc<UiTask>) {
        std::thread::spawn(move || task.run())
            .join()
            .expect("UI thread panicked");
    }
}

/// Mirrors Cordova's `CallbackContext`
#[derive(Default)]
pub struct CordovaCallback {
    pub successes: Mutex<usize>,
    pub errors: Mutex<Vec<(OnboardingErrorCode, Option<String>)>>,
}

impl CordovaCallback {
    pub fn total(&self) -> usize {
        *self.successes.lock().unwrap() + self.errors.lock().unwrap().len()
    }
}

impl ResultCallback for CordovaCallback {
    fn success(&self) {
        *self.successes.lock().unwrap() += 1;
    }

    fn error(&self, code: OnboardingErrorCode, detail: Option<String>) {
        self.errors.lock().unwrap().push((code, detail));
    }
}

/// Logger collecting forwarded records
#[derive(Default)]
pub struct CollectingLogger {
    pub records: Mutex<Vec<(LogLevel, String)>>,
}

impl Logger for CollectingLogger {
    fn log(&self, level: LogLevel, message: String) {
        self.records.lock().unwrap().push((level, message));
    }
}
