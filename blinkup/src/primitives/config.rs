use std::sync::{Arc, OnceLock};

use crate::blinkup_export;

static CONFIG_INSTANCE: OnceLock<Arc<BlinkUpConfig>> = OnceLock::new();

/// Build flavor of the host application.
///
/// Developer plan ids are only honoured in `Debug` builds so that a test plan id can never
/// leak into devices provisioned by a release build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum BuildFlavor {
    /// Developer build (`BuildConfig.DEBUG` on Android, `DEBUG` on iOS)
    Debug,
    /// Store/release build
    Release,
}

impl BuildFlavor {
    /// Returns the string representation of the flavor
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    /// Whether developer overrides apply
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        matches!(self, Self::Debug)
    }
}

impl std::fmt::Display for BuildFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do with a token acquisition error that is not an authentication failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, uniffi::Enum)]
pub enum TokenErrorPolicy {
    /// Show the message to the operator only. The invocation stays open and the device setup
    /// flow decides the final outcome.
    #[default]
    DisplayOnly,
    /// Show the message and also end the invocation with a `TRANSPORT_ERROR` delivery.
    DeliverFailure,
}

/// Configuration for the onboarding flow.
#[derive(Debug, Clone, uniffi::Object)]
pub struct BlinkUpConfig {
    build_flavor: BuildFlavor,
    token_error_policy: TokenErrorPolicy,
}

#[blinkup_export]
impl BlinkUpConfig {
    /// Creates a new configuration.
    ///
    /// # Examples
    ///
    /// ## Kotlin
    ///
    /// ```kotlin
    /// val flavor = if (BuildConfig.DEBUG) BuildFlavor.DEBUG else BuildFlavor.RELEASE
    /// val config = BlinkUpConfig(flavor, TokenErrorPolicy.DISPLAY_ONLY)
    /// ```
    #[uniffi::constructor]
    #[must_use]
    pub fn new(build_flavor: BuildFlavor, token_error_policy: TokenErrorPolicy) -> Self {
        Self {
            build_flavor,
            token_error_policy,
        }
    }

    /// Build flavor of the host
    #[must_use]
    pub fn build_flavor(&self) -> BuildFlavor {
        self.build_flavor
    }

    /// Policy for uncatalogued token acquisition errors
    #[must_use]
    pub fn token_error_policy(&self) -> TokenErrorPolicy {
        self.token_error_policy
    }
}

impl Default for BlinkUpConfig {
    /// `Release` with `DisplayOnly`: no developer overrides and no extra deliveries.
    fn default() -> Self {
        Self::new(BuildFlavor::Release, TokenErrorPolicy::DisplayOnly)
    }
}

/// Installs the process-wide configuration used by orchestrators created without one.
///
/// Call once when the plugin initializes. Later calls are ignored with a warning.
#[uniffi::export]
pub fn init_blinkup_config(build_flavor: BuildFlavor, token_error_policy: TokenErrorPolicy) {
    let config = Arc::new(BlinkUpConfig::new(build_flavor, token_error_policy));

    if CONFIG_INSTANCE.set(config).is_ok() {
        crate::info!(
            "BlinkUp config initialized build_flavor={} token_error_policy={:?}",
            build_flavor,
            token_error_policy
        );
    } else {
        crate::warn!("BlinkUp config already initialized, ignoring");
    }
}

/// Returns the process-wide configuration, or the release default when none was installed.
#[must_use]
pub fn current_config() -> Arc<BlinkUpConfig> {
    CONFIG_INSTANCE.get().cloned().unwrap_or_else(|| {
        crate::warn!("BlinkUp config not initialized, defaulting to release");
        Arc::new(BlinkUpConfig::default())
    })
}

/// Whether [`init_blinkup_config`] has been called.
#[uniffi::export]
#[must_use]
pub fn is_initialized() -> bool {
    CONFIG_INSTANCE.get().is_some()
}
