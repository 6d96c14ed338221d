use std::sync::Arc;

use crate::onboarding::arguments::InvocationRequest;
use crate::primitives::config::BuildFlavor;
use crate::primitives::key_value_store::{DeviceKeyValueStore, KeyValueStoreError};

/// Key under which the last provisioning plan id is cached in the [`DeviceKeyValueStore`].
pub const PLAN_ID_KEY: &str = "planId";

/// The plan id handed to the SDK controller for one invocation.
///
/// See <https://electricimp.com/docs/manufacturing/planids/> for what plan ids are.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum PlanIdSelection {
    /// The plan id cached by a previous successful setup
    Cached {
        /// The cached plan id
        plan_id: String,
    },
    /// The developer plan id from the request (debug builds only)
    Developer {
        /// The developer plan id
        plan_id: String,
    },
    /// No plan id: the SDK generates one
    SdkGenerated,
}

impl PlanIdSelection {
    /// The plan id to configure on the controller, if any
    #[must_use]
    pub fn plan_id(&self) -> Option<&str> {
        match self {
            Self::Cached { plan_id } | Self::Developer { plan_id } => Some(plan_id),
            Self::SdkGenerated => None,
        }
    }

    /// Short label for log lines
    #[must_use]
    pub const fn source(&self) -> &'static str {
        match self {
            Self::Cached { .. } => "cached",
            Self::Developer { .. } => "developer",
            Self::SdkGenerated => "sdk_generated",
        }
    }
}

/// Picks the effective plan id and maintains the cached one.
pub struct PlanIdResolver {
    kv_store: Arc<dyn DeviceKeyValueStore>,
}

impl PlanIdResolver {
    /// Creates a resolver reading from and writing to `kv_store`
    #[must_use]
    pub fn new(kv_store: Arc<dyn DeviceKeyValueStore>) -> Self {
        Self { kv_store }
    }

    /// Resolves the plan id for `request`.
    ///
    /// 1. With `use_cached_plan_id`, the cache is read and a present value is selected.
    /// 2. In a debug build a non-empty developer plan id then overrides whatever step 1 chose.
    /// 3. Otherwise the SDK generates the plan id.
    ///
    /// The cache read in step 1 always happens when requested, even if step 2 discards it.
    #[must_use]
    pub fn resolve(&self, request: &InvocationRequest, build_flavor: BuildFlavor) -> PlanIdSelection {
        let mut selection = PlanIdSelection::SdkGenerated;

        if request.use_cached_plan_id() {
            if let Some(plan_id) = self.cached_plan_id() {
                selection = PlanIdSelection::Cached { plan_id };
            }
        }

        if build_flavor.is_debug() && !request.developer_plan_id().is_empty() {
            selection = PlanIdSelection::Developer {
                plan_id: request.developer_plan_id().to_string(),
            };
        }

        crate::debug!(
            "plan_id.resolved source={} use_cached={} build_flavor={}",
            selection.source(),
            request.use_cached_plan_id(),
            build_flavor
        );

        selection
    }

    /// Reads the cached plan id. A missing or unreadable entry is `None`, never an error.
    #[must_use]
    pub fn cached_plan_id(&self) -> Option<String> {
        match self.kv_store.get(PLAN_ID_KEY.to_string()) {
            Ok(plan_id) => Some(plan_id),
            Err(KeyValueStoreError::KeyNotFound) => None,
            Err(e) => {
                crate::warn!("plan_id.cache_read_failed error={e}");
                None
            }
        }
    }

    /// Caches `plan_id` for later invocations with `use_cached_plan_id`.
    ///
    /// # Errors
    /// Propagates the store's [`KeyValueStoreError`].
    pub fn store_plan_id(&self, plan_id: &str) -> Result<(), KeyValueStoreError> {
        self.kv_store
            .set(PLAN_ID_KEY.to_string(), plan_id.to_string())
    }

    /// Removes the cached plan id. Clearing an empty cache succeeds.
    ///
    /// # Errors
    /// Propagates any store error other than `KeyNotFound`.
    pub fn clear_cached_plan_id(&self) -> Result<(), KeyValueStoreError> {
        match self.kv_store.delete(PLAN_ID_KEY.to_string()) {
            Ok(()) | Err(KeyValueStoreError::KeyNotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
