/// Foreign logger bridge and the crate's context-aware logging macros.
pub mod logger;

/// Process-wide configuration: build flavor and token error policy.
pub mod config;

/// Key-value store provided by the host to persist small, non-sensitive values.
pub mod key_value_store;
