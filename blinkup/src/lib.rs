#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    dead_code
)]

//! `blinkup` is the onboarding core behind the BlinkUp plugin.
//!
//! It validates the positional arguments sent by the scripted app layer, picks the
//! provisioning plan id, drives the BlinkUp SDK controller through token acquisition and
//! device setup, and reports exactly one outcome per invocation back to the caller.
//!
//! The SDK controller, the on-device key-value store, toast display and UI thread are all
//! provided by the native host through foreign traits.

/// Introduces low level primitives shared by the onboarding flow: logging, configuration and
/// the device key-value store.
pub mod primitives;

pub mod onboarding;

pub use blinkup_macros::{blinkup_error, blinkup_export};

uniffi::setup_scaffolding!("blinkup");
