// Network Manager - Dispatcher Models
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Dispatcher Models
//!
//! Plain data types shared by the dispatcher services:
//!
//! - **Action**: Dispatcher action kinds and their wire names
//! - **Property**: Typed property values and property bags
//! - **Device**: Device, IP, DHCP and connection state
//! - **Result**: Per-script outcomes carried in replies
//! - **Config**: Dispatcher configuration
//! - **Error**: Shared error types

pub mod action;
pub mod config;
pub mod device;
pub mod error;
pub mod property;
pub mod result;

// Re-export main types for convenience
pub use action::DispatcherAction;
pub use config::DispatcherConfig;
pub use device::{
    ConnectionInfo, ConnectionSnapshot, DeviceInfo, DeviceSnapshot, DeviceState, DeviceType,
    DhcpConfig, Ip4Address, Ip4Config, Ip4Route, Ip6Config, SettingsMap,
};
pub use error::{Error, Result};
pub use property::{DhcpOptions, Introspect, PropertyBag, PropertyValue, VariantMap};
pub use result::{DispatchCompletion, ReplyEntry, ReplyField, ScriptOutcome, ScriptResult};
