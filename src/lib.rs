// Network Manager - Dispatcher Library
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # nm-dispatch
//!
//! Action notifications for a Linux network daemon.
//!
//! Network lifecycle events (interface up/down, hostname and DHCP lease
//! changes, VPN up/down) are announced to helper scripts through a dispatcher
//! service on the system bus, together with the device, IP, DHCP and VPN
//! state the scripts need.
//!
//! - [`services::ScriptMonitor`] skips dispatching while no script is installed
//! - [`services::Dispatcher`] builds and sends the calls, synchronously or on
//!   a [`LocalSet`](tokio::task::LocalSet), with cancellable callbacks
//! - [`security`] encodes WEP and WPA-PSK credentials for the bus

pub mod dbus_client;
pub mod models;
pub mod network_utils;
pub mod security;
pub mod services;

pub use dbus_client::{ActionCall, Transport, ZbusTransport, CALL_TIMEOUT};
pub use models::{DispatchCompletion, DispatcherAction, DispatcherConfig, Error, Result};
pub use services::{init_monitor, Dispatcher, RequestId, ScriptMonitor, VpnInfo};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
