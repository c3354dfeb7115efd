// Network Manager - Dispatcher Services
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Services that deliver actions to dispatcher scripts.
//!
//! - Monitor: Tracks whether any dispatcher script is installed
//! - Registry: Bookkeeping for in-flight asynchronous calls
//! - Dispatcher: Builds and sends action calls

pub mod dispatcher;
pub mod monitor;
pub mod registry;

pub use dispatcher::{process_results, Dispatcher, VpnInfo};
pub use monitor::{init_monitor, ScriptDirState, ScriptMonitor};
pub use registry::{DispatchCallback, RequestId, RequestRegistry};
