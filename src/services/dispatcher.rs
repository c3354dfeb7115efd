// Network Manager - Action Dispatcher
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Delivers network lifecycle actions to dispatcher scripts.
//!
//! A dispatch is skipped outright while no scripts are installed. Otherwise
//! the device, IP, DHCP and VPN state is dumped into property bags and sent
//! in one `Action` call, either blocking for the reply or completing later
//! on the caller's [`LocalSet`](tokio::task::LocalSet).

use std::cell::{Cell, RefCell};
use std::num::NonZeroU64;
use std::rc::Rc;

use tracing::{debug, error, warn, Level};

use super::monitor::ScriptMonitor;
use super::registry::{DispatchCallback, RequestId, RequestRegistry};
use crate::dbus_client::{ActionCall, Transport};
use crate::models::device::{
    CONNECTION_PROPS_PATH, DEVICE_PROPS_INTERFACE, DEVICE_PROPS_IP_INTERFACE, DEVICE_PROPS_PATH,
    DEVICE_PROPS_STATE, DEVICE_PROPS_TYPE,
};
use crate::models::{
    ConnectionInfo, DeviceInfo, DhcpOptions, DispatchCompletion, DispatcherAction, Error,
    Introspect, PropertyBag, PropertyValue, ReplyEntry, ReplyField, Result, ScriptOutcome,
    ScriptResult, VariantMap,
};

/// VPN state sent with VPN actions.
#[derive(Clone, Copy)]
pub struct VpnInfo<'a> {
    /// Tunnel interface name.
    pub iface: &'a str,
    pub ip4: Option<&'a dyn Introspect>,
    pub ip6: Option<&'a dyn Introspect>,
}

#[derive(Clone, Copy)]
struct ActionRequest<'a> {
    action: DispatcherAction,
    connection: Option<&'a dyn ConnectionInfo>,
    device: Option<&'a dyn DeviceInfo>,
    vpn: Option<VpnInfo<'a>>,
}

/// Entry point for dispatching actions.
pub struct Dispatcher {
    monitor: Rc<ScriptMonitor>,
    transport: Rc<dyn Transport>,
    registry: Rc<RefCell<RequestRegistry>>,
    last_serial: Cell<u64>,
}

impl Dispatcher {
    pub fn new(monitor: Rc<ScriptMonitor>, transport: Rc<dyn Transport>) -> Self {
        Self {
            monitor,
            transport,
            registry: Rc::new(RefCell::new(RequestRegistry::new())),
            last_serial: Cell::new(0),
        }
    }

    /// Dispatch `action` asynchronously.
    ///
    /// Returns the request identifier when a callback was given, or `None`
    /// for fire-and-forget delivery. The callback always runs later, never
    /// before this returns.
    ///
    /// # Panics
    ///
    /// Panics if called outside a [`LocalSet`](tokio::task::LocalSet).
    pub fn dispatch(
        &self,
        action: DispatcherAction,
        connection: Option<&dyn ConnectionInfo>,
        device: Option<&dyn DeviceInfo>,
        callback: Option<DispatchCallback>,
    ) -> Result<Option<RequestId>> {
        self.dispatch_async(
            ActionRequest {
                action,
                connection,
                device,
                vpn: None,
            },
            callback,
        )
    }

    /// Dispatch `action` and block until the service replies.
    ///
    /// Nothing else runs on this thread meanwhile.
    pub fn dispatch_sync(
        &self,
        action: DispatcherAction,
        connection: Option<&dyn ConnectionInfo>,
        device: Option<&dyn DeviceInfo>,
    ) -> Result<DispatchCompletion> {
        self.dispatch_blocking(ActionRequest {
            action,
            connection,
            device,
            vpn: None,
        })
    }

    /// Dispatch a VPN action asynchronously. See [`dispatch`](Self::dispatch).
    pub fn dispatch_vpn(
        &self,
        action: DispatcherAction,
        connection: Option<&dyn ConnectionInfo>,
        parent_device: Option<&dyn DeviceInfo>,
        vpn: VpnInfo<'_>,
        callback: Option<DispatchCallback>,
    ) -> Result<Option<RequestId>> {
        self.dispatch_async(
            ActionRequest {
                action,
                connection,
                device: parent_device,
                vpn: Some(vpn),
            },
            callback,
        )
    }

    /// Dispatch a VPN action and block until the service replies.
    pub fn dispatch_vpn_sync(
        &self,
        action: DispatcherAction,
        connection: Option<&dyn ConnectionInfo>,
        parent_device: Option<&dyn DeviceInfo>,
        vpn: VpnInfo<'_>,
    ) -> Result<DispatchCompletion> {
        self.dispatch_blocking(ActionRequest {
            action,
            connection,
            device: parent_device,
            vpn: Some(vpn),
        })
    }

    /// Suppress the callback of a pending request. The call itself still
    /// runs to completion.
    pub fn cancel(&self, id: RequestId) -> Result<()> {
        let cleared = self.registry.borrow_mut().lookup_and_clear_callback(id);
        match cleared {
            Ok(()) => {
                debug!("Cancelled dispatcher request {}", id);
                Ok(())
            }
            Err(e) => {
                error!("Cannot cancel dispatcher request {}: not pending", id);
                Err(e)
            }
        }
    }

    /// Number of asynchronous requests awaiting completion.
    pub fn pending_requests(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Whether dispatching currently reaches the service.
    pub fn is_enabled(&self) -> bool {
        self.monitor.process_pending();
        self.monitor.is_enabled()
    }

    fn dispatch_async(
        &self,
        request: ActionRequest<'_>,
        callback: Option<DispatchCallback>,
    ) -> Result<Option<RequestId>> {
        validate(&request)?;

        if !self.is_enabled() {
            let Some(callback) = callback else {
                debug!("No dispatcher scripts, skipping '{}'", request.action);
                return Ok(None);
            };
            let id = self.register(callback)?;
            let registry = Rc::clone(&self.registry);
            tokio::task::spawn_local(async move {
                complete(&registry, id, DispatchCompletion::Skipped);
            });
            return Ok(Some(id));
        }

        let action = request.action;
        let reply = self.transport.call(build_call(&request));

        let Some(callback) = callback else {
            tokio::task::spawn_local(async move {
                finish(action, reply.await);
            });
            return Ok(None);
        };

        let id = self.register(callback)?;
        let registry = Rc::clone(&self.registry);
        tokio::task::spawn_local(async move {
            let completion = finish(action, reply.await);
            complete(&registry, id, completion);
        });
        Ok(Some(id))
    }

    fn dispatch_blocking(&self, request: ActionRequest<'_>) -> Result<DispatchCompletion> {
        validate(&request)?;

        if !self.is_enabled() {
            debug!("No dispatcher scripts, skipping '{}'", request.action);
            return Ok(DispatchCompletion::Skipped);
        }

        let reply = self.transport.call_blocking(build_call(&request));
        Ok(finish(request.action, reply))
    }

    fn register(&self, callback: DispatchCallback) -> Result<RequestId> {
        let serial = self
            .last_serial
            .get()
            .checked_add(1)
            .and_then(NonZeroU64::new)
            .ok_or_else(|| Error::Internal("dispatcher request ids exhausted".to_string()))?;
        self.last_serial.set(serial.get());
        self.registry.borrow_mut().register(serial, Some(callback))
    }
}

fn validate(request: &ActionRequest<'_>) -> Result<()> {
    if request.action.requires_device() && request.device.is_none() {
        error!("Dispatcher action '{}' requires a device", request.action);
        return Err(Error::MissingDevice(request.action));
    }
    if request.action == DispatcherAction::VpnUp
        && request.vpn.and_then(|vpn| vpn.ip4).is_none()
    {
        error!(
            "Dispatcher action '{}' requires a VPN IPv4 configuration",
            request.action
        );
        return Err(Error::MissingVpnIp4Config(request.action));
    }
    Ok(())
}

/// Invoke the request's callback, if still set, then free its record.
fn complete(registry: &RefCell<RequestRegistry>, id: RequestId, completion: DispatchCompletion) {
    let callback = registry.borrow_mut().take_callback(id);
    match callback {
        Some(callback) => callback(id, completion),
        None => debug!("Dispatcher request {} completed after cancellation", id),
    }
    registry.borrow_mut().remove(id);
}

fn finish(action: DispatcherAction, reply: Result<Vec<ReplyEntry>>) -> DispatchCompletion {
    match reply {
        Ok(entries) => DispatchCompletion::Completed(process_results(&entries)),
        Err(e) => {
            warn!("Dispatcher failed for '{}': {}", action, e);
            DispatchCompletion::Failed(e.to_string())
        }
    }
}

fn build_call(request: &ActionRequest<'_>) -> ActionCall {
    let mut call = ActionCall::new(request.action);
    call.debug = tracing::enabled!(Level::DEBUG);

    if let Some(connection) = request.connection {
        call.connection_settings = connection
            .settings()
            .into_iter()
            .map(|(name, bag)| (name, bag.to_variant_map()))
            .collect();
        match PropertyValue::object_path(connection.path()) {
            Ok(path) => {
                call.connection_props
                    .insert(CONNECTION_PROPS_PATH.to_string(), path.to_value());
            }
            Err(e) => warn!("Connection path not sent: {}", e),
        }
    }

    if request.action == DispatcherAction::Hostname {
        return call;
    }

    if let Some(device) = request.device {
        call.device_props = device_props(device).to_variant_map();
        call.device_ip4_props = device.ip4_config().map(object_props).unwrap_or_default();
        call.device_ip6_props = device.ip6_config().map(object_props).unwrap_or_default();
        call.device_dhcp4_props = device.dhcp4_config().map(dhcp_props).unwrap_or_default();
        call.device_dhcp6_props = device.dhcp6_config().map(dhcp_props).unwrap_or_default();
    }

    if let Some(vpn) = request.vpn {
        call.vpn_iface = vpn.iface.to_string();
        call.vpn_ip4_props = vpn.ip4.map(object_props).unwrap_or_default();
        call.vpn_ip6_props = vpn.ip6.map(object_props).unwrap_or_default();
    }

    call
}

fn device_props(device: &dyn DeviceInfo) -> PropertyBag {
    let mut bag = PropertyBag::new();
    bag.insert(DEVICE_PROPS_IP_INTERFACE, device.ip_iface());
    bag.insert(DEVICE_PROPS_INTERFACE, device.iface());
    bag.insert(DEVICE_PROPS_TYPE, device.device_type());
    bag.insert(DEVICE_PROPS_STATE, device.state());
    match PropertyValue::object_path(device.path()) {
        Ok(path) => bag.insert(DEVICE_PROPS_PATH, path),
        Err(e) => warn!("Device path not sent: {}", e),
    }
    bag
}

fn object_props(object: &dyn Introspect) -> VariantMap {
    let mut bag = PropertyBag::new();
    bag.fill_from_object(object);
    bag.to_variant_map()
}

fn dhcp_props(options: &dyn DhcpOptions) -> VariantMap {
    let mut bag = PropertyBag::new();
    bag.fill_from_dhcp(options);
    bag.to_variant_map()
}

/// Log and collect the per-script results of a reply.
///
/// Malformed tuples are skipped. Script failures are reported but never
/// turn into an error.
pub fn process_results(entries: &[ReplyEntry]) -> Vec<ScriptResult> {
    let mut results = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let result = match parse_result(entry) {
            Ok(result) => result,
            Err(reason) => {
                debug!("Dispatcher result {} skipped: {}", index, reason);
                continue;
            }
        };
        if result.outcome.is_success() {
            debug!("Dispatcher script \"{}\" complete", result.script);
        } else {
            warn!(
                "Dispatcher script \"{}\" failed with {}: {}",
                result.script, result.outcome, result.error
            );
        }
        results.push(result);
    }
    results
}

fn parse_result(entry: &ReplyEntry) -> std::result::Result<ScriptResult, String> {
    let [script, code, error] = entry.as_slice() else {
        return Err(format!("expected 3 fields, got {}", entry.len()));
    };
    let ReplyField::Str(script) = script else {
        return Err(format!("script name has type '{}'", script.type_name()));
    };
    let ReplyField::U32(code) = code else {
        return Err(format!("result code has type '{}'", code.type_name()));
    };
    let ReplyField::Str(error) = error else {
        return Err(format!("error message has type '{}'", error.type_name()));
    };
    let outcome =
        ScriptOutcome::from_code(*code).ok_or_else(|| format!("unknown result code {}", code))?;

    Ok(ScriptResult {
        script: script.clone(),
        outcome,
        error: error.clone(),
    })
}
