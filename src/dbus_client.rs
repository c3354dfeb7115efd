// Network Manager - Dispatcher D-Bus Client
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! D-Bus transport used to deliver dispatcher actions.

use std::future::Future;
use std::pin::Pin;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use tokio::runtime::Runtime;
use tracing::{debug, error, info};
use zbus::zvariant::{Array, Value};
use zbus::Connection;

use crate::models::{
    DispatcherAction, DispatcherConfig, Error, ReplyEntry, ReplyField, Result, SettingsMap,
    VariantMap,
};

/// Timeout for a single dispatcher call.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Method invoked on the dispatcher service.
pub const ACTION_METHOD: &str = "Action";

/// Arguments of one `Action` call, in wire order.
#[derive(Debug, PartialEq)]
pub struct ActionCall {
    pub action: DispatcherAction,
    pub connection_settings: SettingsMap,
    pub connection_props: VariantMap,
    pub device_props: VariantMap,
    pub device_ip4_props: VariantMap,
    pub device_ip6_props: VariantMap,
    pub device_dhcp4_props: VariantMap,
    pub device_dhcp6_props: VariantMap,
    pub vpn_iface: String,
    pub vpn_ip4_props: VariantMap,
    pub vpn_ip6_props: VariantMap,
    pub debug: bool,
}

/// Wire body: `(sa{sa{sv}}a{sv}a{sv}a{sv}a{sv}a{sv}a{sv}sa{sv}a{sv}b)`.
type ActionBody<'a> = (
    &'a str,
    &'a SettingsMap,
    &'a VariantMap,
    &'a VariantMap,
    &'a VariantMap,
    &'a VariantMap,
    &'a VariantMap,
    &'a VariantMap,
    &'a str,
    &'a VariantMap,
    &'a VariantMap,
    bool,
);

impl ActionCall {
    /// An empty call for `action`.
    pub fn new(action: DispatcherAction) -> Self {
        Self {
            action,
            connection_settings: SettingsMap::new(),
            connection_props: VariantMap::new(),
            device_props: VariantMap::new(),
            device_ip4_props: VariantMap::new(),
            device_ip6_props: VariantMap::new(),
            device_dhcp4_props: VariantMap::new(),
            device_dhcp6_props: VariantMap::new(),
            vpn_iface: String::new(),
            vpn_ip4_props: VariantMap::new(),
            vpn_ip6_props: VariantMap::new(),
            debug: false,
        }
    }

    fn body(&self) -> ActionBody<'_> {
        (
            self.action.as_str(),
            &self.connection_settings,
            &self.connection_props,
            &self.device_props,
            &self.device_ip4_props,
            &self.device_ip6_props,
            &self.device_dhcp4_props,
            &self.device_dhcp6_props,
            &self.vpn_iface,
            &self.vpn_ip4_props,
            &self.vpn_ip6_props,
            self.debug,
        )
    }
}

/// Future resolving to the raw result tuples of a reply.
pub type CallFuture = Pin<Box<dyn Future<Output = Result<Vec<ReplyEntry>>>>>;

/// Delivers action calls to the dispatcher service.
pub trait Transport {
    /// Start a call. The returned future is polled on the caller's thread.
    fn call(&self, call: ActionCall) -> CallFuture;

    /// Make a call and block the current thread until it replies or
    /// [`CALL_TIMEOUT`] elapses.
    fn call_blocking(&self, call: ActionCall) -> Result<Vec<ReplyEntry>>;
}

/// Where the dispatcher service lives on the bus.
#[derive(Debug, Clone)]
struct ServiceTarget {
    service_name: String,
    object_path: String,
    interface: String,
}

/// [`Transport`] over the system bus.
///
/// The bus connection lives on a small runtime of its own so that blocking
/// calls can wait on it from inside the caller's runtime.
pub struct ZbusTransport {
    connection: Connection,
    target: ServiceTarget,
    runtime: Option<Runtime>,
}

impl ZbusTransport {
    /// Connect to the system bus.
    pub fn connect_system(config: &DispatcherConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("nm-dispatch-bus")
            .enable_all()
            .build()?;

        let (tx, rx) = std_mpsc::channel();
        runtime.spawn(async move {
            let _ = tx.send(Connection::system().await);
        });
        let connection = match rx.recv_timeout(CALL_TIMEOUT) {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                error!("Failed to connect to system D-Bus: {}", e);
                runtime.shutdown_background();
                return Err(e.into());
            }
            Err(_) => {
                error!("Timed out connecting to system D-Bus");
                runtime.shutdown_background();
                return Err(Error::Timeout(CALL_TIMEOUT.as_secs()));
            }
        };
        debug!("Connected to system D-Bus");

        Ok(Self {
            connection,
            target: ServiceTarget {
                service_name: config.service_name.clone(),
                object_path: config.object_path.clone(),
                interface: config.interface.clone(),
            },
            runtime: Some(runtime),
        })
    }

    fn runtime(&self) -> Result<&Runtime> {
        self.runtime
            .as_ref()
            .ok_or_else(|| Error::Transport("bus runtime stopped".to_string()))
    }
}

impl Transport for ZbusTransport {
    fn call(&self, call: ActionCall) -> CallFuture {
        let connection = self.connection.clone();
        let target = self.target.clone();
        let handle = self
            .runtime()
            .map(|rt| rt.spawn(async move { timed_call(&connection, &target, &call).await }));

        Box::pin(async move {
            match handle {
                Ok(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(Error::Transport(format!("dispatcher call task failed: {}", e))),
                },
                Err(e) => Err(e),
            }
        })
    }

    fn call_blocking(&self, call: ActionCall) -> Result<Vec<ReplyEntry>> {
        let connection = self.connection.clone();
        let target = self.target.clone();
        let (tx, rx) = std_mpsc::channel();
        self.runtime()?.spawn(async move {
            let _ = tx.send(timed_call(&connection, &target, &call).await);
        });
        rx.recv()
            .map_err(|_| Error::Transport("bus runtime stopped".to_string()))?
    }
}

impl Drop for ZbusTransport {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn timed_call(
    connection: &Connection,
    target: &ServiceTarget,
    call: &ActionCall,
) -> Result<Vec<ReplyEntry>> {
    match tokio::time::timeout(CALL_TIMEOUT, send_action(connection, target, call)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(CALL_TIMEOUT.as_secs())),
    }
}

async fn send_action(
    connection: &Connection,
    target: &ServiceTarget,
    call: &ActionCall,
) -> Result<Vec<ReplyEntry>> {
    info!("Dispatching action '{}'", call.action);

    let reply = connection
        .call_method(
            Some(target.service_name.as_str()),
            target.object_path.as_str(),
            Some(target.interface.as_str()),
            ACTION_METHOD,
            &call.body(),
        )
        .await?;

    let body = reply.body();
    let results: Array<'_> = body
        .deserialize()
        .map_err(|e| Error::ReplyMalformed(e.to_string()))?;
    Ok(reply_entries(&results))
}

/// Split a reply's result array into loosely typed tuples.
pub fn reply_entries(results: &Array<'_>) -> Vec<ReplyEntry> {
    results
        .inner()
        .iter()
        .map(|element| match element {
            Value::Structure(fields) => fields.fields().iter().map(reply_field).collect(),
            other => vec![reply_field(other)],
        })
        .collect()
}

fn reply_field(value: &Value<'_>) -> ReplyField {
    match value {
        Value::Str(s) => ReplyField::Str(s.to_string()),
        Value::U32(n) => ReplyField::U32(*n),
        other => ReplyField::Other(other.value_signature().to_string()),
    }
}
