// Network Manager - Device Model
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Device, IP configuration, DHCP and connection state handed to the dispatcher.
//!
//! The dispatcher only consumes the [`DeviceInfo`] and [`ConnectionInfo`]
//! capabilities. The snapshot types in this module are plain-data
//! implementations used by the command-line tool and by tests.

use std::collections::{BTreeMap, HashMap};
use std::net::{Ipv4Addr, Ipv6Addr};


use super::property::{DhcpOptions, Introspect, PropertyBag, PropertyValue, VariantMap};

/// Device property keys sent in the device bag.
pub const DEVICE_PROPS_IP_INTERFACE: &str = "ip-interface";
pub const DEVICE_PROPS_INTERFACE: &str = "interface";
pub const DEVICE_PROPS_TYPE: &str = "type";
pub const DEVICE_PROPS_STATE: &str = "state";
pub const DEVICE_PROPS_PATH: &str = "path";

/// Connection property key for the connection's object path.
pub const CONNECTION_PROPS_PATH: &str = "path";

/// Setting keys that carry secrets and are never sent to scripts.
const SECRET_KEYS: &[&str] = &[
    "psk",
    "password",
    "leap-password",
    "wep-key0",
    "wep-key1",
    "wep-key2",
    "wep-key3",
    "pin",
    "private-key-password",
    "phase2-private-key-password",
    "secrets",
];

/// Check whether a setting key holds secret material.
pub fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

/// Wire form of connection settings: `a{sa{sv}}`.
pub type SettingsMap = HashMap<String, VariantMap>;

/// A network device as seen by the dispatcher.
pub trait DeviceInfo {
    fn iface(&self) -> &str;
    fn ip_iface(&self) -> &str;
    fn device_type(&self) -> u32;
    fn state(&self) -> u32;
    fn path(&self) -> &str;
    fn ip4_config(&self) -> Option<&dyn Introspect>;
    fn ip6_config(&self) -> Option<&dyn Introspect>;
    fn dhcp4_config(&self) -> Option<&dyn DhcpOptions>;
    fn dhcp6_config(&self) -> Option<&dyn DhcpOptions>;
}

/// A connection profile as seen by the dispatcher.
pub trait ConnectionInfo {
    fn path(&self) -> &str;
    /// Settings grouped by setting name, secrets excluded.
    fn settings(&self) -> BTreeMap<String, PropertyBag>;
}

/// Device type codes understood by dispatcher scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceType {
    #[default]
    Unknown,
    Ethernet,
    Wifi,
    Bluetooth,
    Modem,
    Bond,
    Vlan,
    Bridge,
    Generic,
    Team,
    Tun,
}

impl DeviceType {
    pub fn code(&self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Ethernet => 1,
            Self::Wifi => 2,
            Self::Bluetooth => 5,
            Self::Modem => 8,
            Self::Bond => 10,
            Self::Vlan => 11,
            Self::Bridge => 13,
            Self::Generic => 14,
            Self::Team => 15,
            Self::Tun => 16,
        }
    }
}

/// Device state codes understood by dispatcher scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Unknown,
    Unmanaged,
    Unavailable,
    Disconnected,
    Prepare,
    Config,
    NeedAuth,
    IpConfig,
    IpCheck,
    Secondaries,
    Activated,
    Deactivating,
    Failed,
}

impl DeviceState {
    pub fn code(&self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Unmanaged => 10,
            Self::Unavailable => 20,
            Self::Disconnected => 30,
            Self::Prepare => 40,
            Self::Config => 50,
            Self::NeedAuth => 60,
            Self::IpConfig => 70,
            Self::IpCheck => 80,
            Self::Secondaries => 90,
            Self::Activated => 100,
            Self::Deactivating => 110,
            Self::Failed => 120,
        }
    }
}

/// Addresses are sent in network byte order, as scripts expect.
fn ipv4_wire(addr: Ipv4Addr) -> u32 {
    u32::from_ne_bytes(addr.octets())
}

/// One IPv4 address with its prefix and gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ip4Address {
    pub address: Ipv4Addr,
    pub prefix: u32,
    pub gateway: Ipv4Addr,
}

/// One IPv4 static route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ip4Route {
    pub destination: Ipv4Addr,
    pub prefix: u32,
    pub next_hop: Ipv4Addr,
    pub metric: u32,
}

/// IPv4 configuration of a device or VPN tunnel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ip4Config {
    pub addresses: Vec<Ip4Address>,
    /// Default gateway of the whole config.
    pub gateway: Option<Ipv4Addr>,
    pub nameservers: Vec<Ipv4Addr>,
    pub domains: Vec<String>,
    pub routes: Vec<Ip4Route>,
    pub wins_servers: Vec<Ipv4Addr>,
}

impl Introspect for Ip4Config {
    fn list_attributes(&self) -> Vec<&'static str> {
        vec![
            "addresses",
            "gateway",
            "nameservers",
            "domains",
            "routes",
            "wins-servers",
        ]
    }

    fn get_attribute(&self, name: &str) -> Option<PropertyValue> {
        let value = match name {
            "addresses" => PropertyValue::U32Table(
                self.addresses
                    .iter()
                    .map(|a| vec![ipv4_wire(a.address), a.prefix, ipv4_wire(a.gateway)])
                    .collect(),
            ),
            "gateway" => PropertyValue::U32(ipv4_wire(self.gateway?)),
            "nameservers" => {
                PropertyValue::U32List(self.nameservers.iter().copied().map(ipv4_wire).collect())
            }
            "domains" => PropertyValue::StrList(self.domains.clone()),
            "routes" => PropertyValue::U32Table(
                self.routes
                    .iter()
                    .map(|r| {
                        vec![ipv4_wire(r.destination), r.prefix, ipv4_wire(r.next_hop), r.metric]
                    })
                    .collect(),
            ),
            "wins-servers" => {
                PropertyValue::U32List(self.wins_servers.iter().copied().map(ipv4_wire).collect())
            }
            _ => return None,
        };
        Some(value)
    }
}

/// IPv6 configuration of a device or VPN tunnel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ip6Config {
    pub addresses: Vec<(Ipv6Addr, u32)>,
    pub gateway: Option<Ipv6Addr>,
    pub nameservers: Vec<Ipv6Addr>,
    pub domains: Vec<String>,
}

impl Introspect for Ip6Config {
    fn list_attributes(&self) -> Vec<&'static str> {
        vec!["addresses", "gateway", "nameservers", "domains"]
    }

    fn get_attribute(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "addresses" => Some(PropertyValue::StrList(
                self.addresses
                    .iter()
                    .map(|(addr, prefix)| format!("{}/{}", addr, prefix))
                    .collect(),
            )),
            "gateway" => self.gateway.map(|gw| PropertyValue::Str(gw.to_string())),
            "nameservers" => Some(PropertyValue::StrList(
                self.nameservers.iter().map(|ns| ns.to_string()).collect(),
            )),
            "domains" => Some(PropertyValue::StrList(self.domains.clone())),
            _ => None,
        }
    }
}

/// DHCP lease options (DHCPv4 or DHCPv6).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DhcpConfig {
    options: BTreeMap<String, String>,
}

impl DhcpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

impl DhcpOptions for DhcpConfig {
    fn list_options(&self) -> Vec<String> {
        self.options.keys().cloned().collect()
    }

    fn get_option(&self, name: &str) -> Option<String> {
        self.options.get(name).cloned()
    }
}

/// Point-in-time view of a device.
#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshot {
    pub iface: String,
    /// IP interface, when it differs from the control interface (e.g. ppp0).
    pub ip_iface: Option<String>,
    pub device_type: DeviceType,
    pub state: DeviceState,
    pub path: String,
    pub ip4: Option<Ip4Config>,
    pub ip6: Option<Ip6Config>,
    pub dhcp4: Option<DhcpConfig>,
    pub dhcp6: Option<DhcpConfig>,
}

impl DeviceSnapshot {
    pub fn new(iface: impl Into<String>, device_type: DeviceType, path: impl Into<String>) -> Self {
        Self {
            iface: iface.into(),
            device_type,
            path: path.into(),
            ..Default::default()
        }
    }
}

impl DeviceInfo for DeviceSnapshot {
    fn iface(&self) -> &str {
        &self.iface
    }

    fn ip_iface(&self) -> &str {
        self.ip_iface.as_deref().unwrap_or(&self.iface)
    }

    fn device_type(&self) -> u32 {
        self.device_type.code()
    }

    fn state(&self) -> u32 {
        self.state.code()
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn ip4_config(&self) -> Option<&dyn Introspect> {
        self.ip4.as_ref().map(|c| c as &dyn Introspect)
    }

    fn ip6_config(&self) -> Option<&dyn Introspect> {
        self.ip6.as_ref().map(|c| c as &dyn Introspect)
    }

    fn dhcp4_config(&self) -> Option<&dyn DhcpOptions> {
        self.dhcp4.as_ref().map(|c| c as &dyn DhcpOptions)
    }

    fn dhcp6_config(&self) -> Option<&dyn DhcpOptions> {
        self.dhcp6.as_ref().map(|c| c as &dyn DhcpOptions)
    }
}

/// Point-in-time view of a connection profile.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSnapshot {
    pub path: String,
    settings: BTreeMap<String, PropertyBag>,
}

impl ConnectionSnapshot {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            settings: BTreeMap::new(),
        }
    }

    /// Set one key of one setting group.
    pub fn set(
        &mut self,
        setting: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) {
        self.settings
            .entry(setting.into())
            .or_default()
            .insert(key, value);
    }
}

impl ConnectionInfo for ConnectionSnapshot {
    fn path(&self) -> &str {
        &self.path
    }

    fn settings(&self) -> BTreeMap<String, PropertyBag> {
        self.settings
            .iter()
            .map(|(name, bag)| {
                let mut public = PropertyBag::new();
                for (key, value) in bag.iter().filter(|(key, _)| !is_secret_key(key)) {
                    public.insert(key, value.clone());
                }
                (name.clone(), public)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip4_addresses_in_network_order() {
        let config = Ip4Config {
            addresses: vec![Ip4Address {
                address: Ipv4Addr::new(192, 168, 1, 10),
                prefix: 24,
                gateway: Ipv4Addr::new(192, 168, 1, 1),
            }],
            ..Default::default()
        };
        let Some(PropertyValue::U32Table(rows)) = config.get_attribute("addresses") else {
            panic!("addresses should be a table");
        };
        assert_eq!(rows[0][0].to_ne_bytes(), [192, 168, 1, 10]);
        assert_eq!(rows[0][1], 24);
    }

    #[test]
    fn test_ip4_gateway_only_when_set() {
        let mut config = Ip4Config::default();
        assert!(config.get_attribute("gateway").is_none());

        config.gateway = Some(Ipv4Addr::new(10, 0, 0, 1));
        let Some(PropertyValue::U32(gateway)) = config.get_attribute("gateway") else {
            panic!("gateway should be a u32");
        };
        assert_eq!(gateway.to_ne_bytes(), [10, 0, 0, 1]);

        let mut bag = PropertyBag::new();
        bag.fill_from_object(&config);
        assert!(bag.get("gateway").is_some());
    }

    #[test]
    fn test_ip6_gateway_absent() {
        let config = Ip6Config::default();
        assert!(config.get_attribute("gateway").is_none());
        let mut bag = PropertyBag::new();
        bag.fill_from_object(&config);
        assert_eq!(bag.len(), 3);
    }

    #[test]
    fn test_connection_settings_exclude_secrets() {
        let mut conn = ConnectionSnapshot::new("/org/freedesktop/NetworkManager/Settings/3");
        conn.set("802-11-wireless-security", "key-mgmt", "wpa-psk");
        conn.set("802-11-wireless-security", "psk", "hunter22");
        conn.set("connection", "id", "Home");
        let settings = conn.settings();
        let security = &settings["802-11-wireless-security"];
        assert!(security.get("key-mgmt").is_some());
        assert!(security.get("psk").is_none());
        assert_eq!(settings["connection"].len(), 1);
    }

    #[test]
    fn test_ip_iface_defaults_to_iface() {
        let mut dev = DeviceSnapshot::new("wwan0", DeviceType::Modem, "/dev/4");
        assert_eq!(dev.ip_iface(), "wwan0");
        dev.ip_iface = Some("ppp0".into());
        assert_eq!(dev.ip_iface(), "ppp0");
        assert_eq!(dev.device_type(), 8);
    }
}
