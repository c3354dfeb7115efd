// Network Manager - Network Utilities
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Device snapshots read from the Linux sysfs interface.
//!
//! Used by the command-line tool, which has no daemon object model to ask.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::models::{DeviceSnapshot, DeviceState, DeviceType, Error, Result};

/// Where the kernel lists network interfaces.
pub const SYSFS_NET: &str = "/sys/class/net";

/// Object path prefix for devices.
const DEVICE_PATH_PREFIX: &str = "/org/freedesktop/NetworkManager/Devices";

/// Snapshot the named interface from sysfs.
pub fn device_snapshot(iface: &str) -> Result<DeviceSnapshot> {
    device_snapshot_in(Path::new(SYSFS_NET), iface)
}

/// Snapshot the named interface from a sysfs-style directory tree.
pub fn device_snapshot_in(root: &Path, iface: &str) -> Result<DeviceSnapshot> {
    if iface.is_empty() || iface.contains('/') {
        return Err(Error::InvalidArgument(format!("invalid interface name '{}'", iface)));
    }
    let path = root.join(iface);
    if !path.is_dir() {
        return Err(Error::InvalidArgument(format!("no such interface '{}'", iface)));
    }

    let device_type = determine_device_type(&path, iface);
    let state = read_attr(&path, "operstate")
        .map(|s| operstate_to_state(&s))
        .unwrap_or_default();
    let ifindex = read_attr(&path, "ifindex")
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(0);

    let mut device = DeviceSnapshot::new(
        iface,
        device_type,
        format!("{}/{}", DEVICE_PATH_PREFIX, ifindex),
    );
    device.state = state;
    debug!("Interface {}: {:?}, {:?}", iface, device_type, state);
    Ok(device)
}

/// Names of all interfaces except loopback, in natural order.
pub fn list_interfaces(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().to_string())
                .filter(|name| name != "lo")
                .collect()
        })
        .unwrap_or_default();
    names.sort_by_key(|name| natural_sort_key(name));
    names
}

fn read_attr(path: &Path, attr: &str) -> Option<String> {
    fs::read_to_string(path.join(attr))
        .ok()
        .map(|s| s.trim().to_string())
}

/// Determine the device type of an interface.
fn determine_device_type(path: &Path, name: &str) -> DeviceType {
    // Check for wireless by looking for wireless directory
    if path.join("wireless").exists() || path.join("phy80211").exists() {
        return DeviceType::Wifi;
    }

    if let Some(uevent) = read_attr(path, "uevent") {
        for line in uevent.lines() {
            match line.strip_prefix("DEVTYPE=") {
                Some("wlan") => return DeviceType::Wifi,
                Some("bond") => return DeviceType::Bond,
                Some("vlan") => return DeviceType::Vlan,
                Some("bridge") => return DeviceType::Bridge,
                Some("team") => return DeviceType::Team,
                Some("bluetooth") => return DeviceType::Bluetooth,
                Some("wwan") => return DeviceType::Modem,
                _ => {}
            }
        }
    }

    if path.join("tun_flags").exists() {
        return DeviceType::Tun;
    }

    // ARPHRD_ETHER
    if read_attr(path, "type").as_deref() == Some("1") {
        return DeviceType::Ethernet;
    }

    if name.starts_with("wl") {
        return DeviceType::Wifi;
    }
    if name.starts_with("en") || name.starts_with("eth") {
        return DeviceType::Ethernet;
    }

    DeviceType::Generic
}

/// Map an RFC 2863 operational state to a device state.
fn operstate_to_state(operstate: &str) -> DeviceState {
    match operstate {
        "up" => DeviceState::Activated,
        "dormant" => DeviceState::Config,
        "down" => DeviceState::Disconnected,
        "lowerlayerdown" | "notpresent" => DeviceState::Unavailable,
        _ => DeviceState::Unknown,
    }
}

/// Generate a sort key that sorts numbers naturally.
fn natural_sort_key(s: &str) -> (String, u32) {
    let mut prefix = String::new();
    let mut num_str = String::new();

    for c in s.chars() {
        if c.is_ascii_digit() {
            num_str.push(c);
        } else if num_str.is_empty() {
            prefix.push(c);
        }
    }

    let num: u32 = num_str.parse().unwrap_or(0);
    (prefix, num)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeviceInfo;
    use std::path::PathBuf;

    fn fake_iface(root: &Path, name: &str, attrs: &[(&str, &str)]) -> PathBuf {
        let path = root.join(name);
        fs::create_dir_all(&path).unwrap();
        for (attr, value) in attrs {
            fs::write(path.join(attr), format!("{}\n", value)).unwrap();
        }
        path
    }

    #[test]
    fn test_natural_sort_key() {
        assert_eq!(natural_sort_key("eth0"), ("eth".to_string(), 0));
        assert_eq!(natural_sort_key("eth10"), ("eth".to_string(), 10));
        assert_eq!(natural_sort_key("enp3s0"), ("enp".to_string(), 30));
    }

    #[test]
    fn test_ethernet_snapshot() {
        let root = tempfile::tempdir().unwrap();
        fake_iface(
            root.path(),
            "eth0",
            &[("type", "1"), ("operstate", "up"), ("ifindex", "2")],
        );

        let device = device_snapshot_in(root.path(), "eth0").unwrap();
        assert_eq!(device.device_type, DeviceType::Ethernet);
        assert_eq!(device.state, DeviceState::Activated);
        assert_eq!(device.path(), "/org/freedesktop/NetworkManager/Devices/2");
        assert_eq!(device.ip_iface(), "eth0");
    }

    #[test]
    fn test_wireless_snapshot() {
        let root = tempfile::tempdir().unwrap();
        let path = fake_iface(root.path(), "wlp2s0", &[("type", "1"), ("operstate", "dormant")]);
        fs::create_dir(path.join("wireless")).unwrap();

        let device = device_snapshot_in(root.path(), "wlp2s0").unwrap();
        assert_eq!(device.device_type, DeviceType::Wifi);
        assert_eq!(device.state, DeviceState::Config);
    }

    #[test]
    fn test_uevent_devtype() {
        let root = tempfile::tempdir().unwrap();
        fake_iface(
            root.path(),
            "br0",
            &[("type", "1"), ("uevent", "DEVTYPE=bridge\nINTERFACE=br0")],
        );
        let device = device_snapshot_in(root.path(), "br0").unwrap();
        assert_eq!(device.device_type, DeviceType::Bridge);
        assert_eq!(device.state, DeviceState::Unknown);
    }

    #[test]
    fn test_missing_interface_is_error() {
        let root = tempfile::tempdir().unwrap();
        assert!(device_snapshot_in(root.path(), "eth9").is_err());
        assert!(device_snapshot_in(root.path(), "../etc").is_err());
    }

    #[test]
    fn test_list_interfaces_skips_loopback() {
        let root = tempfile::tempdir().unwrap();
        for name in ["lo", "eth10", "eth2", "wlan0"] {
            fake_iface(root.path(), name, &[]);
        }
        assert_eq!(list_interfaces(root.path()), vec!["eth2", "eth10", "wlan0"]);
    }
}
