// Network Manager - Dispatcher Actions
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Dispatcher action kinds and their wire names.
//!
//! Helper scripts switch on the action name they receive, so the names are
//! part of the external contract and must never change.

use std::fmt;
use std::str::FromStr;

use super::error::Error;

/// A network lifecycle event announced to dispatcher scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatcherAction {
    Hostname,
    PreUp,
    Up,
    PreDown,
    Down,
    VpnPreUp,
    VpnUp,
    VpnPreDown,
    VpnDown,
    Dhcp4Change,
    Dhcp6Change,
}

impl DispatcherAction {
    /// Every action kind, in declaration order.
    pub const ALL: [DispatcherAction; 11] = [
        Self::Hostname,
        Self::PreUp,
        Self::Up,
        Self::PreDown,
        Self::Down,
        Self::VpnPreUp,
        Self::VpnUp,
        Self::VpnPreDown,
        Self::VpnDown,
        Self::Dhcp4Change,
        Self::Dhcp6Change,
    ];

    /// The fixed name sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hostname => "hostname",
            Self::PreUp => "pre-up",
            Self::Up => "up",
            Self::PreDown => "pre-down",
            Self::Down => "down",
            Self::VpnPreUp => "vpn-pre-up",
            Self::VpnUp => "vpn-up",
            Self::VpnPreDown => "vpn-pre-down",
            Self::VpnDown => "vpn-down",
            Self::Dhcp4Change => "dhcp4-change",
            Self::Dhcp6Change => "dhcp6-change",
        }
    }

    /// Whether the action needs a device. Only hostname changes do not.
    pub fn requires_device(&self) -> bool {
        !matches!(self, Self::Hostname)
    }

    /// Whether the action describes a VPN connection.
    pub fn is_vpn(&self) -> bool {
        matches!(
            self,
            Self::VpnPreUp | Self::VpnUp | Self::VpnPreDown | Self::VpnDown
        )
    }
}

impl fmt::Display for DispatcherAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatcherAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown action '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DispatcherAction::Hostname, "hostname")]
    #[case(DispatcherAction::PreUp, "pre-up")]
    #[case(DispatcherAction::Up, "up")]
    #[case(DispatcherAction::PreDown, "pre-down")]
    #[case(DispatcherAction::Down, "down")]
    #[case(DispatcherAction::VpnPreUp, "vpn-pre-up")]
    #[case(DispatcherAction::VpnUp, "vpn-up")]
    #[case(DispatcherAction::VpnPreDown, "vpn-pre-down")]
    #[case(DispatcherAction::VpnDown, "vpn-down")]
    #[case(DispatcherAction::Dhcp4Change, "dhcp4-change")]
    #[case(DispatcherAction::Dhcp6Change, "dhcp6-change")]
    fn test_wire_names(#[case] action: DispatcherAction, #[case] name: &str) {
        assert_eq!(action.as_str(), name);
        assert_eq!(name.parse::<DispatcherAction>().unwrap(), action);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = DispatcherAction::ALL.iter().map(|a| a.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), DispatcherAction::ALL.len());
    }

    #[test]
    fn test_only_hostname_is_deviceless() {
        for action in DispatcherAction::ALL {
            assert_eq!(action.requires_device(), action != DispatcherAction::Hostname);
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert!("link-up".parse::<DispatcherAction>().is_err());
    }
}
