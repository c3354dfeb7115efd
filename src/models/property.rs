// Network Manager - Property Bags
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Typed property values and the bags that carry them to dispatcher scripts.
//!
//! Device and IP-configuration objects expose their state through the
//! [`Introspect`] capability; DHCP leases expose theirs through
//! [`DhcpOptions`]. Both are flattened into a [`PropertyBag`] right before a
//! dispatch call and dropped once the call has been submitted.

use std::collections::BTreeMap;
use std::collections::HashMap;

use zbus::zvariant::{OwnedObjectPath, Value};

use super::error::{Error, Result};

/// A single typed property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    U32(u32),
    Bool(bool),
    ObjectPath(OwnedObjectPath),
    StrList(Vec<String>),
    U32List(Vec<u32>),
    /// Nested unsigned arrays, used for IPv4 addresses and routes.
    U32Table(Vec<Vec<u32>>),
}

impl PropertyValue {
    /// Build an object path value, validating the path syntax.
    pub fn object_path(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        OwnedObjectPath::try_from(path.as_str())
            .map(Self::ObjectPath)
            .map_err(|e| Error::InvalidArgument(format!("invalid object path '{}': {}", path, e)))
    }

    /// D-Bus signature of the value once placed in a variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "s",
            Self::U32(_) => "u",
            Self::Bool(_) => "b",
            Self::ObjectPath(_) => "o",
            Self::StrList(_) => "as",
            Self::U32List(_) => "au",
            Self::U32Table(_) => "aau",
        }
    }

    /// Convert into a wire variant.
    pub fn to_value(&self) -> Value<'static> {
        match self {
            Self::Str(s) => Value::from(s.clone()),
            Self::U32(n) => Value::from(*n),
            Self::Bool(b) => Value::from(*b),
            Self::ObjectPath(p) => Value::ObjectPath(p.clone().into_inner()),
            Self::StrList(list) => Value::from(list.clone()),
            Self::U32List(list) => Value::from(list.clone()),
            Self::U32Table(table) => Value::from(table.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::ObjectPath(p) => Some(p.as_str()),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<u32> for PropertyValue {
    fn from(n: u32) -> Self {
        Self::U32(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Wire form of a property bag: `a{sv}`.
pub type VariantMap = HashMap<String, Value<'static>>;

/// Ordered mapping from property names to typed values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyBag {
    entries: BTreeMap<String, PropertyValue>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Dump every readable attribute of an introspectable object.
    pub fn fill_from_object(&mut self, object: &dyn Introspect) {
        for name in object.list_attributes() {
            if let Some(value) = object.get_attribute(name) {
                self.insert(name, value);
            }
        }
    }

    /// Dump every DHCP option as a string entry.
    pub fn fill_from_dhcp(&mut self, options: &dyn DhcpOptions) {
        for name in options.list_options() {
            if let Some(value) = options.get_option(&name) {
                self.insert(name, value);
            }
        }
    }

    /// Convert into the `a{sv}` wire representation.
    pub fn to_variant_map(&self) -> VariantMap {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_value()))
            .collect()
    }
}

/// Attribute introspection for objects whose state is dumped into a bag.
///
/// Every name returned by [`Introspect::list_attributes`] that yields a value
/// from [`Introspect::get_attribute`] becomes one bag entry.
pub trait Introspect {
    fn list_attributes(&self) -> Vec<&'static str>;
    fn get_attribute(&self, name: &str) -> Option<PropertyValue>;
}

/// Name/value access to DHCP lease options.
pub trait DhcpOptions {
    fn list_options(&self) -> Vec<String>;
    fn get_option(&self, name: &str) -> Option<String>;
}
