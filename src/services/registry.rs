// Network Manager - Request Registry
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Bookkeeping for in-flight asynchronous dispatch calls.
//!
//! Records live in an arena. A [`RequestId`] pairs the arena slot with the
//! request's serial number, so an identifier that outlived its record never
//! matches whatever later reuses the slot.

use std::fmt;
use std::num::NonZeroU64;

use tracing::debug;

use crate::models::{DispatchCompletion, Error, Result};

/// Completion callback of an asynchronous dispatch. Any caller context is
/// captured by the closure.
pub type DispatchCallback = Box<dyn FnOnce(RequestId, DispatchCompletion)>;

/// Identifier of one asynchronous dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId {
    serial: NonZeroU64,
    slot: u32,
}

impl RequestId {
    /// The process-unique serial number. Never 0.
    pub fn get(&self) -> u64 {
        self.serial.get()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.serial)
    }
}

struct Record {
    serial: NonZeroU64,
    callback: Option<DispatchCallback>,
}

/// Pending-call records keyed by [`RequestId`].
///
/// Only ever touched from the thread running the dispatcher, so no locking.
#[derive(Default)]
pub struct RequestRegistry {
    slots: Vec<Option<Record>>,
    free: Vec<u32>,
    last_serial: u64,
    len: usize,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record for `serial`.
    ///
    /// Serials must strictly increase; a repeated or older serial is
    /// rejected as a duplicate.
    pub fn register(
        &mut self,
        serial: NonZeroU64,
        callback: Option<DispatchCallback>,
    ) -> Result<RequestId> {
        if serial.get() <= self.last_serial {
            return Err(Error::DuplicateRequest(serial.get()));
        }
        self.last_serial = serial.get();

        let record = Record { serial, callback };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(record);
                slot
            }
            None => {
                let slot = u32::try_from(self.slots.len())
                    .map_err(|_| Error::Internal("request registry is full".to_string()))?;
                self.slots.push(Some(record));
                slot
            }
        };
        self.len += 1;
        debug!("Registered dispatcher request {} in slot {}", serial, slot);
        Ok(RequestId { serial, slot })
    }

    fn record_mut(&mut self, id: RequestId) -> Option<&mut Record> {
        self.slots
            .get_mut(id.slot as usize)
            .and_then(Option::as_mut)
            .filter(|record| record.serial == id.serial)
    }

    /// Replace the stored callback with nothing, so the eventual completion
    /// invokes nothing. Unknown identifiers are an error.
    pub fn lookup_and_clear_callback(&mut self, id: RequestId) -> Result<()> {
        let record = self
            .record_mut(id)
            .ok_or(Error::UnknownRequest(id.get()))?;
        record.callback = None;
        Ok(())
    }

    /// Take the callback out for invocation. The record itself stays until
    /// [`remove`](Self::remove).
    pub fn take_callback(&mut self, id: RequestId) -> Option<DispatchCallback> {
        self.record_mut(id).and_then(|record| record.callback.take())
    }

    /// Free the record. Returns whether it existed.
    pub fn remove(&mut self, id: RequestId) -> bool {
        if self.record_mut(id).is_none() {
            return false;
        }
        self.slots[id.slot as usize] = None;
        self.free.push(id.slot);
        self.len -= 1;
        true
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.slots
            .get(id.slot as usize)
            .and_then(Option::as_ref)
            .is_some_and(|record| record.serial == id.serial)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
