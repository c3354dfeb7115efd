// Network Manager - Wireless Security
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! # Wireless Security
//!
//! Credential handling for WEP and WPA-PSK networks:
//!
//! - **Key**: Raw key bytes, zeroed on drop
//! - **Cipher**: Turning user input into raw keys
//! - **Wire**: Encoding credentials as message arguments

pub mod cipher;
pub mod key;
pub mod wire;

pub use cipher::{we_cipher, HexKeyCipher, KeyCipher};
pub use key::KeyMaterial;
pub use wire::{
    encode_wep_with_cipher, encode_wpa_psk_with_cipher, KeyMgmt, SecurityCredential,
    WepAuthAlg, WepCredential, WpaPskCredential, WpaVersion,
};
