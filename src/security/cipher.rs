// Network Manager - Key Ciphers
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Ciphers that turn user key input into raw key bytes.
//!
//! The credential codec never hashes anything itself; a [`KeyCipher`] does
//! that first and the codec only serializes the result.

use tracing::debug;

use super::key::KeyMaterial;
use crate::models::{Error, Result};

/// Wireless-extensions cipher identifiers sent ahead of every credential.
pub mod we_cipher {
    pub const NONE: i32 = 0x01;
    pub const WEP40: i32 = 0x02;
    pub const TKIP: i32 = 0x04;
    pub const CCMP: i32 = 0x08;
    pub const WEP104: i32 = 0x10;

    /// Whether the cipher identifies a WEP key.
    pub fn is_wep(cipher: i32) -> bool {
        cipher == WEP40 || cipher == WEP104
    }

    /// Whether the cipher identifies a WPA pairwise cipher.
    pub fn is_wpa(cipher: i32) -> bool {
        cipher == TKIP || cipher == CCMP
    }
}

/// Turns `(ssid, input)` into raw key bytes for one cipher.
pub trait KeyCipher {
    /// Cipher identifier written as the first credential field.
    fn we_cipher(&self) -> i32;

    /// Hash or decode the user's input into raw key bytes.
    fn hash(&self, ssid: &str, input: &str) -> Result<KeyMaterial>;
}

/// Cipher for keys entered as hexadecimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexKeyCipher {
    we_cipher: i32,
    key_len: usize,
}

impl HexKeyCipher {
    /// 40-bit WEP key (10 hex digits).
    pub fn wep40() -> Self {
        Self {
            we_cipher: we_cipher::WEP40,
            key_len: 5,
        }
    }

    /// 104-bit WEP key (26 hex digits).
    pub fn wep104() -> Self {
        Self {
            we_cipher: we_cipher::WEP104,
            key_len: 13,
        }
    }

    /// Raw 256-bit WPA pre-shared key (64 hex digits) using TKIP.
    pub fn wpa_psk_tkip() -> Self {
        Self {
            we_cipher: we_cipher::TKIP,
            key_len: 32,
        }
    }

    /// Raw 256-bit WPA pre-shared key (64 hex digits) using CCMP.
    pub fn wpa_psk_ccmp() -> Self {
        Self {
            we_cipher: we_cipher::CCMP,
            key_len: 32,
        }
    }

    /// Number of raw key bytes this cipher produces.
    pub fn key_len(&self) -> usize {
        self.key_len
    }
}

impl KeyCipher for HexKeyCipher {
    fn we_cipher(&self) -> i32 {
        self.we_cipher
    }

    fn hash(&self, _ssid: &str, input: &str) -> Result<KeyMaterial> {
        let input = input.trim();
        if input.len() != self.key_len * 2 {
            return Err(Error::KeyHash(format!(
                "expected {} hex digits, got {}",
                self.key_len * 2,
                input.len()
            )));
        }
        let bytes = hex::decode(input).map_err(|e| Error::KeyHash(e.to_string()))?;
        debug!("Decoded {}-byte key for cipher {:#x}", bytes.len(), self.we_cipher);
        Ok(KeyMaterial::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wep40_hex() {
        let key = HexKeyCipher::wep40().hash("home", "0102030405").unwrap();
        assert_eq!(key.as_bytes(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(HexKeyCipher::wep104().hash("home", "0102030405").is_err());
    }

    #[test]
    fn test_non_hex_rejected() {
        assert!(HexKeyCipher::wep40().hash("home", "zz02030405").is_err());
    }

    #[test]
    fn test_cipher_families() {
        assert!(we_cipher::is_wep(HexKeyCipher::wep104().we_cipher()));
        assert!(we_cipher::is_wpa(HexKeyCipher::wpa_psk_ccmp().we_cipher()));
        assert!(!we_cipher::is_wpa(we_cipher::NONE));
    }
}
