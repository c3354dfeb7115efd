// Network Manager - Credential Wire Codec
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Wire encoding of wireless security credentials.
//!
//! Layouts (one D-Bus argument per field, cipher always first):
//!
//! - WEP: `[cipher: i32][key: ay][auth_alg: i32]`
//! - WPA-PSK: `[cipher: i32][key: ay][wpa_version: i32][key_mgmt: i32]`
//!
//! Decoding is strict. A zero-length key, a missing or mistyped field, or a
//! selector outside its domain all fail with the same opaque
//! [`Error::CredentialDecode`], and nothing partially decoded escapes.

use std::slice::Iter;

use tracing::debug;
use zbus::zvariant::{Array, Structure, Value};
use zeroize::Zeroizing;

use super::cipher::{we_cipher, KeyCipher};
use super::key::KeyMaterial;
use crate::models::{Error, Result};

/// WEP authentication algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WepAuthAlg {
    OpenSystem,
    SharedKey,
}

impl WepAuthAlg {
    pub fn code(&self) -> i32 {
        match self {
            Self::OpenSystem => 1,
            Self::SharedKey => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::OpenSystem),
            2 => Some(Self::SharedKey),
            _ => None,
        }
    }
}

/// WPA protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WpaVersion {
    Wpa,
    Wpa2,
}

impl WpaVersion {
    pub fn code(&self) -> i32 {
        match self {
            Self::Wpa => 1,
            Self::Wpa2 => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Wpa),
            2 => Some(Self::Wpa2),
            _ => None,
        }
    }
}

/// WPA key management scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMgmt {
    Ieee8021x,
    Psk,
}

impl KeyMgmt {
    pub fn code(&self) -> i32 {
        match self {
            Self::Ieee8021x => 1,
            Self::Psk => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Ieee8021x),
            2 => Some(Self::Psk),
            _ => None,
        }
    }
}

/// A WEP key with its authentication algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WepCredential {
    cipher: i32,
    key: KeyMaterial,
    auth_alg: WepAuthAlg,
}

/// A WPA pre-shared key with its version and key management selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WpaPskCredential {
    cipher: i32,
    key: KeyMaterial,
    wpa_version: WpaVersion,
    key_mgmt: KeyMgmt,
}

/// Any credential the codec understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityCredential {
    Wep(WepCredential),
    WpaPsk(WpaPskCredential),
}

fn require_key(key: &KeyMaterial) -> Result<()> {
    if key.is_empty() {
        return Err(Error::CredentialEncode("key must not be empty"));
    }
    Ok(())
}

/// Copies the key straight into the array elements. The copy is not
/// zeroized, so encoded fields should be dropped as soon as they are sent.
fn key_value(key: &KeyMaterial) -> Value<'static> {
    Value::Array(Array::from(key.as_bytes()))
}

impl WepCredential {
    /// Build a WEP credential. The raw key must not be empty.
    pub fn new(cipher: i32, key: KeyMaterial, auth_alg: WepAuthAlg) -> Result<Self> {
        require_key(&key)?;
        Ok(Self {
            cipher,
            key,
            auth_alg,
        })
    }

    /// Build from an unchecked selector code, as received from a caller.
    pub fn from_raw(cipher: i32, key: &[u8], auth_alg: i32) -> Result<Self> {
        let auth_alg = WepAuthAlg::from_code(auth_alg)
            .ok_or(Error::CredentialEncode("WEP auth algorithm out of range"))?;
        Self::new(cipher, KeyMaterial::from(key), auth_alg)
    }

    pub fn cipher(&self) -> i32 {
        self.cipher
    }

    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    pub fn auth_alg(&self) -> WepAuthAlg {
        self.auth_alg
    }

    /// Encode into wire fields. The key field is a plain copy of the key.
    pub fn encode(&self) -> Vec<Value<'static>> {
        vec![
            Value::I32(self.cipher),
            key_value(&self.key),
            Value::I32(self.auth_alg.code()),
        ]
    }

    /// Decode from wire fields.
    pub fn decode(fields: &[Value<'_>]) -> Result<Self> {
        let mut reader = FieldReader::new(fields);
        let cipher = reader.cipher()?;
        let key = reader.key()?;
        let auth_alg = reader.selector(WepAuthAlg::from_code)?;
        reader.finish()?;
        Ok(Self {
            cipher,
            key,
            auth_alg,
        })
    }
}

impl WpaPskCredential {
    /// Build a WPA-PSK credential. The raw key must not be empty.
    pub fn new(
        cipher: i32,
        key: KeyMaterial,
        wpa_version: WpaVersion,
        key_mgmt: KeyMgmt,
    ) -> Result<Self> {
        require_key(&key)?;
        Ok(Self {
            cipher,
            key,
            wpa_version,
            key_mgmt,
        })
    }

    /// Build from unchecked selector codes, as received from a caller.
    pub fn from_raw(cipher: i32, key: &[u8], wpa_version: i32, key_mgmt: i32) -> Result<Self> {
        let wpa_version = WpaVersion::from_code(wpa_version)
            .ok_or(Error::CredentialEncode("WPA version out of range"))?;
        let key_mgmt = KeyMgmt::from_code(key_mgmt)
            .ok_or(Error::CredentialEncode("WPA key management out of range"))?;
        Self::new(cipher, KeyMaterial::from(key), wpa_version, key_mgmt)
    }

    pub fn cipher(&self) -> i32 {
        self.cipher
    }

    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    pub fn wpa_version(&self) -> WpaVersion {
        self.wpa_version
    }

    pub fn key_mgmt(&self) -> KeyMgmt {
        self.key_mgmt
    }

    /// Encode into wire fields. The key field is a plain copy of the key.
    pub fn encode(&self) -> Vec<Value<'static>> {
        vec![
            Value::I32(self.cipher),
            key_value(&self.key),
            Value::I32(self.wpa_version.code()),
            Value::I32(self.key_mgmt.code()),
        ]
    }

    /// Decode from wire fields. The version is checked before key management
    /// is even read.
    pub fn decode(fields: &[Value<'_>]) -> Result<Self> {
        let mut reader = FieldReader::new(fields);
        let cipher = reader.cipher()?;
        let key = reader.key()?;
        let wpa_version = reader.selector(WpaVersion::from_code)?;
        let key_mgmt = reader.selector(KeyMgmt::from_code)?;
        reader.finish()?;
        Ok(Self {
            cipher,
            key,
            wpa_version,
            key_mgmt,
        })
    }
}

impl SecurityCredential {
    pub fn cipher(&self) -> i32 {
        match self {
            Self::Wep(c) => c.cipher,
            Self::WpaPsk(c) => c.cipher,
        }
    }

    pub fn encode(&self) -> Vec<Value<'static>> {
        match self {
            Self::Wep(c) => c.encode(),
            Self::WpaPsk(c) => c.encode(),
        }
    }

    /// Decode, choosing the layout from the leading cipher identifier.
    pub fn decode(fields: &[Value<'_>]) -> Result<Self> {
        match fields.first() {
            Some(Value::I32(cipher)) if we_cipher::is_wep(*cipher) => {
                WepCredential::decode(fields).map(Self::Wep)
            }
            Some(Value::I32(cipher)) if we_cipher::is_wpa(*cipher) => {
                WpaPskCredential::decode(fields).map(Self::WpaPsk)
            }
            _ => Err(Error::CredentialDecode),
        }
    }

    /// Encode as a message body structure.
    pub fn to_structure(&self) -> Structure<'static> {
        self.encode()
            .into_iter()
            .fold(zbus::zvariant::StructureBuilder::new(), |builder, field| {
                builder.append_field(field)
            })
            .build()
    }

    /// Decode the arguments of a received message.
    pub fn from_message(message: &zbus::Message) -> Result<Self> {
        let body = message.body();
        let args: Structure<'_> = body.deserialize().map_err(|e| {
            debug!("Credential body rejected: {}", e);
            Error::CredentialDecode
        })?;
        Self::decode(args.fields())
    }
}

/// Hash `input` with `cipher` and encode a WEP credential.
pub fn encode_wep_with_cipher(
    cipher: &dyn KeyCipher,
    ssid: &str,
    input: &str,
    auth_alg: WepAuthAlg,
) -> Result<Vec<Value<'static>>> {
    let key = cipher.hash(ssid, input)?;
    Ok(WepCredential::new(cipher.we_cipher(), key, auth_alg)?.encode())
}

/// Hash `input` with `cipher` and encode a WPA-PSK credential.
pub fn encode_wpa_psk_with_cipher(
    cipher: &dyn KeyCipher,
    ssid: &str,
    input: &str,
    wpa_version: WpaVersion,
    key_mgmt: KeyMgmt,
) -> Result<Vec<Value<'static>>> {
    let key = cipher.hash(ssid, input)?;
    Ok(WpaPskCredential::new(cipher.we_cipher(), key, wpa_version, key_mgmt)?.encode())
}

/// Sequential, validating reader over wire fields.
struct FieldReader<'f, 'v> {
    fields: Iter<'f, Value<'v>>,
}

impl<'f, 'v> FieldReader<'f, 'v> {
    fn new(fields: &'f [Value<'v>]) -> Self {
        Self {
            fields: fields.iter(),
        }
    }

    fn next_i32(&mut self) -> Result<i32> {
        match self.fields.next() {
            Some(Value::I32(n)) => Ok(*n),
            _ => Err(Error::CredentialDecode),
        }
    }

    fn cipher(&mut self) -> Result<i32> {
        self.next_i32()
    }

    /// A byte array with at least one byte.
    fn key(&mut self) -> Result<KeyMaterial> {
        let Some(Value::Array(array)) = self.fields.next() else {
            return Err(Error::CredentialDecode);
        };
        if array.element_signature().as_str() != "y" || array.is_empty() {
            return Err(Error::CredentialDecode);
        }
        // Sized up front so the buffer never reallocates and leaves copies.
        let mut bytes = Zeroizing::new(Vec::with_capacity(array.inner().len()));
        for value in array.inner() {
            let Value::U8(byte) = value else {
                return Err(Error::CredentialDecode);
            };
            bytes.push(*byte);
        }
        Ok(KeyMaterial::new(std::mem::take(&mut *bytes)))
    }

    /// A present, `i32`-typed field whose value is in the selector's domain.
    fn selector<T>(&mut self, from_code: fn(i32) -> Option<T>) -> Result<T> {
        let code = self.next_i32()?;
        from_code(code).ok_or(Error::CredentialDecode)
    }

    /// Trailing fields mean the layout is not the one expected.
    fn finish(mut self) -> Result<()> {
        match self.fields.next() {
            None => Ok(()),
            Some(_) => Err(Error::CredentialDecode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::cipher::HexKeyCipher;
    use rstest::rstest;

    fn wpa_fields(key: &[u8], version: i32, mgmt: i32) -> Vec<Value<'static>> {
        vec![
            Value::I32(we_cipher::CCMP),
            Value::from(key.to_vec()),
            Value::I32(version),
            Value::I32(mgmt),
        ]
    }

    #[test]
    fn test_wpa_psk_round_trip() {
        let fields = wpa_fields(b"secret", 1, 2);
        let decoded = WpaPskCredential::decode(&fields).unwrap();
        assert_eq!(decoded.wpa_version(), WpaVersion::Wpa);
        assert_eq!(decoded.key_mgmt(), KeyMgmt::Psk);
        assert_eq!(decoded.key().as_bytes(), b"secret");
        assert_eq!(decoded.encode(), fields);
    }

    #[test]
    fn test_encoded_key_is_byte_array() {
        let key = KeyMaterial::from(&[1u8, 2, 3, 4, 5][..]);
        let credential =
            WepCredential::new(we_cipher::WEP40, key, WepAuthAlg::OpenSystem).unwrap();
        let fields = credential.encode();
        let Value::Array(key) = &fields[1] else {
            panic!("key should be an array");
        };
        assert_eq!(key.element_signature().as_str(), "y");
        assert_eq!(
            key.inner(),
            &[Value::U8(1), Value::U8(2), Value::U8(3), Value::U8(4), Value::U8(5)]
        );
    }

    #[test]
    fn test_wep_round_trip() {
        let fields = vec![
            Value::I32(we_cipher::WEP104),
            Value::from(vec![0x11u8; 13]),
            Value::I32(2),
        ];
        let decoded = WepCredential::decode(&fields).unwrap();
        assert_eq!(decoded.auth_alg(), WepAuthAlg::SharedKey);
        assert_eq!(decoded.encode(), fields);
    }

    #[test]
    fn test_zero_length_key_rejected() {
        let fields = wpa_fields(b"", 1, 2);
        assert!(matches!(
            WpaPskCredential::decode(&fields),
            Err(Error::CredentialDecode)
        ));
        let wep = vec![Value::I32(we_cipher::WEP40), Value::from(Vec::<u8>::new()), Value::I32(1)];
        assert!(WepCredential::decode(&wep).is_err());
    }

    #[rstest]
    #[case(0, 2)]
    #[case(3, 2)]
    #[case(-1, 1)]
    #[case(1, 0)]
    #[case(2, 3)]
    fn test_wpa_selectors_out_of_domain(#[case] version: i32, #[case] mgmt: i32) {
        assert!(WpaPskCredential::decode(&wpa_fields(b"k", version, mgmt)).is_err());
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(i32::MAX)]
    fn test_wep_auth_out_of_domain(#[case] auth: i32) {
        let fields = vec![Value::I32(we_cipher::WEP40), Value::from(b"12345".to_vec()), Value::I32(auth)];
        assert!(WepCredential::decode(&fields).is_err());
    }

    #[test]
    fn test_missing_field_is_failure() {
        let mut fields = wpa_fields(b"secret", 2, 2);
        fields.pop();
        assert!(WpaPskCredential::decode(&fields).is_err());
        fields.pop();
        assert!(WpaPskCredential::decode(&fields).is_err());
    }

    #[test]
    fn test_bad_version_is_reported_before_reading_key_mgmt() {
        // Version is out of range and key management is missing entirely;
        // both fail the same way, so only the outcome is observable.
        let fields = vec![
            Value::I32(we_cipher::TKIP),
            Value::from(b"secret".to_vec()),
            Value::I32(9),
        ];
        assert!(matches!(
            WpaPskCredential::decode(&fields),
            Err(Error::CredentialDecode)
        ));
    }

    #[test]
    fn test_mistyped_fields_rejected() {
        let key_as_string = vec![
            Value::I32(we_cipher::WEP40),
            Value::from("12345"),
            Value::I32(1),
        ];
        assert!(WepCredential::decode(&key_as_string).is_err());

        let selector_as_u32 = vec![
            Value::I32(we_cipher::WEP40),
            Value::from(b"12345".to_vec()),
            Value::U32(1),
        ];
        assert!(WepCredential::decode(&selector_as_u32).is_err());

        let key_as_u32_array = vec![
            Value::I32(we_cipher::WEP40),
            Value::from(vec![1u32, 2, 3]),
            Value::I32(1),
        ];
        assert!(WepCredential::decode(&key_as_u32_array).is_err());
    }

    #[test]
    fn test_trailing_field_rejected() {
        let mut fields = wpa_fields(b"secret", 2, 1);
        fields.push(Value::I32(0));
        assert!(WpaPskCredential::decode(&fields).is_err());
    }

    #[test]
    fn test_encode_rejects_empty_key_and_bad_selectors() {
        assert!(WepCredential::from_raw(we_cipher::WEP40, b"", 1).is_err());
        assert!(WepCredential::from_raw(we_cipher::WEP40, b"12345", 3).is_err());
        assert!(WpaPskCredential::from_raw(we_cipher::CCMP, b"k", 4, 2).is_err());
        assert!(WpaPskCredential::from_raw(we_cipher::CCMP, b"k", 2, 0).is_err());
        assert!(WpaPskCredential::from_raw(we_cipher::CCMP, b"k", 2, 1).is_ok());
    }

    #[test]
    fn test_decode_dispatches_on_cipher() {
        let wpa = SecurityCredential::decode(&wpa_fields(b"secret", 2, 2)).unwrap();
        assert!(matches!(wpa, SecurityCredential::WpaPsk(_)));

        let unknown = vec![Value::I32(we_cipher::NONE), Value::from(b"x".to_vec()), Value::I32(1)];
        assert!(SecurityCredential::decode(&unknown).is_err());
    }

    #[test]
    fn test_with_cipher_prepends_cipher_id() {
        let fields = encode_wep_with_cipher(
            &HexKeyCipher::wep40(),
            "home",
            "a1b2c3d4e5",
            WepAuthAlg::OpenSystem,
        )
        .unwrap();
        assert_eq!(fields[0], Value::I32(we_cipher::WEP40));
        let decoded = WepCredential::decode(&fields).unwrap();
        assert_eq!(decoded.key().as_bytes(), &[0xa1, 0xb2, 0xc3, 0xd4, 0xe5]);
    }

    #[test]
    fn test_with_cipher_propagates_hash_failure() {
        let result = encode_wpa_psk_with_cipher(
            &HexKeyCipher::wpa_psk_tkip(),
            "home",
            "too-short",
            WpaVersion::Wpa2,
            KeyMgmt::Psk,
        );
        assert!(matches!(result, Err(Error::KeyHash(_))));
    }

    #[test]
    fn test_message_round_trip() {
        let credential = SecurityCredential::WpaPsk(
            WpaPskCredential::new(
                we_cipher::CCMP,
                KeyMaterial::new(b"secret".to_vec()),
                WpaVersion::Wpa2,
                KeyMgmt::Psk,
            )
            .unwrap(),
        );
        let body = (we_cipher::CCMP, b"secret".to_vec(), 2i32, 2i32);
        let message = zbus::Message::method("/org/freedesktop/NetworkManager", "SetKey")
            .unwrap()
            .build(&body)
            .unwrap();
        assert_eq!(SecurityCredential::from_message(&message).unwrap(), credential);
        assert_eq!(credential.to_structure().fields().len(), 4);
    }

    #[test]
    fn test_message_with_empty_key_rejected() {
        let body = (we_cipher::WEP40, Vec::<u8>::new(), 1i32);
        let message = zbus::Message::method("/org/freedesktop/NetworkManager", "SetKey")
            .unwrap()
            .build(&body)
            .unwrap();
        assert!(SecurityCredential::from_message(&message).is_err());
    }
}
