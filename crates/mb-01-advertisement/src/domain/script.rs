//! # Advertisement Locking Script
//!
//! The on-chain form of an advertisement is a push-drop token:
//!
//! ```text
//! <identityKey> OP_CHECKSIG <host> <timestamp> <nonce> <signature> OP_2DROP OP_2DROP
//! ```
//!
//! The identity key locks the output; the four data pushes carry the fields
//! and are dropped before evaluation ends.

use shared_types::{Advertisement, IdentityKey, ADVERTISEMENT_PROTOCOL, ADVERTISEMENT_VERSION};

use super::errors::AdvertisementError;

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_1NEGATE: u8 = 0x4f;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;
const OP_DROP: u8 = 0x75;
const OP_2DROP: u8 = 0x6d;
const OP_CHECKSIG: u8 = 0xac;

/// Number of data pushes an advertisement token carries.
const ADVERTISEMENT_FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Op(u8),
    Data(Vec<u8>),
}

/// Raw contents of a push-drop token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFields {
    /// Public key the output is locked to.
    pub locking_public_key: Vec<u8>,
    /// Data pushes in script order.
    pub fields: Vec<Vec<u8>>,
}

impl DecodedFields {
    /// Interpret the token as an advertisement.
    ///
    /// Every field must be present and non-empty. The signature is returned
    /// hex encoded, as advertisements carry it.
    pub fn into_advertisement(self) -> Result<Advertisement, AdvertisementError> {
        if self.fields.len() < ADVERTISEMENT_FIELD_COUNT {
            return Err(AdvertisementError::MalformedScript(format!(
                "expected {} fields, found {}",
                ADVERTISEMENT_FIELD_COUNT,
                self.fields.len()
            )));
        }

        let identity_key = IdentityKey::from_bytes(&self.locking_public_key)
            .map_err(|e| AdvertisementError::field("identityKey", e.to_string()))?;

        let mut fields = self.fields.into_iter();
        let host = utf8_field("host", fields.next())?;
        let timestamp = utf8_field("timestamp", fields.next())?;
        let nonce = utf8_field("nonce", fields.next())?;
        let signature = fields.next().unwrap_or_default();
        if signature.is_empty() {
            return Err(AdvertisementError::field("signature", "empty"));
        }

        Ok(Advertisement {
            identity_key,
            host,
            timestamp,
            nonce,
            signature: hex::encode(signature),
            protocol: ADVERTISEMENT_PROTOCOL.to_string(),
            version: ADVERTISEMENT_VERSION.to_string(),
            txid: None,
        })
    }
}

fn utf8_field(name: &'static str, raw: Option<Vec<u8>>) -> Result<String, AdvertisementError> {
    let raw = raw.unwrap_or_default();
    if raw.is_empty() {
        return Err(AdvertisementError::field(name, "empty"));
    }
    String::from_utf8(raw).map_err(|_| AdvertisementError::field(name, "not valid UTF-8"))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Build the locking script for a signed advertisement.
pub fn encode_locking_script(ad: &Advertisement) -> Result<Vec<u8>, AdvertisementError> {
    let key = ad
        .identity_key
        .to_bytes()
        .and_then(|bytes| IdentityKey::from_bytes(&bytes).map(|_| bytes))
        .map_err(|e| AdvertisementError::field("identityKey", e.to_string()))?;
    let signature = hex::decode(&ad.signature)
        .map_err(|_| AdvertisementError::field("signature", "not hex"))?;

    let mut script = Vec::with_capacity(
        key.len() + ad.host.len() + ad.timestamp.len() + ad.nonce.len() + signature.len() + 16,
    );
    push_data(&mut script, &key);
    script.push(OP_CHECKSIG);
    push_data(&mut script, ad.host.as_bytes());
    push_data(&mut script, ad.timestamp.as_bytes());
    push_data(&mut script, ad.nonce.as_bytes());
    push_data(&mut script, &signature);
    script.push(OP_2DROP);
    script.push(OP_2DROP);
    Ok(script)
}

fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len == 0 {
        script.push(OP_0);
        return;
    }
    if len < OP_PUSHDATA1 as usize {
        script.push(len as u8);
    } else if len <= u8::MAX as usize {
        script.push(OP_PUSHDATA1);
        script.push(len as u8);
    } else if len <= u16::MAX as usize {
        script.push(OP_PUSHDATA2);
        script.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        script.push(OP_PUSHDATA4);
        script.extend_from_slice(&(len as u32).to_le_bytes());
    }
    script.extend_from_slice(data);
}

// =============================================================================
// DECODING
// =============================================================================

/// Split a push-drop locking script into its key and data fields.
pub fn decode_locking_script(script: &[u8]) -> Result<DecodedFields, AdvertisementError> {
    let chunks = parse_chunks(script)?;
    let mut iter = chunks.into_iter();

    let locking_public_key = match iter.next() {
        Some(Chunk::Data(key)) => key,
        _ => {
            return Err(AdvertisementError::MalformedScript(
                "script does not start with a public key push".into(),
            ))
        }
    };
    if iter.next() != Some(Chunk::Op(OP_CHECKSIG)) {
        return Err(AdvertisementError::MalformedScript(
            "public key is not followed by OP_CHECKSIG".into(),
        ));
    }

    let mut fields = Vec::new();
    let mut dropped = 0usize;
    for chunk in iter {
        match chunk {
            Chunk::Data(data) if dropped == 0 => fields.push(data),
            Chunk::Op(OP_2DROP) => dropped += 2,
            Chunk::Op(OP_DROP) => dropped += 1,
            Chunk::Data(_) => {
                return Err(AdvertisementError::MalformedScript(
                    "data push after drop".into(),
                ))
            }
            Chunk::Op(op) => {
                return Err(AdvertisementError::MalformedScript(format!(
                    "unexpected opcode 0x{op:02x}"
                )))
            }
        }
    }
    if dropped != fields.len() {
        return Err(AdvertisementError::MalformedScript(format!(
            "{} fields pushed but {} dropped",
            fields.len(),
            dropped
        )));
    }

    Ok(DecodedFields {
        locking_public_key,
        fields,
    })
}

fn parse_chunks(script: &[u8]) -> Result<Vec<Chunk>, AdvertisementError> {
    let mut chunks = Vec::new();
    let mut pos = 0usize;

    while pos < script.len() {
        let op = script[pos];
        pos += 1;

        let len = match op {
            OP_0 => {
                chunks.push(Chunk::Data(Vec::new()));
                continue;
            }
            0x01..=0x4b => op as usize,
            OP_PUSHDATA1 => read_len(script, &mut pos, 1)?,
            OP_PUSHDATA2 => read_len(script, &mut pos, 2)?,
            OP_PUSHDATA4 => read_len(script, &mut pos, 4)?,
            OP_1NEGATE => {
                chunks.push(Chunk::Data(vec![0x81]));
                continue;
            }
            OP_1..=OP_16 => {
                chunks.push(Chunk::Data(vec![op - OP_1 + 1]));
                continue;
            }
            _ => {
                chunks.push(Chunk::Op(op));
                continue;
            }
        };

        let end = pos
            .checked_add(len)
            .filter(|end| *end <= script.len())
            .ok_or_else(|| AdvertisementError::MalformedScript("push runs past end".into()))?;
        chunks.push(Chunk::Data(script[pos..end].to_vec()));
        pos = end;
    }

    Ok(chunks)
}

fn read_len(script: &[u8], pos: &mut usize, width: usize) -> Result<usize, AdvertisementError> {
    let bytes = script
        .get(*pos..*pos + width)
        .ok_or_else(|| AdvertisementError::MalformedScript("truncated push length".into()))?;
    *pos += width;
    let mut buf = [0u8; 4];
    buf[..width].copy_from_slice(bytes);
    Ok(u32::from_le_bytes(buf) as usize)
}
