//! Document identifiers.
//!
//! Identifiers are 24 lowercase hex characters: a 4-byte big-endian Unix
//! timestamp followed by 8 random bytes. Anything else is rejected before it
//! reaches a store.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

pub const OBJECT_ID_LEN: usize = 24;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "6650a1f4c2b9e81d3a7f0c12")]
pub struct ObjectId(String);

impl ObjectId {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        let secs = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        OsRng.fill_bytes(&mut bytes[4..]);
        ObjectId(hex::encode(bytes))
    }

    /// Parses a client-supplied identifier, normalizing hex case.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == OBJECT_ID_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(ObjectId(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ObjectId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectId::parse(&value).ok_or_else(|| format!("invalid identifier: {value}"))
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}
