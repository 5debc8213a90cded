use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// -------------------------------------------------------------------------------------------------
// ObjectId
// -------------------------------------------------------------------------------------------------
/// A Git SHA-1 object name, such as a tree or commit ID
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize)]
#[serde(into = "String")]
pub struct ObjectId([u8; 20]);

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct Vis;
        impl serde::de::Visitor<'_> for Vis {
            type Value = ObjectId;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a 40-character hex string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                ObjectId::from_hex(v).map_err(|e| serde::de::Error::custom(e))
            }
        }
        d.deserialize_str(Vis)
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.hex())
    }
}

impl ObjectId {
    /// The length of a hex-encoded SHA-1 object ID
    pub const HEX_LEN: usize = 40;

    /// Create a new `ObjectId` from a hexadecimal string.
    ///
    /// The input must be exactly 40 hex digits; either case is accepted.
    pub fn from_hex(v: &str) -> Result<Self> {
        if v.len() != Self::HEX_LEN {
            return Err(Error::validation(
                "object ID",
                format!("expected {} hex digits, found {} characters in {v:?}", Self::HEX_LEN, v.len()),
            ));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(v, &mut bytes)
            .map_err(|e| Error::validation("object ID", format!("{v:?}: {e}")))?;
        Ok(ObjectId(bytes))
    }

    /// Render the `ObjectId` as a lowercase hexadecimal string.
    #[inline]
    pub fn hex(&self) -> String {
        hex::encode(self.0)
    }

    /// View the `ObjectId` as bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<ObjectId> for String {
    #[inline]
    fn from(id: ObjectId) -> String {
        id.hex()
    }
}

impl TryFrom<&str> for ObjectId {
    type Error = Error;

    #[inline]
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        ObjectId::from_hex(s)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::from_hex(s)
    }
}

impl std::fmt::Display for ObjectId {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hex())
    }
}
