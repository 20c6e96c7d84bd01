//! # TupleGrid Codec
//!
//! The backend-native value model and its canonical CBOR form.
//!
//! Every value a datastore dialect stores or returns is a [`Value`]. The
//! in-memory backend persists documents as canonical CBOR so that equal
//! documents always produce equal bytes, which keeps revision digests
//! stable across processes.
//!
//! ## Canonical CBOR Rules
//!
//! - Maps are sorted by key (length-first, then bytewise on encoded keys)
//! - Integers use shortest encoding
//! - Floats are always 64-bit doubles; NaN is rejected
//! - UUIDs use tag 37, timestamps use a private epoch-millisecond tag
//! - Strings must be UTF-8
//! - No indefinite-length items
//!
//! ## Usage
//!
//! ```
//! use tuplegrid_codec::{to_canonical_cbor, from_cbor, Value};
//!
//! let value = Value::text_map([("name", Value::from("Alice"))]);
//! let bytes = to_canonical_cbor(&value).unwrap();
//!
//! let decoded: Value = from_cbor(&bytes).unwrap();
//! assert_eq!(value, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder, TAG_EPOCH_MILLIS, TAG_UUID};
pub use error::{CodecError, CodecResult};
pub use value::Value;

/// Trait for types that can be encoded to canonical CBOR.
pub trait Encode {
    /// Encode this value to canonical CBOR bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from CBOR.
pub trait Decode: Sized {
    /// Decode this value from CBOR bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Value {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(self)
    }
}

impl Decode for Value {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}
