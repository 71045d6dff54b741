//! Codec contract shared by every frame type in the workspace (spec §4.1).
//!
//! Every wire frame implements both traits. `encode` never fails (callers
//! build frames from already-validated Rust values); `decode` either
//! returns a complete, valid frame or a [`WireError`] — there is no partial
//! decode.

use crate::error::Result;

/// Serializes `Self` into network-byte-order bytes appended to `buf`.
pub trait WireEncode {
    /// Append the wire representation of `self` to `buf`, returning the
    /// number of bytes written.
    fn encode(&self, buf: &mut Vec<u8>) -> usize;

    /// Convenience: encode into a freshly allocated buffer.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

/// Parses `Self` from a byte slice.
pub trait WireDecode: Sized {
    /// Decode `Self` from the front of `data`. On success returns the
    /// decoded value; callers that need to know how many bytes were
    /// consumed use [`WireDecodeLen::decode_len`] instead.
    fn decode(data: &[u8]) -> Result<Self>;
}

/// Decoders that need to report how much of the input they consumed (e.g.
/// because a caller is iterating frames packed back-to-back in one buffer).
pub trait WireDecodeLen: Sized {
    /// Decode `Self` from the front of `data`, returning the value and the
    /// number of bytes consumed.
    fn decode_len(data: &[u8]) -> Result<(Self, usize)>;
}

/// Big-endian integer read/write helpers used by every hand-rolled codec in
/// this workspace (the fixed-layout headers use `zerocopy` directly; these
/// helpers cover the bit-packed and variable-length portions zerocopy can't
/// express).
pub mod be {
    use crate::error::WireError;

    macro_rules! be_getter {
        ($name:ident, $ty:ty, $n:expr) => {
            /// Read a big-endian
            #[doc = stringify!($ty)]
            /// from the front of `data`.
            pub fn $name(data: &[u8]) -> Result<$ty, WireError> {
                if data.len() < $n {
                    return Err(WireError::truncated($n, data));
                }
                let mut buf = [0u8; $n];
                buf.copy_from_slice(&data[..$n]);
                Ok(<$ty>::from_be_bytes(buf))
            }
        };
    }

    be_getter!(u16, u16, 2);
    be_getter!(u32, u32, 4);
    be_getter!(u64, u64, 8);
    be_getter!(i32, i32, 4);
    be_getter!(i64, i64, 8);

    /// Append a big-endian `u16`.
    pub fn put_u16(buf: &mut Vec<u8>, v: u16) {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    /// Append a big-endian `u32`.
    pub fn put_u32(buf: &mut Vec<u8>, v: u32) {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    /// Append a big-endian `u64`.
    pub fn put_u64(buf: &mut Vec<u8>, v: u64) {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    /// Append a big-endian `i32`.
    pub fn put_i32(buf: &mut Vec<u8>, v: i32) {
        buf.extend_from_slice(&v.to_be_bytes());
    }
    /// Append a big-endian `i64`.
    pub fn put_i64(buf: &mut Vec<u8>, v: i64) {
        buf.extend_from_slice(&v.to_be_bytes());
    }
}
