//! IEEE 1722 Audio Video Transport Protocol framer (spec §4.7).
//!
//! A decoded packet is a tagged union ([`AvtpPacket`]) rather than the
//! virtual-dispatch `AVTPDU` hierarchy of the source implementation (spec
//! §9): the common header is a plain struct composed into every variant,
//! dispatched on `subtype` by a `match`.

pub mod aaf;
pub mod crf;
pub mod cvf;
pub mod header;
pub mod packet;

pub use aaf::{AafFormat, AafHeader, AAF_HEADER_LEN, NOMINAL_SAMPLE_RATES_HZ};
pub use crf::{CrfHeader, CrfType, CRF_HEADER_LEN};
pub use cvf::{CvfFormatSubtype, CvfHeader, CVF_HEADER_LEN};
pub use header::{flags, AvtpHeader, Subtype, HEADER_LEN, SUPPORTED_VERSION};
pub use packet::{AvtpPacket, DEFAULT_MTU};
