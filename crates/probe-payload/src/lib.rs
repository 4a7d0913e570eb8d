//! Synthetic audio payloads.
//!
//! The buffers produced here stand in for recorded WebM audio. They carry a
//! short EBML-style header so content sniffers see something plausible, but
//! nothing past the header is decodable audio.

use bytes::Bytes;
use tracing::trace;

/// Simplified EBML + Segment header.
pub const WEBM_HEADER: [u8; 43] = [
    0x1A, 0x45, 0xDF, 0xA3, // EBML
    0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F, // header size
    0x42, 0x86, 0x81, 0x01, // EBMLVersion
    0x42, 0xF7, 0x81, 0x01, // EBMLReadVersion
    0x42, 0xF2, 0x81, 0x04, // EBMLMaxIDLength
    0x42, 0xF3, 0x81, 0x08, // EBMLMaxSizeLength
    0x42, 0x82, 0x88, // DocType
    0x77, 0x65, 0x62, 0x6D, 0x61, 0x74, 0x72, 0x6F, // "webmatro"
    0x18, 0x53, 0x80, 0x67, // Segment
];

/// Bytes reserved after the filler and zero-filled.
pub const FOOTER_MARGIN: usize = 100;

/// Content type the payload is uploaded as.
pub const CONTENT_TYPE: &str = "audio/webm";

/// Build a payload of exactly `size` bytes.
///
/// Layout is header, then filler where byte `i` of the filler is `i % 256`,
/// then zeros up to `size`. The filler stops [`FOOTER_MARGIN`] bytes short of
/// the end. Sizes smaller than the header yield a header prefix.
pub fn generate(size: usize) -> Bytes {
    let filler_len = size.saturating_sub(WEBM_HEADER.len() + FOOTER_MARGIN);

    let mut data = Vec::with_capacity(size.max(WEBM_HEADER.len()));
    data.extend_from_slice(&WEBM_HEADER);
    data.extend((0..filler_len).map(|i| (i % 256) as u8));

    let footer_len = size.saturating_sub(data.len());
    data.resize(data.len() + footer_len, 0);
    data.truncate(size);

    trace!(size, filler_len, footer_len, "generated payload");
    Bytes::from(data)
}
