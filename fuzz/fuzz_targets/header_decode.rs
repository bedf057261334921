//! Header decoding over raw bytes.
//!
//! Every accepted header must re-encode to the same byte, and a frame built
//! from it must have exactly the advertised length.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mkdf_proto::{Frame, FrameHeader};

fuzz_target!(|data: &[u8]| {
    let Some((&byte, payload)) = data.split_first() else {
        return;
    };

    let Ok(header) = FrameHeader::decode(byte) else {
        return;
    };
    assert_eq!(header.encode(), byte);
    assert!(!header.status);

    let mut frame = Frame::new(header);
    let len = frame.payload_mut().len();
    assert_eq!(len, header.len.bytes());
    assert_eq!(frame.as_bytes().len(), 1 + len);

    let take = len.min(payload.len());
    frame.payload_mut()[..take].copy_from_slice(&payload[..take]);
    assert_eq!(frame.as_bytes()[0], byte);
});
