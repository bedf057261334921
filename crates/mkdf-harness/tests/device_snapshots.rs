//! Snapshot of a complete device conversation.
//!
//! A scripted host session runs against the real device loop and every
//! response is pinned as hex: header, response code, then the body at the
//! length its response code defines. The padding after it must be zero.

use hex_literal::hex;
use insta::assert_snapshot;
use mkdf_harness::{RecordingLed, ScriptTransport, ScriptedTouch};
use mkdf_proto::{FrameHeader, NameVersion, PUBLIC_KEY_LEN, ResponseCode, SIGNATURE_LEN};
use mkdf_signer::{Device, DeviceError, DeviceSecret, SignerConfig};

fn request(header: u8, code: u8, body: &[u8]) -> Vec<u8> {
    let len = FrameHeader::decode(header).unwrap().len.bytes();
    let mut wire = vec![0u8; 1 + len];
    wire[0] = header;
    wire[1] = code;
    wire[2..2 + body.len()].copy_from_slice(body);
    wire
}

/// Meaningful body bytes for a response code; the rest is padding.
fn body_len(code: ResponseCode) -> usize {
    match code {
        ResponseCode::PublicKey => PUBLIC_KEY_LEN,
        ResponseCode::Signature => SIGNATURE_LEN,
        ResponseCode::NameVersion => NameVersion::WIRE_SIZE,
        ResponseCode::SetMessageSize | ResponseCode::SignData => 1,
        ResponseCode::UnknownCommand => 0,
    }
}

fn render(output: &[u8]) -> String {
    let mut lines = Vec::new();
    let mut rest = output;
    while let Some((&byte, _)) = rest.split_first() {
        let (frame, tail) = rest.split_at(1 + FrameHeader::decode(byte).unwrap().len.bytes());
        let code = ResponseCode::from_u8(frame[1]).unwrap();
        let (body, padding) = frame[2..].split_at(body_len(code));
        assert!(padding.iter().all(|b| *b == 0), "stale bytes after {code:?}");

        let mut line = format!("{:02x} {:02x}", frame[0], frame[1]);
        if !body.is_empty() {
            line.push(' ');
            line.push_str(&hex::encode(body));
        }
        lines.push(line);
        rest = tail;
    }
    lines.join("\n")
}

#[test]
fn snapshot_signing_conversation() {
    let mut script = Vec::new();
    script.extend(request(0x58, 0x07, &[]));
    script.extend(request(0x58, 0x01, &[]));
    script.extend(request(0x5a, 0x03, &5u32.to_le_bytes()));
    script.extend(request(0x5b, 0x05, b"hello"));
    script.extend(request(0x50, 0x01, &[]));
    script.extend(request(0x58, 0x07, &[]));
    script.extend(request(0x58, 0x09, &[]));
    script.extend(request(0x58, 0x33, &[]));

    let mut device = Device::new(
        SignerConfig::default(),
        DeviceSecret::new([7; 32]),
        ScriptTransport::new(&script),
        ScriptedTouch::after(1),
        RecordingLed::default(),
    );
    assert!(matches!(device.run(), Err(DeviceError::Transport(_))));

    assert_snapshot!(render(device.transport().output()), @r"
    5b 08 01000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000
    5b 02 ea4a6c63e29c520abef5507b132ec5f9954776aebebe7b92421eea691446d22c
    59 04 00
    59 06 00
    5b 08 359a315920d9541c3cc2a1dd1839f3e40bf23358a1d93a6ebd8303c0310ceb5025e679222ab016b4d822c5001e787e00c0ceaa6ac3c6e80248a944bd47104f0c
    5a 0a 66646b6d6e67697301000000
    58 ff
    ");
}

#[test]
fn snapshot_rejections() {
    let mut script = Vec::new();
    // signing data before a size
    script.extend(request(0x5b, 0x05, &[0xaa; 127]));
    // size over the limit
    script.extend(request(0x5a, 0x03, &4097u32.to_le_bytes()));
    // size in the wrong length class
    script.extend(request(0x59, 0x03, &hex!("05000000")[..3]));
    // name and version with a malformed request
    script.extend(request(0x5b, 0x09, &[]));

    let mut device = Device::new(
        SignerConfig::default(),
        DeviceSecret::new([7; 32]),
        ScriptTransport::new(&script),
        ScriptedTouch::after(1),
        RecordingLed::default(),
    );
    assert!(matches!(device.run(), Err(DeviceError::Transport(_))));

    assert_snapshot!(render(device.transport().output()), @r"
    59 06 01
    59 04 01
    59 04 01
    5a 0a 000000000000000000000000
    ");
}
