//! Snapshot tests for wire format stability.
//!
//! Frames are rendered as hex and pinned with inline snapshots. If the wire
//! format changes, these tests fail before an incompatible host tool does.

use insta::assert_snapshot;
use mkdf_proto::{
    Command, Endpoint, Frame, FrameHeader, FrameId, LengthClass, NameVersion, ResponseCode, Status,
};

fn frame_to_hex(frame: &Frame) -> String {
    hex::encode(frame.as_bytes())
}

fn host_request(len: LengthClass, command: Command) -> Frame {
    Frame::request(FrameId::new(2).unwrap(), Endpoint::Software, len, command.to_u8())
}

#[test]
fn snapshot_get_name_version_request() {
    let frame = host_request(LengthClass::Len1, Command::GetNameVersion);
    assert_snapshot!(frame_to_hex(&frame), @"5809");
}

#[test]
fn snapshot_set_message_size_request() {
    let mut frame = host_request(LengthClass::Len32, Command::SetMessageSize);
    frame.body_mut()[..4].copy_from_slice(&5u32.to_le_bytes());
    assert_snapshot!(
        frame_to_hex(&frame),
        @"5a0305000000000000000000000000000000000000000000000000000000000000"
    );
}

#[test]
fn snapshot_name_version_response() {
    let request = FrameHeader::decode(0x58).unwrap();
    let mut frame = Frame::response(&request, ResponseCode::NameVersion);
    frame.body_mut()[..NameVersion::WIRE_SIZE].copy_from_slice(&NameVersion::SIGNER.to_wire());
    assert_snapshot!(
        frame_to_hex(&frame),
        @"5a0a66646b6d6e6769730100000000000000000000000000000000000000000000"
    );
}

#[test]
fn snapshot_status_responses() {
    let request = FrameHeader::decode(0x5a).unwrap();

    let mut ok = Frame::response(&request, ResponseCode::SetMessageSize);
    ok.body_mut()[0] = Status::Ok.to_u8();
    assert_snapshot!(frame_to_hex(&ok), @"5904000000");

    let mut bad = Frame::response(&request, ResponseCode::SignData);
    bad.body_mut()[0] = Status::Bad.to_u8();
    assert_snapshot!(frame_to_hex(&bad), @"5906010000");
}

#[test]
fn snapshot_unknown_command_response() {
    let request = FrameHeader::decode(0x1b).unwrap();
    let frame = Frame::response(&request, ResponseCode::UnknownCommand);
    assert_snapshot!(frame_to_hex(&frame), @"18ff");
}
