//! Arbitrary host traffic against the device.
//!
//! The device must answer every operation exactly as the reference model
//! does, consume exactly the bytes the header advertised and sign only after
//! a confirmed touch.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mkdf_harness::{
    CountingIdentity, ModelSigner, Operation, RecordingLed, ScriptTransport, ScriptedTouch,
    seeded_secret,
};
use mkdf_signer::{Device, SignerConfig};

#[derive(Debug, Arbitrary)]
struct Input {
    seed: u64,
    touch_after: u8,
    ops: Vec<Operation>,
}

fuzz_target!(|input: Input| {
    let mut model = ModelSigner::new(seeded_secret(input.seed));

    let identity = CountingIdentity::new(seeded_secret(input.seed));
    let signs = identity.counter();
    let touch = ScriptedTouch::after(usize::from(input.touch_after));
    let touches = touch.stats();
    let mut device = Device::with_identity(
        SignerConfig::default(),
        identity,
        ScriptTransport::default(),
        touch,
        RecordingLed::default(),
    );

    for op in &input.ops {
        device.transport_mut().push(&op.to_wire());
        if device.serve_one().is_err() {
            panic!("transport failed on {op:?}");
        }
        assert_eq!(device.transport().pending(), 0);
        assert_eq!(device.transport_mut().take_output(), model.apply(op), "{op:?}");
    }

    let signed = signs.load(std::sync::atomic::Ordering::SeqCst);
    assert_eq!(signed, model.signed());
    assert_eq!(touches.confirmations(), signed);
});
