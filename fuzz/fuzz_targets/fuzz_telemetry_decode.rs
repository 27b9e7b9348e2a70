//! Fuzz target: telemetry frame decoding on the receiver.
//!
//! Drives arbitrary byte sequences through both wire formats and the
//! mirror, asserting that:
//! - No panics under any byte sequence
//! - A rejected frame never replaces the mirrored snapshot
//! - Anything accepted re-encodes to a frame that decodes to the same message
//!
//! cargo fuzz run fuzz_telemetry_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use nitrox::config::WireFormat;
use nitrox::telemetry::wire;
use nitrox::telemetry::TelemetryMirror;

fuzz_target!(|data: &[u8]| {
    for format in [WireFormat::Legacy, WireFormat::Versioned] {
        let mirror = TelemetryMirror::new();
        match mirror.accept_frame(data, format) {
            Ok(msg) => {
                assert_eq!(mirror.accepted_count(), 1);
                let frame = wire::encode(&msg, format).expect("accepted message must re-encode");
                let again = wire::decode(&frame, format).expect("re-encoded frame must decode");
                // NaN payloads compare unequal; compare the encoded bytes instead.
                assert_eq!(wire::encode(&again, format).ok(), Some(frame));
            }
            Err(_) => {
                assert!(mirror.latest().is_none());
                assert_eq!(mirror.rejected_count(), 1);
            }
        }
    }
});
