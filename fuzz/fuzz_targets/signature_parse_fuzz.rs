#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = blockdelta::format::signature::Signature::from_bytes(data);
});
