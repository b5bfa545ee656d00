#![no_main]

// Arbitrary bytes fed to the delta decoder and patch applier: errors are
// fine, panics and wrong-but-successful output are not.

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks a small basis, the rest is the candidate delta.
    let (pick, delta) = match data.split_first() {
        Some(split) => split,
        None => return,
    };
    let basis = vec![*pick; usize::from(*pick)];
    let _ = blockdelta::engine::patch_to_vec(&basis, delta);

    // The materializing iterator must be equally robust.
    if let Ok(reader) = blockdelta::format::delta::DeltaReader::new(delta) {
        for inst in reader.instructions() {
            if inst.is_err() {
                break;
            }
        }
    }
});
