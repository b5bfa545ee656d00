#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|args: Vec<String>| {
    blockdelta::cli::fuzz_try_parse_args(&args);
});
