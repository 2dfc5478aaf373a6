#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let result = php_parser::parse(source);
        // Lossless token stream for any input
        assert_eq!(result.reconstruct(source), source);
    }
});
