#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        let result = php_parser::parse(source);
        php_semantic::resolve(&result.program);
        for function in php_semantic::build_all(&result.program) {
            let cfg = &function.cfg;
            let reachable = cfg.reachable_from_entry();
            for block in cfg.blocks() {
                assert_eq!(block.dead, !reachable.contains(&block.id));
            }
        }
    }
});
