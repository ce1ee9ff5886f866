#![no_main]

use libfuzzer_sys::fuzz_target;
use linestat_core::pipeline::LineParser;
use linestat_log_pipeline::parser::JsonParser;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let parser = JsonParser::new(Vec::new());
    let _ = parser.parse(&line);
});
