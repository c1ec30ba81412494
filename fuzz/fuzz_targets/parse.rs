#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let (control_interface, bytes) = match data.split_first() {
        Some((&first, rest)) => (first, rest),
        None => (0, data),
    };
    let result = uac_topology::Parser::new(control_interface)
        .validate_topology(true)
        .parse(bytes);
    let s = format!("{result:?}");
    std::hint::black_box(s);
});
