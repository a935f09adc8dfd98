#![no_main]
use ison_pack::{Decoder, InterningTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let table: InterningTable = [(1u16, "loadouts"), (2, "slotType")].into_iter().collect();
    let _ = Decoder::new(&table).decode(data);
    let _ = Decoder::new(&table).strict(true).decode(data);
});
