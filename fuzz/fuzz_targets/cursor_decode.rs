#![no_main]

use dungeoneer::cursor::Cursor;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(token) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding an arbitrary token must either fail cleanly or produce a
    // cursor whose canonical encoding decodes back to the same ordinal.
    if let Ok(cursor) = Cursor::decode(token) {
        assert!(cursor.0 >= 0);
        let canonical = cursor.encode();
        let round = Cursor::decode(&canonical).expect("canonical token decodes");
        assert_eq!(round, cursor);
    }
});
