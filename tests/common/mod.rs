//! Common test helpers and utilities shared across test suite.

#![allow(dead_code)]

use alephmarc::{Field, Leader, MarcReader, Record};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Creates a leader whose length fields are placeholders.
pub fn create_test_leader() -> Leader {
    Leader {
        record_length: 0,
        record_status: 'n',
        record_type: 'a',
        bibliographic_level: 'm',
        control_record_type: ' ',
        character_coding: 'a',
        indicator_count: 2,
        subfield_code_count: 2,
        data_base_address: 0,
        encoding_level: ' ',
        cataloging_form: 'a',
        multipart_level: ' ',
        reserved: "4500".to_string(),
    }
}

/// The `LDR` line data matching [`create_test_leader`].
pub const TEST_LEADER_LINE: &str = "00000nam^a2200000^a^4500";

/// Record with control field 001 = "12345" and 245 10 $aTitle $bSubtitle.
pub fn create_example_record() -> Record {
    Record::builder(Leader::default())
        .control_field_str("001", "12345")
        .field(
            Field::builder("245".to_string(), '1', '0')
                .subfield_str('a', "Title")
                .subfield_str('b', "Subtitle")
                .build(),
        )
        .build()
}

/// Sequential text for [`create_example_record`].
pub const EXAMPLE_SEQUENTIAL: &str = "\
000000001 001   L 12345
000000001 24510 L $$aTitle$$bSubtitle
";

/// Reference ISO 2709 bytes for [`create_example_record`], built by hand.
pub fn example_iso2709() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"00076nam a2200049 i 4500");
    bytes.extend_from_slice(b"001000600000");
    bytes.extend_from_slice(b"245002000006");
    bytes.push(0x1E);
    bytes.extend_from_slice(b"12345");
    bytes.push(0x1E);
    bytes.extend_from_slice(b"10");
    bytes.push(0x1F);
    bytes.extend_from_slice(b"aTitle");
    bytes.push(0x1F);
    bytes.extend_from_slice(b"bSubtitle");
    bytes.push(0x1E);
    bytes.push(0x1D);
    bytes
}

/// Sequential text for `count` records, each with an 001, a 245 and a 650.
pub fn generate_sequential(count: usize) -> String {
    let mut text = String::new();
    for n in 1..=count {
        text.push_str(&format!("{n:09} LDR   L {TEST_LEADER_LINE}\n"));
        text.push_str(&format!("{n:09} 001   L {n:09}\n"));
        text.push_str(&format!("{n:09} 24510 L $$aTitle {n}$$cAuthor {n}\n"));
        text.push_str(&format!("{n:09} 650 0 L $$aSubject$$xNumber {n}\n"));
    }
    text
}

/// Write `contents` to `name` inside `dir`.
pub fn write_input(dir: &Path, name: &str, contents: impl AsRef<[u8]>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test input");
    path
}

/// Decode every record of an ISO 2709 file.
pub fn read_iso2709(path: &Path) -> Vec<Record> {
    let bytes = std::fs::read(path).expect("read output");
    let mut reader = MarcReader::new(Cursor::new(bytes));
    std::iter::from_fn(|| reader.read_record().expect("valid ISO 2709"))
        .collect()
}

/// Split concatenated ISO 2709 records on the record terminator.
pub fn split_records(bytes: &[u8]) -> Vec<&[u8]> {
    bytes
        .split_inclusive(|&b| b == 0x1D)
        .collect()
}
