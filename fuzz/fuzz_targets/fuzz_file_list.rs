#![no_main]

use arbitrary::Arbitrary;
use gramdex::config::RawFile;
use gramdex::index::VirtualFileList;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Range {
    offset: u16,
    length: u8,
}

fuzz_target!(|ranges: Vec<Range>| {
    let files: Vec<RawFile> = ranges
        .iter()
        .enumerate()
        .map(|(i, r)| RawFile {
            name: format!("src{}", i),
            offset: r.offset as u64,
            length: r.length as u64,
        })
        .collect();

    let list = VirtualFileList::new(&files).unwrap();
    list.validate().unwrap();

    // Every offset resolves to the range containing it, nothing past the end does
    for offset in 0..list.total_length() {
        let (source, local) = list.resolve(offset).unwrap();
        assert!(source.virtual_offset <= offset && offset < source.virtual_end());
        assert_eq!(local, offset - source.virtual_offset);
    }
    assert!(list.resolve(list.total_length()).is_none());
});
