#![no_main]

use arbitrary::Arbitrary;
use gramdex::config::RawFile;
use gramdex::index::{MemoryStorage, PrefixDoublingProvider, StreamAssembler, SuffixArrayProvider, VirtualFileList, PAD};
use gramdex::index::suffix_sort::find_fault;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    data: Vec<u8>,
    ranges: Vec<(u8, u8)>,
}

fuzz_target!(|input: Input| {
    let storage = MemoryStorage::new().with("data", input.data.clone());
    let files: Vec<RawFile> = input
        .ranges
        .iter()
        .map(|&(offset, length)| RawFile {
            name: "data".to_string(),
            offset: offset as u64,
            length: length as u64,
        })
        .collect();
    let list = VirtualFileList::new(&files).unwrap();

    let in_bounds = files
        .iter()
        .all(|f| f.length == 0 || (f.offset + f.length) as usize <= input.data.len());

    match StreamAssembler::new(&storage).assemble(&list) {
        Ok(buffer) => {
            assert!(in_bounds);
            assert_eq!(buffer.len() as u64, list.total_length());
            assert!(buffer.padded()[buffer.len()..].iter().all(|&b| b == 0));
            assert_eq!(buffer.padded().len(), buffer.len() + PAD);

            let sa = PrefixDoublingProvider.build(buffer.text()).unwrap();
            assert_eq!(find_fault(buffer.text(), sa), None);
        }
        Err(_) => assert!(!in_bounds),
    }
});
