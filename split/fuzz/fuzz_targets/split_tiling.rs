#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::num::{NonZeroU32, NonZeroUsize};
use strata_split::{fs::memory, record::Line, Config, Split};

const MAX_FILES: usize = 8;
const MAX_WORKERS: u32 = 32;

#[derive(Debug)]
struct FuzzInput {
    files: Vec<Vec<u8>>,
    workers: u32,
    chunk_size: usize,
}

impl<'a> Arbitrary<'a> for FuzzInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let num_files = u.int_in_range(0..=MAX_FILES)?;
        let files = (0..num_files)
            .map(|_| u.arbitrary())
            .collect::<Result<Vec<Vec<u8>>, _>>()?;
        let workers = u.int_in_range(1..=MAX_WORKERS)?;
        let chunk_size = u.int_in_range(1..=512)?;
        Ok(FuzzInput {
            files,
            workers,
            chunk_size,
        })
    }
}

fn fuzz(input: FuzzInput) {
    let fs = memory::FileSystem::default();
    let mut names = Vec::new();
    for (i, content) in input.files.iter().enumerate() {
        let name = format!("in/{i}");
        fs.insert(&name, content.clone());
        names.push(name);
    }
    let uri = names.join(";");
    let workers = NonZeroU32::new(input.workers).unwrap();

    // Every byte must be delivered exactly once, in order, across all ranks.
    let mut next = 0;
    let mut out = Vec::new();
    for rank in 0..input.workers {
        let mut cfg = Config::new(uri.clone(), rank, workers);
        cfg.chunk_size = NonZeroUsize::new(input.chunk_size).unwrap();
        let mut split = Split::init(&fs, Line, cfg).unwrap();
        let range = split.range();
        assert_eq!(range.begin, next);
        next = range.end;

        let mut delivered = 0;
        while let Some(chunk) = split.next_chunk().unwrap() {
            assert!(!chunk.is_empty());
            delivered += chunk.len() as u64;
            out.extend_from_slice(chunk);
        }
        assert_eq!(delivered, range.len());
        assert_eq!(fs.open_streams(), 1.min(range.len() as usize));
    }
    assert_eq!(out, input.files.concat());
    assert_eq!(fs.open_streams(), 0);
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
