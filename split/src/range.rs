//! Compute the byte range owned by one worker.
//!
//! The raw range is a pure function of the total size, the worker count, the rank and
//! the alignment. Both ends are then moved forward to the next record start. Because the
//! end of rank `r` and the begin of rank `r + 1` start from the same raw offset and use
//! the same (pure) record detection, the two adjustments always agree.

use crate::{fs::FileSystem, index::FileIndex, record::Splitter, Error};
use std::{
    io::{Seek, SeekFrom},
    num::{NonZeroU32, NonZeroU64},
};
use tracing::debug;

/// A contiguous range `[begin, end)` of the virtual concatenation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    pub begin: u64,
    pub end: u64,

    /// Index of the file containing `begin`.
    pub first_file: usize,
    /// Index of the file containing `end` (equal to the number of files if `end` is the
    /// total size).
    pub last_file: usize,
}

impl Range {
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }
}

/// Return the raw `[begin, end)` of `rank` before record realignment.
///
/// The per-worker step is `ceil(total / workers)` rounded up to a multiple of `align`. The
/// ranges of all ranks are disjoint and cover `[0, total)`; ranks past the end of the data
/// get an empty range at `total`.
pub fn partition(total: u64, workers: NonZeroU32, rank: u32, align: NonZeroU64) -> (u64, u64) {
    let step = total.div_ceil(u64::from(workers.get()));
    let step = step.div_ceil(align.get()) * align.get();
    let begin = step.saturating_mul(u64::from(rank)).min(total);
    let end = step.saturating_mul(u64::from(rank) + 1).min(total);
    (begin, end)
}

/// Move `offset` forward to the next record start, unless it is already a file boundary.
fn realign<F: FileSystem, S: Splitter>(
    fs: &F,
    index: &FileIndex,
    splitter: &S,
    offset: u64,
) -> Result<u64, Error> {
    if index.is_boundary(offset) {
        return Ok(offset);
    }
    let file = index.locate(offset);
    let mut stream = fs.open_for_read(&index.file(file).path)?;
    stream.seek(SeekFrom::Start(offset - index.offset(file)))?;
    let skip = splitter.seek_record_begin(&mut stream)?;
    Ok(offset + skip)
}

/// Compute the realigned range of `rank`.
///
/// At most one stream is open at any time during realignment, and none remains open when
/// this returns.
pub fn compute<F: FileSystem, S: Splitter>(
    fs: &F,
    index: &FileIndex,
    splitter: &S,
    workers: NonZeroU32,
    rank: u32,
    align: NonZeroU64,
) -> Result<Range, Error> {
    if rank >= workers.get() {
        return Err(Error::InvalidRank {
            rank,
            workers: workers.get(),
        });
    }
    let total = index.total();
    let (raw_begin, raw_end) = partition(total, workers, rank, align);
    let (mut begin, mut end) = (raw_begin, raw_end);
    if begin != end {
        end = realign(fs, index, splitter, end)?;
        begin = realign(fs, index, splitter, begin)?;

        // A single record spanning the whole raw range belongs to an earlier rank.
        if begin >= end {
            begin = end;
        }
    }
    let range = Range {
        begin,
        end,
        first_file: index.locate(begin),
        last_file: index.locate(end),
    };
    debug!(
        rank,
        workers = workers.get(),
        raw_begin,
        raw_end,
        begin,
        end,
        "computed split range"
    );
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fs::memory,
        record::{Fixed, Line},
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use test_case::test_case;

    fn nz32(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn nz64(n: u64) -> NonZeroU64 {
        NonZeroU64::new(n).unwrap()
    }

    #[test]
    fn test_partition_three_files() {
        // 3 files of 400 bytes, 3 workers, aligned to 4 bytes.
        let ranges: Vec<_> = (0..3)
            .map(|rank| partition(1200, nz32(3), rank, nz64(4)))
            .collect();
        assert_eq!(ranges, vec![(0, 400), (400, 800), (800, 1200)]);
    }

    #[test]
    fn test_partition_rounds_step_to_alignment() {
        // ceil(1000 / 4) = 250, rounded up to 256.
        let ranges: Vec<_> = (0..4)
            .map(|rank| partition(1000, nz32(4), rank, nz64(8)))
            .collect();
        assert_eq!(ranges, vec![(0, 256), (256, 512), (512, 768), (768, 1000)]);
    }

    #[test_case(0, 1, 1; "empty input")]
    #[test_case(10, 20, 1; "more workers than bytes")]
    #[test_case(1000, 3, 7; "uneven step")]
    #[test_case(4096, 7, 64; "aligned step")]
    #[test_case(u64::MAX / 2, 5, 1; "large total")]
    fn test_partition_covers_total(total: u64, workers: u32, align: u64) {
        let mut next = 0;
        for rank in 0..workers {
            let (begin, end) = partition(total, nz32(workers), rank, nz64(align));
            assert_eq!(begin, next.min(total));
            assert!(begin <= end);
            next = end;
        }
        assert_eq!(next, total);
    }

    #[test]
    fn test_records_matching_files_do_not_move() {
        let fs = memory::FileSystem::default();
        for name in ["a", "b", "c"] {
            fs.insert(name, vec![b'x'; 400]);
        }
        let index = FileIndex::init(&fs, "a;b;c", nz64(4)).unwrap();
        for rank in 0..3 {
            let range = compute(&fs, &index, &Fixed::new(nz64(100)), nz32(3), rank, nz64(4))
                .unwrap();
            assert_eq!(range.begin, 400 * u64::from(rank));
            assert_eq!(range.end, 400 * (u64::from(rank) + 1));
            assert_eq!(range.first_file, rank as usize);
            assert_eq!(range.last_file, rank as usize + 1);
        }
        assert_eq!(fs.open_streams(), 0);
    }

    #[test]
    fn test_line_realignment() {
        let fs = memory::FileSystem::default();
        // Lines: [0, 6) [6, 16) [16, 20)
        fs.insert("a", b"hello\nwonderful\nend\n".to_vec());
        let index = FileIndex::init(&fs, "a", nz64(1)).unwrap();

        // Raw ranges are [0, 10) and [10, 20). Offset 10 is inside the second line, so
        // the boundary moves to 16.
        let first = compute(&fs, &index, &Line, nz32(2), 0, nz64(1)).unwrap();
        let second = compute(&fs, &index, &Line, nz32(2), 1, nz64(1)).unwrap();
        assert_eq!((first.begin, first.end), (0, 16));
        assert_eq!((second.begin, second.end), (16, 20));
    }

    #[test]
    fn test_record_spanning_whole_range_is_empty() {
        let fs = memory::FileSystem::default();
        let mut content = vec![b'x'; 99];
        content.push(b'\n');
        fs.insert("a", content);
        let index = FileIndex::init(&fs, "a", nz64(1)).unwrap();

        let ranges: Vec<_> = (0..4)
            .map(|rank| compute(&fs, &index, &Line, nz32(4), rank, nz64(1)).unwrap())
            .collect();
        assert_eq!((ranges[0].begin, ranges[0].end), (0, 100));
        for range in &ranges[1..] {
            assert!(range.is_empty());
            assert_eq!(range.end, 100);
        }
    }

    #[test]
    fn test_invalid_rank() {
        let fs = memory::FileSystem::default();
        fs.insert("a", vec![0u8; 8]);
        let index = FileIndex::init(&fs, "a", nz64(1)).unwrap();
        assert!(matches!(
            compute(&fs, &index, &Line, nz32(2), 2, nz64(1)),
            Err(Error::InvalidRank {
                rank: 2,
                workers: 2
            })
        ));
    }

    #[test]
    fn test_ranges_tile_random_lines() {
        let mut rng = StdRng::seed_from_u64(7);
        let fs = memory::FileSystem::default();
        let mut names = Vec::new();
        for i in 0..5 {
            let mut content = Vec::new();
            for _ in 0..rng.gen_range(1..40) {
                let len = rng.gen_range(0..50);
                content.extend((0..len).map(|_| rng.gen_range(b'a'..=b'z')));
                content.push(b'\n');
            }
            let name = format!("f{i}");
            fs.insert(&name, content);
            names.push(name);
        }
        let uri = names.join(";");
        let index = FileIndex::init(&fs, &uri, nz64(1)).unwrap();

        for workers in 1..=16 {
            let mut next = 0;
            for rank in 0..workers {
                let range = compute(&fs, &index, &Line, nz32(workers), rank, nz64(1)).unwrap();
                assert_eq!(range.begin, next, "workers={workers} rank={rank}");
                assert!(range.begin <= range.end);
                next = range.end;
            }
            assert_eq!(next, index.total(), "workers={workers}");
        }
        assert_eq!(fs.open_streams(), 0);
    }
}
