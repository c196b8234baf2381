use idx_reader::{
    render, AllocationSource, DecodeStage, ElementType, IdxError, IdxFile, OpenOutcome,
    ResilientAllocator, SystemSource, DEFAULT_RETRIES,
};
use std::cell::Cell;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

const UBYTE: u8 = 0x08;
const SHORT: u8 = 0x0B;
const INT: u8 = 0x0C;
const DOUBLE: u8 = 0x0E;

/// Lays out an IDX file: magic, big-endian dimensions, then the payload as given.
fn encode(type_code: u8, dimensions: &[u32], payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0, 0, type_code, dimensions.len() as u8];
    for size in dimensions {
        bytes.extend_from_slice(&size.to_be_bytes());
    }
    bytes.extend_from_slice(payload);
    bytes
}

fn fixture_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_TARGET_TMPDIR"));
    p.push(name);
    p
}

/// Source names are kept to their first 127 characters.
fn expected_name(path: &Path) -> String {
    path.to_string_lossy().chars().take(127).collect()
}

fn decode(bytes: &[u8]) -> OpenOutcome {
    IdxFile::decode(&mut Cursor::new(bytes), "memory")
}

fn ready(bytes: &[u8]) -> IdxFile {
    match decode(bytes) {
        OpenOutcome::Ready(file) => file,
        OpenOutcome::Failed { error, .. } => panic!("decode failed: {}", error),
    }
}

fn failed(bytes: &[u8]) -> (idx_reader::PartialIdxFile, IdxError) {
    match decode(bytes) {
        OpenOutcome::Failed { partial, error } => (partial, error),
        OpenOutcome::Ready(file) => panic!("unexpected success: {:?}", file.dimensions()),
    }
}

/// Declines a fixed number of allocations, then delegates to the system.
struct FlakySource {
    failures_left: Cell<u32>,
}

impl AllocationSource for &FlakySource {
    fn try_zeroed<T: Copy + Default>(&self, len: usize) -> Option<Vec<T>> {
        let left = self.failures_left.get();
        if left > 0 {
            self.failures_left.set(left - 1);
            return None;
        }
        SystemSource.try_zeroed(len)
    }
}

#[test]
fn image_set_elements_follow_reversed_axes() {
    // 3 samples of 2 rows x 4 columns
    let payload: Vec<u8> = (0..24).collect();
    let file = ready(&encode(UBYTE, &[3, 2, 4], &payload));

    assert_eq!(file.element_type(), ElementType::UnsignedByte);
    assert_eq!(file.element_width(), 1);
    assert_eq!(file.rank(), 3);
    assert_eq!(file.dimensions(), &[3, 2, 4]);
    assert_eq!(file.element_count(), 24);
    assert_eq!(file.header().magic, 0x0000_0803);

    for k in 0..3 {
        for y in 0..2 {
            for x in 0..4 {
                let expected = (k * 8 + y * 4 + x) as u8;
                assert_eq!(file.element_at(&[x, y, k]).unwrap(), vec![expected]);
                assert_eq!(file.offset_of(&[x, y, k]).unwrap(), expected as usize);
            }
        }
    }
}

#[test]
fn mnist_shaped_offsets() {
    let file = ready(&encode(UBYTE, &[2, 28, 28], &vec![0u8; 2 * 784]));
    assert_eq!(file.offset_of(&[0, 0, 0]).unwrap(), 0);
    assert_eq!(file.offset_of(&[27, 27, 1]).unwrap(), 1567);
}

#[test]
fn open_reads_from_disk() {
    let path = fixture_path("labels.idx1-ubyte");
    fs::write(&path, encode(UBYTE, &[5], &[7, 2, 1, 0, 4])).expect("write fixture");

    let outcome = IdxFile::open(&path);
    assert!(!outcome.corrupted());
    assert_eq!(outcome.stage(), DecodeStage::PayloadLoaded);
    assert!(outcome.error().is_none());
    assert_eq!(outcome.ready().map(IdxFile::element_count), Some(5));
    let file = outcome.into_result().expect("ready file");

    assert_eq!(file.source_name(), expected_name(&path));
    assert_eq!(file.payload(), &[7, 2, 1, 0, 4]);
    assert_eq!(render::label_of(&file, 2).unwrap(), 1);

    let summary = file.to_string();
    assert!(summary.contains("Corrupted:  no"), "{}", summary);
    assert!(summary.contains("0x00000801 (2049)"), "{}", summary);
    assert!(summary.contains("dim[0]:   5"), "{}", summary);
    file.release();
}

#[test]
fn missing_file_is_reported_not_refused() {
    let path = fixture_path("does-not-exist.idx");
    let outcome = IdxFile::open(&path);
    assert!(outcome.corrupted());
    assert_eq!(outcome.stage(), DecodeStage::Start);
    assert!(matches!(outcome.error(), Some(IdxError::FileUnavailable { .. })));
    assert!(outcome.ready().is_none());
    match &outcome {
        OpenOutcome::Failed { partial, .. } => {
            assert_eq!(partial.source_name, expected_name(&path));
            assert_eq!(partial.magic, None);
        }
        OpenOutcome::Ready(_) => unreachable!(),
    }
    outcome.release();
}

#[test]
fn truncated_header() {
    let (partial, error) = failed(&[0, 0, UBYTE]);
    assert!(matches!(error, IdxError::TruncatedHeader { found: 3 }), "{:?}", error);
    assert_eq!(partial.rank, 0);
    assert_eq!(partial.stage, DecodeStage::Start);
    assert!(partial.to_string().contains("Corrupted:  yes"));
}

#[test]
fn unsupported_type_fails_before_payload() {
    let (partial, error) = failed(&encode(0x0A, &[2], &[1, 2]));
    assert!(matches!(error, IdxError::UnsupportedType(0x0A)), "{:?}", error);
    assert_eq!(partial.type_code, Some(0x0A));
    assert_eq!(partial.rank, 1);
    assert!(partial.dimensions.is_empty());
    assert!(partial.payload.is_empty());
}

#[test]
fn truncated_dimensions_keep_prefix() {
    let mut bytes = encode(UBYTE, &[4, 5], &[]);
    bytes[3] = 3;
    let (partial, error) = failed(&bytes);
    match error {
        IdxError::TruncatedDimensions { expected, found } => assert_eq!((expected, found), (3, 2)),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(partial.stage, DecodeStage::HeaderParsed);
    assert_eq!(partial.dimensions, vec![4, 5]);
    assert_eq!(partial.element_count, 20);
}

#[test]
fn truncated_payload_reports_count_read() {
    let (partial, error) = failed(&encode(INT, &[2, 2], &[9u8; 10]));
    match error {
        IdxError::TruncatedPayload { expected, found } => assert_eq!((expected, found), (16, 10)),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(partial.stage, DecodeStage::DimensionsParsed);
    assert_eq!(partial.payload.len(), 16);
    assert_eq!(&partial.payload[..10], &[9u8; 10]);
    assert_eq!(&partial.payload[10..], &[0u8; 6]);
}

#[test]
fn wide_elements_are_sized_by_width() {
    // 2 x 3 shorts, stored big-endian and returned untouched
    let values: [u16; 6] = [1, 2, 3, 0x0102, 0xFFFF, 300];
    let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    let file = ready(&encode(SHORT, &[2, 3], &payload));

    assert_eq!(file.payload().len(), 12);
    assert_eq!(file.element_at(&[0, 1]).unwrap(), 0x0102u16.to_be_bytes());
    assert_eq!(file.element_at(&[2, 1]).unwrap(), 300u16.to_be_bytes());
    assert_eq!(file.element_slice(&[1, 0]).unwrap(), &2u16.to_be_bytes());

    let doubles: Vec<u8> = [1.5f64, -2.25].iter().flat_map(|v| v.to_be_bytes()).collect();
    let file = ready(&encode(DOUBLE, &[2], &doubles));
    let bytes = file.element_at(&[1]).unwrap();
    assert_eq!(f64::from_be_bytes(bytes.try_into().unwrap()), -2.25);
}

#[test]
fn dimensions_survive_decoding() {
    let cases: [&[u32]; 5] = [&[], &[7], &[3, 1], &[2, 3, 4], &[1, 2, 1, 3]];
    for dims in cases {
        let count: u32 = dims.iter().product();
        let file = ready(&encode(UBYTE, dims, &vec![0u8; count as usize]));
        assert_eq!(file.rank(), dims.len());
        assert_eq!(file.dimensions(), dims);
        assert_eq!(file.element_count(), u64::from(count));
    }
}

#[test]
fn rank_zero_holds_one_element() {
    let file = ready(&encode(INT, &[], &[0xDE, 0xAD, 0xBE, 0xEF]));
    assert_eq!(file.element_count(), 1);
    assert_eq!(file.element_at(&[]).unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn index_length_must_match_rank() {
    for rank in 0..=8usize {
        let dims = vec![1u32; rank];
        let file = ready(&encode(UBYTE, &dims, &[42]));
        assert_eq!(file.element_at(&vec![0; rank]).unwrap(), vec![42]);

        for len in (0..=9usize).filter(|&len| len != rank) {
            match file.element_at(&vec![0; len]) {
                Err(IdxError::InvalidIndex { expected, found }) => assert_eq!((expected, found), (rank, len)),
                other => panic!("rank {} len {}: {:?}", rank, len, other),
            }
        }
    }
}

#[test]
fn out_of_range_components_are_rejected() {
    let file = ready(&encode(UBYTE, &[2, 3], &[0u8; 6]));
    match file.element_at(&[3, 0]) {
        Err(IdxError::IndexOutOfBounds { axis, index, size }) => assert_eq!((axis, index, size), (0, 3, 3)),
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(file.element_at(&[0, 2]), Err(IdxError::IndexOutOfBounds { axis: 1, .. })));
}

#[test]
fn element_count_overflow_is_caught() {
    let (partial, error) = failed(&encode(UBYTE, &[u32::MAX, u32::MAX, u32::MAX], &[]));
    assert!(matches!(error, IdxError::ElementCountOverflow), "{:?}", error);
    assert_eq!(partial.dimensions.len(), 3);
    assert_eq!(partial.element_count, u64::from(u32::MAX) * u64::from(u32::MAX));
}

#[test]
fn allocation_retries_then_fails() {
    let bytes = encode(UBYTE, &[2], &[1, 2]);

    let source = FlakySource { failures_left: Cell::new(DEFAULT_RETRIES) };
    let allocator = ResilientAllocator::new(&source, DEFAULT_RETRIES);
    let outcome = IdxFile::decode_with(&mut Cursor::new(&bytes), "flaky", &allocator);
    assert!(!outcome.corrupted());

    let source = FlakySource { failures_left: Cell::new(u32::MAX) };
    let allocator = ResilientAllocator::new(&source, DEFAULT_RETRIES);
    let outcome = IdxFile::decode_with(&mut Cursor::new(&bytes), "exhausted", &allocator);
    assert_eq!(outcome.stage(), DecodeStage::HeaderParsed);
    match outcome.error() {
        Some(IdxError::AllocationFailure { attempts, .. }) => assert_eq!(*attempts, DEFAULT_RETRIES + 1),
        other => panic!("unexpected {:?}", other),
    }
}

/// Grants a fixed number of allocations, then declines every later one.
struct GrantingSource {
    grants_left: Cell<u32>,
}

impl AllocationSource for &GrantingSource {
    fn try_zeroed<T: Copy + Default>(&self, len: usize) -> Option<Vec<T>> {
        let left = self.grants_left.get();
        if left == 0 {
            return None;
        }
        self.grants_left.set(left - 1);
        SystemSource.try_zeroed(len)
    }
}

#[test]
fn payload_allocation_failure_keeps_dimensions() {
    let bytes = encode(UBYTE, &[2], &[1, 2]);
    let source = GrantingSource { grants_left: Cell::new(1) };
    let allocator = ResilientAllocator::new(&source, DEFAULT_RETRIES);

    match IdxFile::decode_with(&mut Cursor::new(&bytes), "payload", &allocator) {
        OpenOutcome::Failed { partial, error } => {
            assert_eq!(partial.stage, DecodeStage::DimensionsParsed);
            assert_eq!(partial.dimensions, vec![2]);
            assert_eq!(partial.element_count, 2);
            assert!(partial.payload.is_empty());
            match error {
                IdxError::AllocationFailure { size, attempts } => assert_eq!((size, attempts), (2, 9)),
                other => panic!("unexpected error {:?}", other),
            }
        }
        OpenOutcome::Ready(_) => panic!("payload allocation should have failed"),
    }
}

#[test]
fn dimension_allocation_failure_seeds_element_count() {
    let bytes = encode(UBYTE, &[2], &[1, 2]);
    let source = GrantingSource { grants_left: Cell::new(0) };
    let allocator = ResilientAllocator::new(&source, DEFAULT_RETRIES);

    match IdxFile::decode_with(&mut Cursor::new(&bytes), "dimensions", &allocator) {
        OpenOutcome::Failed { partial, error } => {
            assert!(matches!(error, IdxError::AllocationFailure { .. }), "{:?}", error);
            assert_eq!(partial.stage, DecodeStage::HeaderParsed);
            assert!(partial.dimensions.is_empty());
            assert_eq!(partial.element_count, 1);
        }
        OpenOutcome::Ready(_) => panic!("dimension allocation should have failed"),
    }
}

#[test]
fn empty_outer_axis_reports_out_of_bounds() {
    let file = ready(&encode(DOUBLE, &[0, u32::MAX, u32::MAX], &[]));
    assert_eq!(file.element_count(), 0);
    match file.element_at(&[1, 1, 0]) {
        Err(IdxError::IndexOutOfBounds { axis, index, size }) => assert_eq!((axis, index, size), (2, 0, 0)),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn element_copy_uses_given_allocator() {
    let file = ready(&encode(UBYTE, &[2], &[5, 6]));
    let source = FlakySource { failures_left: Cell::new(u32::MAX) };
    let allocator = ResilientAllocator::new(&source, 2);
    assert!(matches!(
        file.element_at_with(&[1], &allocator),
        Err(IdxError::AllocationFailure { size: 1, attempts: 3 })
    ));
}

#[test]
fn renders_samples_with_palette() {
    let payload = [0, 255, 128, 51, 204, 0, 255, 255, 255, 255, 255, 255];
    let file = ready(&encode(UBYTE, &[2, 2, 3], &payload));
    assert_eq!(render::render_sample(&file, 0).unwrap(), " @-\n.# \n");
    assert_eq!(render::render_sample(&file, 1).unwrap(), "@@@\n@@@\n");
    assert!(matches!(
        render::render_sample(&file, 2),
        Err(IdxError::IndexOutOfBounds { axis: 2, .. })
    ));

    let labels = ready(&encode(UBYTE, &[2], &[3, 9]));
    assert!(matches!(render::render_sample(&labels, 0), Err(IdxError::Render(_))));
    let wide = ready(&encode(SHORT, &[1, 1, 1], &[0, 0]));
    assert!(matches!(render::render_sample(&wide, 0), Err(IdxError::Render(_))));
}

#[test]
fn concurrent_reads_share_a_ready_file() {
    let payload: Vec<u8> = (0..=255).collect();
    let file = ready(&encode(UBYTE, &[16, 16], &payload));
    std::thread::scope(|scope| {
        for row in 0..4usize {
            let file = &file;
            scope.spawn(move || {
                for column in 0..16 {
                    let expected = (row * 16 + column) as u8;
                    assert_eq!(file.element_at(&[column, row]).unwrap(), vec![expected]);
                }
            });
        }
    });
}
