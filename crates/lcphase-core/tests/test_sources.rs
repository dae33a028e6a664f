#[allow(dead_code)]
mod common;

use std::time::Duration;

use approx::assert_abs_diff_eq;
use tempfile::TempDir;

use lcphase_core::error::LcPhaseError;
use lcphase_core::frame::Frame;
use lcphase_core::io::image_seq::{list_image_files, ImageSequenceSource};
use lcphase_core::io::ser::{SerFrameSource, SerReader};
use lcphase_core::io::source::{sampled_len, FrameSource, PrefetchSource, SourceEvent, VecFrameSource};
use lcphase_core::io::open_source;

const WAIT: Duration = Duration::from_secs(5);

fn next_frame(source: &mut dyn FrameSource) -> Frame {
    match source.next_frame(WAIT).unwrap() {
        SourceEvent::Frame(f) => f,
        other => panic!("expected a frame, got {other:?}"),
    }
}

fn is_end(source: &mut dyn FrameSource) -> bool {
    matches!(source.next_frame(WAIT).unwrap(), SourceEvent::EndOfStream)
}

// ---------------------------------------------------------------------------
// VecFrameSource
// ---------------------------------------------------------------------------

#[test]
fn test_sampled_len() {
    assert_eq!(sampled_len(0, 30), 0);
    assert_eq!(sampled_len(1, 30), 1);
    assert_eq!(sampled_len(30, 30), 1);
    assert_eq!(sampled_len(31, 30), 2);
    assert_eq!(sampled_len(5, 0), 5);
}

#[test]
fn test_vec_source_applies_stride() {
    let frames: Vec<Frame> = (0..7).map(|i| Frame::uniform(4, 4, 10, i, i as f64)).collect();
    let mut source = VecFrameSource::with_stride(frames, 3);
    assert_eq!(source.estimated_len(), Some(3));
    assert_eq!(next_frame(&mut source).index, 0);
    assert_eq!(next_frame(&mut source).index, 3);
    assert_eq!(source.estimated_len(), Some(1));
    assert_eq!(next_frame(&mut source).index, 6);
    assert!(is_end(&mut source));
    assert!(is_end(&mut source));
}

// ---------------------------------------------------------------------------
// SER
// ---------------------------------------------------------------------------

fn mono_frames(w: usize, h: usize, n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| vec![(i * 40) as u8; w * h]).collect()
}

#[test]
fn test_ser_header_parsed() {
    let data = common::build_mono_ser(6, 4, &mono_frames(6, 4, 3));
    let file = common::write_temp_file(&data);
    let reader = SerReader::open(file.path()).unwrap();
    assert_eq!(reader.header.width, 6);
    assert_eq!(reader.header.height, 4);
    assert_eq!(reader.frame_count(), 3);
    assert_eq!(reader.header.observer, "lab-one");
    assert_eq!(reader.header.color_name(), "Mono");
    assert!(!reader.has_timestamps());
}

#[test]
fn test_ser_mono_to_rgb() {
    let data = common::build_mono_ser(3, 2, &mono_frames(3, 2, 2));
    let file = common::write_temp_file(&data);
    let reader = SerReader::open(file.path()).unwrap();
    let frame = reader.read_frame(1, 0.5).unwrap();
    assert_eq!((frame.width, frame.height), (3, 2));
    assert_eq!(frame.pixels.len(), 18);
    assert!(frame.pixels.iter().all(|&v| v == 40));
    assert_eq!(frame.grayscale().unwrap()[[1, 2]], 40);
}

#[test]
fn test_ser_source_stride_and_fps_timestamps() {
    let data = common::build_mono_ser(4, 4, &mono_frames(4, 4, 5));
    let file = common::write_temp_file(&data);
    let mut source = SerFrameSource::open(file.path(), 2, 10.0).unwrap();
    assert_eq!(source.estimated_len(), Some(3));

    let f0 = next_frame(&mut source);
    let f2 = next_frame(&mut source);
    let f4 = next_frame(&mut source);
    assert_eq!((f0.index, f2.index, f4.index), (0, 2, 4));
    assert_abs_diff_eq!(f2.timestamp_seconds, 0.2);
    assert_abs_diff_eq!(f4.timestamp_seconds, 0.4);
    assert!(is_end(&mut source));
}

#[test]
fn test_ser_trailer_timestamps() {
    let mut data = common::build_mono_ser(2, 2, &mono_frames(2, 2, 3));
    let base = 638_000_000_000_000_000u64;
    common::append_timestamps(&mut data, &[base, base + 20_000_000, base + 45_000_000]);
    let file = common::write_temp_file(&data);
    let reader = SerReader::open(file.path()).unwrap();
    assert!(reader.has_timestamps());
    assert_abs_diff_eq!(reader.timestamp_seconds(0, 30.0), 0.0);
    assert_abs_diff_eq!(reader.timestamp_seconds(1, 30.0), 2.0);
    assert_abs_diff_eq!(reader.timestamp_seconds(2, 30.0), 4.5);
}

#[test]
fn test_ser_bgr_swapped_to_rgb() {
    let mut data = common::build_ser_header(1, 1, 8, 1, 101);
    data.extend_from_slice(&[10, 20, 30]);
    let file = common::write_temp_file(&data);
    let reader = SerReader::open(file.path()).unwrap();
    let frame = reader.read_frame(0, 0.0).unwrap();
    assert_eq!(frame.pixels, vec![30, 20, 10]);
}

#[test]
fn test_ser_sixteen_bit_scaled() {
    let mut data = common::build_ser_header(2, 1, 16, 1, 0);
    data.extend_from_slice(&65535u16.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    let file = common::write_temp_file(&data);
    let reader = SerReader::open(file.path()).unwrap();
    let frame = reader.read_frame(0, 0.0).unwrap();
    assert_eq!(frame.pixels, vec![255, 255, 255, 0, 0, 0]);
}

#[test]
fn test_ser_rejects_bad_magic_and_truncation() {
    let mut data = common::build_mono_ser(4, 4, &mono_frames(4, 4, 2));
    data[0] = b'X';
    let file = common::write_temp_file(&data);
    assert!(matches!(SerReader::open(file.path()), Err(LcPhaseError::InvalidSer(_))));

    let mut data = common::build_mono_ser(4, 4, &mono_frames(4, 4, 2));
    data.truncate(data.len() - 3);
    let file = common::write_temp_file(&data);
    assert!(matches!(SerReader::open(file.path()), Err(LcPhaseError::InvalidSer(_))));
}

#[test]
fn test_ser_rejects_oversized_header() {
    // Width * height * 6 bytes does not fit in usize.
    let data = common::build_ser_header(i32::MAX as u32, i32::MAX as u32, 16, 1, 100);
    let file = common::write_temp_file(&data);
    match SerReader::open(file.path()) {
        Err(LcPhaseError::InvalidSer(msg)) => assert!(msg.contains("overflow")),
        Err(other) => panic!("expected InvalidSer, got {other:?}"),
        Ok(_) => panic!("oversized header accepted"),
    }

    // Representable, but far larger than the file.
    let data = common::build_ser_header(65_536, 65_536, 16, 1_000, 0);
    let file = common::write_temp_file(&data);
    assert!(matches!(SerReader::open(file.path()), Err(LcPhaseError::InvalidSer(_))));
}

#[test]
fn test_ser_frame_out_of_range() {
    let data = common::build_mono_ser(2, 2, &mono_frames(2, 2, 1));
    let file = common::write_temp_file(&data);
    let reader = SerReader::open(file.path()).unwrap();
    assert!(matches!(
        reader.read_frame(5, 0.0),
        Err(LcPhaseError::FrameIndexOutOfRange { index: 5, total: 1 })
    ));
}

// ---------------------------------------------------------------------------
// Image sequence
// ---------------------------------------------------------------------------

fn write_sequence(dir: &std::path::Path, levels: &[u8]) {
    for (i, &level) in levels.iter().enumerate() {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([level, level, level]));
        img.save(dir.join(format!("frame_{i:03}.png"))).unwrap();
    }
}

#[test]
fn test_image_sequence_sorted_and_filtered() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &[10, 20, 30]);
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    let files = list_image_files(dir.path()).unwrap();
    assert_eq!(files.len(), 3);
    assert!(files[0].ends_with("frame_000.png"));
    assert!(files[2].ends_with("frame_002.png"));
}

#[test]
fn test_image_sequence_source_frames() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &[10, 20, 30, 40]);
    let mut source = ImageSequenceSource::open(dir.path(), 2, 4.0).unwrap();
    let info = source.source_info(dir.path()).unwrap();
    assert_eq!((info.width, info.height, info.total_frames), (8, 6, 4));

    let a = next_frame(&mut source);
    let b = next_frame(&mut source);
    assert_eq!((a.index, b.index), (0, 2));
    assert_eq!(b.grayscale().unwrap()[[0, 0]], 30);
    assert_abs_diff_eq!(b.timestamp_seconds, 0.5);
    assert!(is_end(&mut source));
}

#[test]
fn test_image_sequence_unreadable_file() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &[10]);
    std::fs::write(dir.path().join("frame_001.png"), b"garbage").unwrap();
    let mut source = ImageSequenceSource::open(dir.path(), 1, 30.0).unwrap();

    next_frame(&mut source);
    match source.next_frame(WAIT).unwrap() {
        SourceEvent::Unreadable { index, .. } => assert_eq!(index, 1),
        other => panic!("expected Unreadable, got {other:?}"),
    }
}

#[test]
fn test_empty_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        ImageSequenceSource::open(dir.path(), 1, 30.0),
        Err(LcPhaseError::Source(_))
    ));
}

#[test]
fn test_open_source_dispatches_on_path() {
    let dir = TempDir::new().unwrap();
    write_sequence(dir.path(), &[10, 20]);
    let (mut source, info) = open_source(dir.path(), 1, 30.0).unwrap();
    assert_eq!(info.total_frames, 2);
    assert_eq!(next_frame(&mut source).index, 0);

    let data = common::build_mono_ser(4, 4, &mono_frames(4, 4, 3));
    let file = common::write_temp_file(&data);
    let (_, info) = open_source(file.path(), 1, 30.0).unwrap();
    assert_eq!(info.total_frames, 3);
}

// ---------------------------------------------------------------------------
// PrefetchSource
// ---------------------------------------------------------------------------

#[test]
fn test_prefetch_delivers_in_order() {
    let frames: Vec<Frame> = (0..5).map(|i| Frame::uniform(4, 4, 10, i, i as f64)).collect();
    let mut source = PrefetchSource::spawn(VecFrameSource::new(frames)).unwrap();
    for i in 0..5 {
        assert_eq!(next_frame(&mut source).index, i);
    }
    assert!(is_end(&mut source));
    assert!(is_end(&mut source));
}

#[test]
fn test_prefetch_times_out_and_discards_late_frame() {
    let slow = common::SlowSource::new(3, Duration::from_millis(200));
    let mut source = PrefetchSource::spawn(slow).unwrap();

    assert!(matches!(
        source.next_frame(Duration::from_millis(10)).unwrap(),
        SourceEvent::TimedOut
    ));
    // Frame 0 arrives late and is dropped; the next delivered frame is 1.
    assert_eq!(next_frame(&mut source).index, 1);
    assert_eq!(next_frame(&mut source).index, 2);
    assert!(is_end(&mut source));
}

#[test]
fn test_prefetch_forwards_source_error() {
    let scripted = common::ScriptedSource::new(vec![common::source_error("device lost")]);
    let mut source = PrefetchSource::spawn(scripted).unwrap();
    assert!(matches!(source.next_frame(WAIT), Err(LcPhaseError::Source(_))));
    assert!(is_end(&mut source));
}
