//! End-to-end tests: write shards, load them back, check order and errors.

use ndarray::{Array1, Array3};
use tempfile::tempdir;

use crate::config::ShardConfig;
use crate::dataset::loader::{load_dir, load_shards, load_shards_with, LoaderOptions};
use crate::error::{RegShardError, Result};
use crate::shard::writer::write_shards;
use crate::types::{Sample, SampleShapes};

fn test_shapes() -> SampleShapes {
    SampleShapes {
        moving_image: [2, 3, 4],
        fixed_image: [2, 2, 2],
        num_indices: 3,
    }
}

fn test_sample(seed: usize) -> Sample {
    let shapes = test_shapes();
    let [m0, m1, m2] = shapes.moving_image;
    let [f0, f1, f2] = shapes.fixed_image;
    let fill = seed as f32;
    Sample {
        moving_image: Array3::from_shape_fn((m0, m1, m2), |(i, j, k)| {
            fill * 1000.0 + (i * 100 + j * 10 + k) as f32
        }),
        fixed_image: Array3::from_elem((f0, f1, f2), fill + 0.25),
        moving_label: Array3::from_elem((m0, m1, m2), fill + 0.5),
        fixed_label: Array3::from_elem((f0, f1, f2), fill + 0.75),
        indices: Array1::from_vec(vec![fill, fill + 1.0, fill + 2.0]),
    }
}

fn capacity(examples_per_shard: usize) -> ShardConfig {
    ShardConfig {
        examples_per_shard,
        ..ShardConfig::default()
    }
}

#[test]
fn test_five_samples_capacity_two_roundtrip_in_order() {
    crate::enable_verbose_logging(None);
    let dir = tempdir().unwrap();
    let originals: Vec<Sample> = (0..5).map(test_sample).collect();

    let shards = write_shards(dir.path(), originals.clone(), &capacity(2)).unwrap();
    assert_eq!(shards, 3);

    let paths: Vec<_> = (0..3)
        .map(|idx| dir.path().join(format!("{}.tfrecords", idx)))
        .collect();
    let loaded: Vec<Sample> = load_shards(paths, test_shapes())
        .collect::<Result<Vec<_>>>()
        .unwrap();

    assert_eq!(loaded, originals);
}

#[test]
fn test_load_dir_orders_shards_numerically() {
    let dir = tempdir().unwrap();
    // Twenty-one samples at capacity 2 produce shards 0 through 10, so a
    // lexicographic walk would put 10.tfrecords before 2.tfrecords.
    let originals: Vec<Sample> = (0..21).map(test_sample).collect();
    let shards = write_shards(dir.path(), originals.clone(), &capacity(2)).unwrap();
    assert_eq!(shards, 11);

    let loaded: Vec<Sample> = load_dir(dir.path(), test_shapes())
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(loaded, originals);
}

#[test]
fn test_bounded_decode_pool_preserves_order() {
    let dir = tempdir().unwrap();
    let originals: Vec<Sample> = (0..16).map(test_sample).collect();
    write_shards(dir.path(), originals.clone(), &capacity(8)).unwrap();

    let paths: Vec<_> = (0..2)
        .map(|idx| dir.path().join(format!("{}.tfrecords", idx)))
        .collect();
    let options = LoaderOptions {
        decode_threads: Some(2),
    };
    let loaded: Vec<Sample> = load_shards_with(paths, test_shapes(), &options)
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();

    assert_eq!(loaded, originals);
}

#[test]
fn test_wrong_shapes_fail_the_stream() {
    let dir = tempdir().unwrap();
    write_shards(dir.path(), vec![test_sample(0), test_sample(1)], &capacity(2)).unwrap();

    let mut wrong = test_shapes();
    wrong.moving_image = [2, 3, 5];

    let mut stream = load_shards(vec![dir.path().join("0.tfrecords")], wrong);
    let first = stream.next().unwrap();
    assert!(matches!(first, Err(RegShardError::ShapeMismatch { .. })));

    // The error is fatal: the stream ends after yielding it once.
    assert!(stream.next().is_none());
}

#[test]
fn test_missing_shard_file_fails_the_stream() {
    let dir = tempdir().unwrap();
    let mut stream = load_shards(vec![dir.path().join("0.tfrecords")], test_shapes());
    assert!(matches!(
        stream.next().unwrap(),
        Err(RegShardError::Io(_))
    ));
    assert!(stream.next().is_none());
}

#[test]
fn test_empty_path_list_is_an_empty_stream() {
    let mut stream = load_shards(Vec::new(), test_shapes());
    assert!(stream.next().is_none());
}

#[test]
fn test_sample_reports_its_own_shapes() {
    // The producer-side helper must agree with the metadata handed to the
    // loader, or round trips are impossible by construction.
    assert_eq!(test_sample(0).shapes(), test_shapes());
}
