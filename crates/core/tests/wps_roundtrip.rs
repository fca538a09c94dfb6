//! Binary tile round-trip through the filesystem.

use approx::assert_relative_eq;
use naturf_core::io::{read_wps_tile, tile_file_name, write_wps_output, INDEX_FILE_NAME, PARTIAL_SUFFIX};
use naturf_core::{GeoTransform, LayerStack, Projection, Raster, Settings};
use std::path::Path;

fn sample_stack(layers: usize, rows: usize, cols: usize) -> LayerStack {
    let rasters: Vec<Raster<f32>> = (0..layers)
        .map(|k| {
            let data = (0..rows * cols)
                .map(|i| (k as f32) * 0.5 + (i as f32) * 0.012_34)
                .collect();
            let mut r = Raster::from_vec(data, rows, cols).unwrap();
            r.set_transform(GeoTransform::new(1_500_000.0, 2_000_000.0, 100.0, -100.0));
            r
        })
        .collect();
    LayerStack::from_layers(&rasters).unwrap()
}

#[test]
fn file_size_matches_shape() {
    let dir = tempfile::tempdir().unwrap();
    let stack = sample_stack(132, 3, 4);
    let out = write_wps_output(&stack, Projection::AlbersNad83, &Settings::default(), dir.path())
        .unwrap();

    assert_eq!(out.tile_path.file_name().unwrap(), tile_file_name(3, 4).as_str());
    assert_eq!(out.index_path, dir.path().join(INDEX_FILE_NAME));
    let len = std::fs::metadata(&out.tile_path).unwrap().len();
    assert_eq!(len, 132 * 3 * 4 * 4);

    // No temporary files left behind
    let names: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names.len(), 2, "unexpected files: {names:?}");
}

#[test]
fn read_back_reverses_scaling() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let stack = sample_stack(5, 2, 3);
    let out = write_wps_output(&stack, Projection::AlbersNad83, &settings, dir.path()).unwrap();

    let ints = read_wps_tile(&out.tile_path, stack.shape()).unwrap();
    let back = LayerStack::unscale(&ints, settings.scale(), *stack.transform());

    for (a, b) in stack.data().iter().zip(back.data().iter()) {
        assert!((a - b).abs() <= 5e-5, "{a} vs {b}");
    }
}

#[test]
fn read_rejects_wrong_shape() {
    let dir = tempfile::tempdir().unwrap();
    let stack = sample_stack(2, 2, 2);
    let out = write_wps_output(&stack, Projection::Geographic, &Settings::default(), dir.path())
        .unwrap();
    assert!(read_wps_tile(&out.tile_path, (2, 2, 3)).is_err());
}

#[test]
fn index_reports_southwest_corner() {
    let dir = tempfile::tempdir().unwrap();
    let stack = sample_stack(132, 2, 2);
    let out = write_wps_output(&stack, Projection::AlbersNad83, &Settings::default(), dir.path())
        .unwrap();

    let (lon, lat) = Projection::AlbersNad83.to_geographic(1_500_000.0, 1_999_800.0).unwrap();
    assert_relative_eq!(out.index.known_lon, lon, epsilon = 1e-12);
    assert_relative_eq!(out.index.known_lat, lat, epsilon = 1e-12);
    assert!(out.index.dx > 0.0 && out.index.dx < 0.01);

    let text = std::fs::read_to_string(&out.index_path).unwrap();
    assert!(text.contains("tile_z=132"));
}

fn entries(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect()
}

#[test]
fn failed_index_rename_removes_tile() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the index should go makes the final rename fail
    std::fs::create_dir(dir.path().join(INDEX_FILE_NAME)).unwrap();

    let stack = sample_stack(3, 2, 2);
    let result = write_wps_output(&stack, Projection::Geographic, &Settings::default(), dir.path());
    assert!(result.is_err());

    let names = entries(dir.path());
    assert_eq!(names, vec![INDEX_FILE_NAME.to_string()], "unexpected files: {names:?}");
    assert!(!dir.path().join(tile_file_name(2, 2)).exists());
}

#[test]
fn failed_tile_rename_removes_partials() {
    let dir = tempfile::tempdir().unwrap();
    let tile_name = tile_file_name(2, 2);
    std::fs::create_dir(dir.path().join(&tile_name)).unwrap();
    std::fs::write(dir.path().join(&tile_name).join("keep"), b"x").unwrap();

    let stack = sample_stack(3, 2, 2);
    let result = write_wps_output(&stack, Projection::Geographic, &Settings::default(), dir.path());
    assert!(result.is_err());

    let names = entries(dir.path());
    assert!(names.iter().all(|n| !n.ends_with(PARTIAL_SUFFIX)), "leftovers: {names:?}");
    assert!(!dir.path().join(INDEX_FILE_NAME).exists());
}

#[test]
fn partial_names_follow_tile_name() {
    // Runs with different tile shapes write side by side without clashing
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let small = write_wps_output(&sample_stack(2, 1, 1), Projection::Geographic, &settings, dir.path()).unwrap();
    let large = write_wps_output(&sample_stack(2, 2, 3), Projection::Geographic, &settings, dir.path()).unwrap();
    assert_ne!(small.tile_path, large.tile_path);
    assert!(small.tile_path.exists() && large.tile_path.exists());
    assert!(entries(dir.path()).iter().all(|n| !n.ends_with(PARTIAL_SUFFIX)));
}
