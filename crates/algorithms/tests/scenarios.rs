//! End-to-end scenarios with literal expected values.

use approx::assert_relative_eq;
use geo::{polygon, Polygon};
use naturf_algorithms::geometry::{decompose, wall_lengths, Direction};
use naturf_algorithms::neighborhood::Neighborhoods;
use naturf_algorithms::pipeline::{Pipeline, RunOutput};
use naturf_algorithms::urban::{frontal_lengths, ParameterRecord, HEIGHT_BINS};
use naturf_core::io::read_wps_tile;
use naturf_core::settings::LAYER_COUNT;
use naturf_core::{BuildingId, BuildingRecord, FootprintTable, LayerStack, Settings, TileConfig};
use naturf_parallel::ProcessingMode;

const A_T: f64 = 40_000.0;

fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
    polygon![(x: x, y: y), (x: x, y: y + side), (x: x + side, y: y + side), (x: x + side, y: y)]
}

fn run(records: Vec<BuildingRecord>) -> RunOutput {
    Pipeline::new(Settings::default(), TileConfig::default())
        .unwrap()
        .with_mode(ProcessingMode::Sequential)
        .run_without_output(records)
        .unwrap()
}

fn record_of<'a>(out: &'a RunOutput, id: i64) -> &'a ParameterRecord {
    &out
        .parameters
        .iter()
        .find(|(bid, _)| *bid == BuildingId::Int(id))
        .unwrap()
        .1
}

#[test]
fn single_unit_square() {
    let footprint = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)];
    let lengths = wall_lengths(&decompose(&footprint));
    for d in Direction::ALL {
        assert_relative_eq!(lengths[d], 1.0);
    }

    let records = vec![BuildingRecord::new(1, 5.0, footprint)];
    let table = FootprintTable::from_records(records.clone(), &Settings::default()).unwrap();
    assert_relative_eq!(table.total_plan_area(), A_T);
    let neighborhoods = Neighborhoods::from_table(&table).unwrap();
    assert_eq!(neighborhoods.of(0), &[0]);
    let fl = frontal_lengths(neighborhoods.of(0), &[lengths]);
    assert_relative_eq!(fl[Direction::North], 1.0);

    let out = run(records);
    let p = record_of(&out, 1);
    assert_relative_eq!(p.frontal_area_index[Direction::North], 5.0 / A_T);
    assert_relative_eq!(p.plan_area_fraction, 1.0 / A_T, epsilon = 1e-12);
    assert_relative_eq!(p.height_to_width_ratio, 5.0 / 15.0);

    let mut expected = [0.0; HEIGHT_BINS];
    expected[0] = 1.0;
    assert_eq!(p.vertical_distribution_of_building_heights, expected);
}

#[test]
fn two_separated_squares() {
    let out = run(vec![
        BuildingRecord::new(0, 5.0, square(0.0, 0.0, 1.0)),
        BuildingRecord::new(1, 10.0, square(3.0, 0.0, 1.0)),
    ]);
    assert_eq!(out.neighbor_pairs, 4);
    for id in [0, 1] {
        let p = record_of(&out, id);
        assert_relative_eq!(p.mean_building_height, 7.5);
        assert_relative_eq!(p.standard_deviation_of_building_heights, 2.5);
    }
    assert_relative_eq!(record_of(&out, 0).height_to_width_ratio, 5.0 / 3.0);
}

#[test]
fn skyscraper() {
    let out = run(vec![BuildingRecord::new(9, 75.0, square(0.0, 0.0, 10.0))]);
    let p = record_of(&out, 9);
    for k in 0..HEIGHT_BINS {
        assert_relative_eq!(p.plan_area_density[k], 100.0 / A_T, epsilon = 1e-12);
        assert_relative_eq!(p.rooftop_area_density[k], 100.0 / A_T, epsilon = 1e-12);
        assert_eq!(p.vertical_distribution_of_building_heights[k], 1.0);
    }
}

#[test]
fn zero_height_building_is_filtered() {
    let with_zero = run(vec![
        BuildingRecord::new(1, 10.0, square(0.0, 0.0, 10.0)),
        BuildingRecord::new(2, 0.0, square(15.0, 0.0, 10.0)),
        BuildingRecord::new(3, 20.0, square(30.0, 0.0, 10.0)),
    ]);
    let without = run(vec![
        BuildingRecord::new(1, 10.0, square(0.0, 0.0, 10.0)),
        BuildingRecord::new(3, 20.0, square(30.0, 0.0, 10.0)),
    ]);

    assert_eq!(with_zero.parameters.len(), 2);
    assert!(with_zero.parameters.iter().all(|(id, _)| *id != BuildingId::Int(2)));
    assert_eq!(with_zero.neighbor_pairs, without.neighbor_pairs);
    for id in [1, 3] {
        assert_eq!(record_of(&with_zero, id), record_of(&without, id));
    }
}

#[test]
fn right_triangle() {
    let tri = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)];
    let lengths = wall_lengths(&decompose(&tri));
    assert_relative_eq!(lengths[Direction::West], 2f64.sqrt());
    assert_relative_eq!(lengths[Direction::South], 1.0);
    assert_relative_eq!(lengths[Direction::East], 1.0);
    assert_relative_eq!(lengths[Direction::North], 0.0);

    // Directions without walls give zero roughness outputs
    let out = run(vec![BuildingRecord::new(1, 12.0, tri)]);
    let p = record_of(&out, 1);
    assert_eq!(p.frontal_area_index[Direction::North], 0.0);
    assert_eq!(p.raupach_roughness_length[Direction::North], 0.0);
    assert_eq!(p.raupach_displacement_height[Direction::North], 0.0);
    assert_eq!(p.macdonald_roughness_length[Direction::North], 0.0);
    assert!(p.raupach_roughness_length[Direction::West] > 0.0);
}

#[test]
fn binary_round_trip() {
    let records = vec![
        BuildingRecord::new(1, 12.0, square(10.0, 10.0, 20.0)),
        BuildingRecord::new(2, 33.0, square(90.0, 20.0, 25.0)),
        BuildingRecord::new(3, 7.5, square(150.0, 140.0, 15.0)),
    ];
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::default();
    let out = Pipeline::new(settings.clone(), TileConfig::default())
        .unwrap()
        .run(records, dir.path())
        .unwrap();

    let (layers, rows, cols) = out.stack.shape();
    assert_eq!((layers, rows, cols), (LAYER_COUNT, 2, 2));

    let written = out.output.unwrap();
    let size = std::fs::metadata(&written.tile_path).unwrap().len();
    assert_eq!(size as usize, LAYER_COUNT * rows * cols * 4);
    assert_eq!(
        written.tile_path.file_name().unwrap().to_str().unwrap(),
        "00001-00002.00001-00002"
    );

    let ints = read_wps_tile(&written.tile_path, out.stack.shape()).unwrap();
    for (a, i) in out.stack.data().iter().zip(ints.iter()) {
        let b = *i as f64 / settings.scale();
        assert!((*a as f64 - b).abs() <= 5e-5, "{a} vs {b}");
    }

    let back = LayerStack::unscale(&ints, settings.scale(), *out.stack.transform());
    assert_eq!(back.shape(), out.stack.shape());
}
