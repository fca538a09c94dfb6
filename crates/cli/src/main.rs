//! naturf CLI - urban morphology parameters from building footprints

mod ingest;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use naturf_algorithms::pipeline::{Pipeline, PipelineError, RunOutput};
use naturf_algorithms::urban::{layer_names, ParameterRecord};
use naturf_core::io::read_wps_tile;
use naturf_core::settings::LAYER_COUNT;
use naturf_core::{BuildingId, GeoTransform, LayerStack, Projection, Settings, TileConfig};
use naturf_parallel::ProcessingMode;

use ingest::{read_geojson, FieldNames};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "naturf")]
#[command(author, version, about = "Urban morphology parameters from building footprints", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the 132 parameters of a footprint tile and write a WPS tile
    Run {
        /// Input GeoJSON FeatureCollection of building footprints
        input: PathBuf,
        /// Directory receiving the binary tile and its index
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Property holding the building id
        #[arg(long, default_value = "ID")]
        id_field: String,
        /// Property holding the building height in metres
        #[arg(long, default_value = "height")]
        height_field: String,
        /// EPSG code of the input coordinates (5070, 4326, 326xx, 327xx)
        #[arg(long, default_value = "5070")]
        epsg: u32,
        /// Output cell size in projected units (overrides settings)
        #[arg(short, long)]
        resolution: Option<f64>,
        /// JSON file with numeric settings
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Worker threads (0 = all cores, 1 = sequential)
        #[arg(short, long, default_value = "0")]
        threads: usize,
        /// Cancel the run after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Also write the per-building parameters as CSV
        #[arg(long)]
        parameters_csv: Option<PathBuf>,
    },
    /// Print per-layer statistics of a WPS tile
    Inspect {
        /// Binary tile, e.g. 00001-00120.00001-00080
        tile: PathBuf,
        /// Columns (read from the file name if omitted)
        #[arg(short)]
        x: Option<usize>,
        /// Rows (read from the file name if omitted)
        #[arg(short)]
        y: Option<usize>,
        /// Layers
        #[arg(short, default_value = "132")]
        z: usize,
        /// Scaling exponent the tile was written with
        #[arg(long, default_value = "4")]
        scaling_factor: i32,
    },
    /// List the layer names in tile order
    Layers,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn load_settings(path: Option<&Path>, resolution: Option<f64>) -> Result<Settings> {
    let mut settings = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        }
        None => Settings::default(),
    };
    if let Some(r) = resolution {
        settings.resolution = (r, r);
    }
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

fn processing_mode(threads: usize) -> ProcessingMode {
    match threads {
        0 => ProcessingMode::Parallel,
        1 => ProcessingMode::Sequential,
        n => ProcessingMode::ParallelWith(n),
    }
}

/// `(cols, rows)` from a `XXXXX-XXXXX.YYYYY-YYYYY` file name
fn tile_shape_from_name(path: &Path) -> Option<(usize, usize)> {
    let name = path.file_name()?.to_str()?;
    let (xs, ys) = name.split_once('.')?;
    let end = |range: &str| -> Option<usize> {
        let (start, end) = range.split_once('-')?;
        let (start, end) = (start.parse::<usize>().ok()?, end.parse::<usize>().ok()?);
        (end >= start).then(|| end - start + 1)
    };
    Some((end(xs)?, end(ys)?))
}

fn write_parameters_csv(path: &Path, rows: &[(BuildingId, ParameterRecord)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["id".to_string()];
    header.extend(layer_names());
    writer.write_record(&header)?;

    for (id, record) in rows {
        let layers = record.to_layers();
        let fields = std::iter::once(id.to_string())
            .chain(layers.iter().map(|v| v.to_string()));
        writer.write_record(fields)?;
    }
    writer.flush()?;
    Ok(())
}

fn done(output: &RunOutput, elapsed: Duration) {
    let (layers, rows, cols) = output.stack.shape();
    if let Some(wps) = &output.output {
        println!("Tile saved to: {}", wps.tile_path.display());
        println!("Index saved to: {}", wps.index_path.display());
    }
    println!("  Buildings: {}", output.parameters.len());
    println!("  Neighbor pairs: {}", output.neighbor_pairs);
    println!("  Grid: {} x {} x {}", cols, rows, layers);
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn run(
    input: &Path,
    output_dir: &Path,
    fields: FieldNames,
    epsg: u32,
    resolution: Option<f64>,
    settings_path: Option<&Path>,
    threads: usize,
    timeout: Option<u64>,
    parameters_csv: Option<&Path>,
) -> Result<()> {
    let projection = Projection::from_epsg(epsg)
        .with_context(|| format!("Unsupported EPSG code {epsg}"))?;
    let settings = load_settings(settings_path, resolution)?;

    let pb = spinner("Reading footprints...");
    let records = read_geojson(input, &fields)?;
    pb.finish_and_clear();
    info!("Input: {} features in {}", records.len(), projection);

    let mut pipeline = Pipeline::new(settings, TileConfig::new(projection))?
        .with_mode(processing_mode(threads));

    if let Some(secs) = timeout {
        let token = pipeline.cancellation_token();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(secs));
            warn!("Timeout of {}s reached, cancelling", secs);
            token.cancel();
        });
    }

    let start = Instant::now();
    let pb = spinner("Computing urban parameters...");
    let result = pipeline.run(records, output_dir);
    pb.finish_and_clear();
    let output = result?;
    let elapsed = start.elapsed();

    if let Some(path) = parameters_csv {
        write_parameters_csv(path, &output.parameters)?;
        info!("Parameters written to {}", path.display());
    }

    done(&output, elapsed);
    Ok(())
}

fn inspect(tile: &Path, x: Option<usize>, y: Option<usize>, z: usize, scaling_factor: i32) -> Result<()> {
    let (cols, rows) = match (x, y, tile_shape_from_name(tile)) {
        (Some(x), Some(y), _) => (x, y),
        (x, y, Some((nx, ny))) => (x.unwrap_or(nx), y.unwrap_or(ny)),
        _ => bail!("Cannot infer the tile size from {}; pass -x and -y", tile.display()),
    };

    let ints = read_wps_tile(tile, (z, rows, cols))
        .with_context(|| format!("Failed to read {}", tile.display()))?;
    let stack = LayerStack::unscale(&ints, 10f64.powi(scaling_factor), GeoTransform::default());

    let names = if z == LAYER_COUNT {
        layer_names()
    } else {
        (0..z).map(|k| format!("layer_{k}")).collect()
    };

    println!("File: {}", tile.display());
    println!("Dimensions: {} x {} x {}", cols, rows, z);
    println!(
        "{:>4}  {:<45} {:>14} {:>14} {:>14} {:>8}",
        "k", "name", "min", "max", "mean", "nonzero"
    );
    for (k, name) in names.iter().enumerate() {
        let summary = stack.summary(k);
        println!(
            "{:>4}  {:<45} {:>14.6} {:>14.6} {:>14.6} {:>8}",
            k,
            name,
            summary.min.unwrap_or(f32::NAN),
            summary.max.unwrap_or(f32::NAN),
            summary.mean.unwrap_or(f64::NAN),
            summary.nonzero
        );
    }
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn execute(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            input,
            output_dir,
            id_field,
            height_field,
            epsg,
            resolution,
            settings,
            threads,
            timeout,
            parameters_csv,
        } => run(
            &input,
            &output_dir,
            FieldNames {
                id: id_field,
                height: height_field,
            },
            epsg,
            resolution,
            settings.as_deref(),
            threads,
            timeout,
            parameters_csv.as_deref(),
        ),
        Commands::Inspect {
            tile,
            x,
            y,
            z,
            scaling_factor,
        } => inspect(&tile, x, y, z, scaling_factor),
        Commands::Layers => {
            for (k, name) in layer_names().iter().enumerate() {
                println!("{k:>4}  {name}");
            }
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            let cancelled = e
                .downcast_ref::<PipelineError>()
                .is_some_and(PipelineError::is_cancelled);
            if cancelled {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_tile_shape_from_name() {
        assert_eq!(
            tile_shape_from_name(Path::new("/tmp/out/00001-00120.00001-00080")),
            Some((120, 80))
        );
        assert_eq!(tile_shape_from_name(Path::new("index")), None);
    }

    #[test]
    fn test_processing_mode() {
        assert_eq!(processing_mode(1), ProcessingMode::Sequential);
        assert_eq!(processing_mode(4), ProcessingMode::ParallelWith(4));
    }

    #[test]
    fn test_load_settings_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"radius": 50.0, "cap_style": "round"}"#).unwrap();
        let settings = load_settings(Some(&path), Some(250.0)).unwrap();
        assert_eq!(settings.radius, 50.0);
        assert_eq!(settings.resolution, (250.0, 250.0));

        std::fs::write(&path, r#"{"radius": -5.0}"#).unwrap();
        assert!(load_settings(Some(&path), None).is_err());
    }

    #[test]
    fn test_parameters_csv() {
        let dir = tempfile::tempdir().unwrap();
        let geojson = dir.path().join("b.geojson");
        std::fs::write(
            &geojson,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"ID": 1, "height": 9},
                 "geometry": {"type": "Polygon", "coordinates": [[[0,0],[0,10],[10,10],[10,0],[0,0]]]}}
            ]}"#,
        )
        .unwrap();
        let fields = FieldNames {
            id: "ID".into(),
            height: "height".into(),
        };
        let records = read_geojson(&geojson, &fields).unwrap();
        let output = Pipeline::new(Settings::default(), TileConfig::default())
            .unwrap()
            .run_without_output(records)
            .unwrap();

        let csv = dir.path().join("params.csv");
        write_parameters_csv(&csv, &output.parameters).unwrap();
        let text = std::fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(',').count(), LAYER_COUNT + 1);
        assert!(lines[1].starts_with("1,"));
    }

    #[test]
    fn test_parameters_csv_quotes_text_ids() {
        let square = |x: f64| {
            geo::polygon![(x: x, y: 0.0), (x: x, y: 10.0), (x: x + 10.0, y: 10.0), (x: x + 10.0, y: 0.0)]
        };
        let tricky = "block \"A\",\r\nnorth";
        let records = vec![
            naturf_core::BuildingRecord::new(tricky, 9.0, square(0.0)),
            naturf_core::BuildingRecord::new(7, 12.0, square(300.0)),
        ];
        let output = Pipeline::new(Settings::default(), TileConfig::default())
            .unwrap()
            .run_without_output(records)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.csv");
        write_parameters_csv(&path, &output.parameters).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.headers().unwrap().len(), LAYER_COUNT + 1);
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], tricky);
        assert_eq!(&rows[1][0], "7");
        assert!(rows.iter().all(|r| r.len() == LAYER_COUNT + 1));
    }
}
