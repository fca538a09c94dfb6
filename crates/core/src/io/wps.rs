//! WPS geogrid binary tile writer/reader
//!
//! A tile is `L * Y * X` big-endian two's-complement 32-bit integers with no
//! header, iterated layer-major then row then column. Its name encodes the
//! 1-based inclusive column and row ranges: `00001-00120.00001-00080`.
//! The `index` sidecar describes projection, resolution and encoding.

use crate::crs::Projection;
use crate::error::{Error, Result};
use crate::raster::LayerStack;
use crate::settings::Settings;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use ndarray::Array3;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the sidecar file written next to the tile
pub const INDEX_FILE_NAME: &str = "index";

/// Suffix of the files written before the final rename
pub const PARTIAL_SUFFIX: &str = ".partial";

/// `XXXXX-XXXXX.YYYYY-YYYYY` for a tile of `rows` x `cols` starting at (1, 1)
pub fn tile_file_name(rows: usize, cols: usize) -> String {
    format!("{:05}-{:05}.{:05}-{:05}", 1, cols, 1, rows)
}

/// Write scaled integers big-endian in L → Y → X order.
pub fn encode_tile<W: Write>(ints: &Array3<i32>, writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for &v in ints.as_standard_layout().iter() {
        writer.write_i32::<BigEndian>(v)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a tile of known `(layers, rows, cols)` back into integers.
pub fn read_wps_tile<P: AsRef<Path>>(path: P, shape: (usize, usize, usize)) -> Result<Array3<i32>> {
    let path = path.as_ref();
    let expected = shape.0 * shape.1 * shape.2;
    let bytes = fs::metadata(path)?.len() as usize;
    if bytes != expected * 4 {
        return Err(Error::SizeMismatch {
            expected: expected * 4,
            actual: bytes,
        });
    }

    let mut reader = BufReader::new(File::open(path)?);
    let mut values = vec![0i32; expected];
    reader.read_i32_into::<BigEndian>(&mut values)?;

    Array3::from_shape_vec(shape, values).map_err(|e| Error::Other(e.to_string()))
}

/// Contents of the `index` sidecar.
#[derive(Debug, Clone, PartialEq)]
pub struct WpsIndex {
    /// Resolution in degrees
    pub dx: f64,
    pub dy: f64,
    /// South-west corner of the tile in geographic coordinates
    pub known_lat: f64,
    pub known_lon: f64,
    pub truelat1: f64,
    pub truelat2: f64,
    /// Mean longitude of the tile
    pub stdlon: f64,
    pub tile_x: usize,
    pub tile_y: usize,
    pub tile_z: usize,
    pub missing_value: f64,
    pub scaling_factor: i32,
}

impl WpsIndex {
    /// Describe `stack` whose grid is expressed in `projection`.
    pub fn new(stack: &LayerStack, projection: Projection, settings: &Settings) -> Result<Self> {
        let (layers, rows, cols) = stack.shape();
        let bounds = stack.transform().bounds(cols, rows);
        let geographic = projection.bbox_to_geographic(&bounds)?;
        let (known_lon, known_lat) = projection.to_geographic(bounds.min_x, bounds.min_y)?;

        Ok(Self {
            dx: geographic.width() / cols as f64,
            dy: geographic.height() / rows as f64,
            known_lat,
            known_lon,
            truelat1: settings.true_latitude_1,
            truelat2: settings.true_latitude_2,
            stdlon: (geographic.min_x + geographic.max_x) / 2.0,
            tile_x: cols,
            tile_y: rows,
            tile_z: layers,
            missing_value: settings.missing_value,
            scaling_factor: settings.scaling_factor,
        })
    }

    /// Render as `key=value` lines
    pub fn render(&self) -> String {
        let lines = [
            "type=continuous".to_string(),
            "projection=albers_nad83".to_string(),
            format!("missing_value={:.0}.", self.missing_value),
            format!("dy={}", self.dy),
            format!("dx={}", self.dx),
            "known_x=1".to_string(),
            "known_y=1".to_string(),
            format!("known_lat={}", self.known_lat),
            format!("known_lon={}", self.known_lon),
            format!("truelat1={}", self.truelat1),
            format!("truelat2={}", self.truelat2),
            format!("stdlon={}", self.stdlon),
            "wordsize=4".to_string(),
            "endian=big".to_string(),
            "signed=no".to_string(),
            format!("tile_x={}", self.tile_x),
            format!("tile_y={}", self.tile_y),
            format!("tile_z={}", self.tile_z),
            "units=\"dimensionless\"".to_string(),
            format!("scale_factor=1e-{}", self.scaling_factor),
            "description=\"Urban_Parameters\"".to_string(),
        ];
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Paths of a completed WPS output
#[derive(Debug, Clone)]
pub struct WpsOutput {
    pub tile_path: PathBuf,
    pub index_path: PathBuf,
    pub index: WpsIndex,
}

/// Scale, encode and write the tile and its index into `dir`.
///
/// Both files are first written under temporary names derived from the tile
/// name and the process id, and renamed only once both are complete, so a
/// failure leaves no partial output.
pub fn write_wps_output<P: AsRef<Path>>(
    stack: &LayerStack,
    projection: Projection,
    settings: &Settings,
    dir: P,
) -> Result<WpsOutput> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let (_, rows, cols) = stack.shape();
    let tile_name = tile_file_name(rows, cols);
    let tile_path = dir.join(&tile_name);
    let index_path = dir.join(INDEX_FILE_NAME);
    let pid = std::process::id();
    let tile_tmp = dir.join(format!(".{tile_name}.{pid}{PARTIAL_SUFFIX}"));
    let index_tmp = dir.join(format!(".{tile_name}.{pid}.{INDEX_FILE_NAME}{PARTIAL_SUFFIX}"));

    let index = WpsIndex::new(stack, projection, settings)?;
    let result = (|| -> Result<()> {
        let ints = stack.scaled(settings.scale());
        encode_tile(&ints, File::create(&tile_tmp)?)?;
        fs::write(&index_tmp, index.render())?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tile_tmp);
        let _ = fs::remove_file(&index_tmp);
        return Err(e);
    }

    if let Err(e) = fs::rename(&tile_tmp, &tile_path) {
        let _ = fs::remove_file(&tile_tmp);
        let _ = fs::remove_file(&index_tmp);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&index_tmp, &index_path) {
        let _ = fs::remove_file(&tile_path);
        let _ = fs::remove_file(&index_tmp);
        return Err(e.into());
    }

    debug!("Index: {:?}", index);
    info!("Wrote {} and {}", tile_path.display(), index_path.display());

    Ok(WpsOutput {
        tile_path,
        index_path,
        index,
    })
}
