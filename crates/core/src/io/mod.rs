//! Output I/O: WPS geogrid binary tiles and their index sidecar

mod wps;

pub use wps::{
    encode_tile, read_wps_tile, tile_file_name, write_wps_output, WpsIndex, WpsOutput,
    INDEX_FILE_NAME, PARTIAL_SUFFIX,
};
