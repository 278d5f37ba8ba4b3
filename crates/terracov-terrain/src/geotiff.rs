//! GeoTIFF elevation rasters in Web Mercator.

use std::io::{Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::{debug, info};

use crate::transform::GridTransform;
use crate::{Result, TerrainError, TerrainGrid};

/// Load an EPSG:3857 elevation raster.
///
/// The raster must carry ModelTiepoint and ModelPixelScale tags. Cells equal
/// to the GDAL no-data value are treated as water.
pub fn load_geotiff<P: AsRef<Path>>(path: P) -> Result<TerrainGrid> {
    load_geotiff_with_water_value(path, None)
}

/// Load an EPSG:3857 elevation raster, treating cells equal to `water_value`
/// as water. Falls back to the GDAL no-data value when `None`.
pub fn load_geotiff_with_water_value<P: AsRef<Path>>(
    path: P,
    water_value: Option<f32>,
) -> Result<TerrainGrid> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let grid = read_geotiff(std::io::BufReader::new(file), water_value)?;
    let (height, width) = crate::TerrainAccessor::extent(&grid);
    info!(path = %path.display(), height, width, "Loaded terrain raster");
    Ok(grid)
}

/// Decode a GeoTIFF raster from any seekable reader.
pub fn read_geotiff<R: Read + Seek>(reader: R, water_value: Option<f32>) -> Result<TerrainGrid> {
    let mut decoder = Decoder::new(reader)?;

    // Country-scale rasters exceed the default decoder limits.
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.ifd_value_size = 1024 * 1024 * 1024;
    decoder = decoder.with_limits(limits);

    let (width, height) = decoder.dimensions()?;
    let transform = read_transform(&mut decoder)?;
    let water_value = water_value.or_else(|| read_nodata_value(&mut decoder));
    debug!(width, height, ?transform, ?water_value, "Decoding terrain raster");

    let data = decode_elevation_data(&mut decoder)?;
    TerrainGrid::from_elevations(height as usize, width as usize, &data, transform, water_value)
}

/// Build the grid transform from ModelTiepoint (33922) and ModelPixelScale (33550).
fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GridTransform> {
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .map_err(|_| TerrainError::InvalidGeoTiff("missing ModelTiepoint tag".into()))?;
    let scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .map_err(|_| TerrainError::InvalidGeoTiff("missing ModelPixelScale tag".into()))?;

    if tiepoint.len() < 6 || scale.len() < 2 {
        return Err(TerrainError::InvalidGeoTiff(format!(
            "malformed georeferencing: {} tiepoint values, {} scale values",
            tiepoint.len(),
            scale.len()
        )));
    }

    // Tiepoint format: [i, j, k, x, y, z] where (i, j) is a raster cell and
    // (x, y) its projected position. Rows run south from the tiepoint.
    let (i, j) = (tiepoint[0], tiepoint[1]);
    let (tie_x, tie_y) = (tiepoint[3], tiepoint[4]);
    let (scale_x, scale_y) = (scale[0], scale[1]);

    GridTransform::new(tie_x - i * scale_x, tie_y + j * scale_y, scale_x, -scale_y)
}

fn decode_elevation_data<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Vec<f32>> {
    let result = decoder.read_image()?;

    match result {
        DecodingResult::F32(data) => Ok(data),
        DecodingResult::F64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U16(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U32(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I8(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::U64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
        DecodingResult::I64(data) => Ok(data.into_iter().map(|v| v as f32).collect()),
    }
}

/// GDAL_NODATA (42113) is stored as an ASCII string.
fn read_nodata_value<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_matches(char::from(0)).trim().parse().ok())
}
