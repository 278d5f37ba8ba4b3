//! Integration tests for terrain loading and access.

use std::io::Cursor;

use approx::assert_relative_eq;
use terracov_terrain::{
    lon_lat_to_web_mercator, read_geotiff, GridTransform, TerrainAccessor, TerrainError,
    TerrainGrid,
};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

const WIDTH: u32 = 8;
const HEIGHT: u32 = 6;

/// Encode a small Web Mercator elevation raster with GeoTIFF tags.
fn encode_raster(origin: (f64, f64), data: &[f32], nodata: Option<&str>) -> Cursor<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(WIDTH, HEIGHT)
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[30.0f64, 30.0, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(
                Tag::ModelTiepointTag,
                &[0.0f64, 0.0, 0.0, origin.0, origin.1, 0.0][..],
            )
            .unwrap();
        if let Some(nodata) = nodata {
            image.encoder().write_tag(Tag::GdalNodata, nodata).unwrap();
        }
        image.write_data(data).unwrap();
    }
    buf.set_position(0);
    buf
}

fn ramp() -> Vec<f32> {
    (0..HEIGHT * WIDTH).map(|i| i as f32).collect()
}

#[test]
fn test_read_geotiff_layout() {
    let origin = lon_lat_to_web_mercator(-5.5, 56.5).unwrap();
    let grid = read_geotiff(encode_raster(origin, &ramp(), None), None).unwrap();

    assert_eq!(grid.extent(), (HEIGHT as usize, WIDTH as usize));
    // Row-major, north to south.
    assert_eq!(grid.elevation_at(0, 0).unwrap(), 0.0);
    assert_eq!(grid.elevation_at(0, 7).unwrap(), 7.0);
    assert_eq!(grid.elevation_at(1, 0).unwrap(), 8.0);
    assert_eq!(grid.elevation_at(5, 7).unwrap(), 47.0);

    let transform = grid.transform();
    assert_relative_eq!(transform.origin_x, origin.0);
    assert_relative_eq!(transform.origin_y, origin.1);
    assert_relative_eq!(transform.pixel_height, -30.0);

    // The upper-left corner maps to the first cell.
    assert_eq!(grid.coords_to_grid(-5.5, 56.5).unwrap(), (0, 0));
}

#[test]
fn test_read_geotiff_nodata_is_water() {
    let origin = lon_lat_to_web_mercator(10.0, 45.0).unwrap();
    let mut data = ramp();
    data[3] = -9999.0;
    let grid = read_geotiff(encode_raster(origin, &data, Some("-9999")), None).unwrap();

    assert!(grid.is_water(0, 3).unwrap());
    assert_eq!(grid.elevation_at(0, 3).unwrap(), 0.0);
    assert!(!grid.is_water(0, 4).unwrap());
}

#[test]
fn test_read_geotiff_water_override() {
    let origin = lon_lat_to_web_mercator(10.0, 45.0).unwrap();
    let grid = read_geotiff(encode_raster(origin, &ramp(), Some("-9999")), Some(5.0)).unwrap();

    assert!(grid.is_water(0, 5).unwrap());
    assert!(!grid.is_water(0, 6).unwrap());
}

#[test]
fn test_read_geotiff_requires_georeferencing() {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).unwrap();
        encoder
            .write_image::<colortype::Gray32Float>(WIDTH, HEIGHT, &ramp())
            .unwrap();
    }
    buf.set_position(0);

    let err = read_geotiff(buf, None).unwrap_err();
    assert!(matches!(err, TerrainError::InvalidGeoTiff(_)));
}

#[test]
fn test_accessor_through_trait_object() {
    let transform = GridTransform::from_lon_lat(-5.5, 56.5, 25.0).unwrap();
    let mut grid = TerrainGrid::new(10, 10, transform);
    grid.set_elevation(4, 4, 120.0).unwrap();
    grid.set_road(4, 5).unwrap();

    let accessor: &dyn TerrainAccessor = &grid;
    assert_eq!(accessor.elevation_at(4, 4).unwrap(), 120.0);
    assert!(accessor.is_road(4, 5).unwrap());
    assert!(accessor.sample(10, 0).is_none());
    assert!(accessor.elevation_at(10, 0).unwrap_err().is_out_of_bounds());
}
