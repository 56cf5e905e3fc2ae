//! Types and functions for working with positions.

/// Position on the map. Geographical ones are longitude (x) and latitude (y) in degrees,
/// projected ones use the units of their coordinate reference system.
pub type Position = geo_types::Point;

/// Construct `Position` from latitude and longitude.
pub fn lat_lon(lat: f64, lon: f64) -> Position {
    Position::new(lon, lat)
}

/// Construct `Position` from longitude and latitude, or from easting and northing for projected
/// coordinate systems. Note that it is common standard to write geographical coordinates
/// starting with the latitude instead (e.g. `48.2049, 15.6256` is St. Pölten).
pub fn lon_lat(lon: f64, lat: f64) -> Position {
    Position::new(lon, lat)
}
