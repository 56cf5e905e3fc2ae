//! Spherical (Web) Mercator used by most of the web maps, EPSG:3857.
//! <https://en.wikipedia.org/wiki/Web_Mercator_projection>
//! <https://epsg.io/3857>

use crate::position::{Position, lon_lat};

/// Radius of the sphere, equal to the WGS84 semi-major axis.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Project geographical position into Web Mercator meters.
pub fn project(position: Position) -> Position {
    let x = position.x().to_radians() * EARTH_RADIUS;
    let y = position.y().to_radians().tan().asinh() * EARTH_RADIUS;
    lon_lat(x, y)
}

/// Transform Web Mercator meters back into geographical position.
pub fn unproject(meters: Position) -> Position {
    let lon = (meters.x() / EARTH_RADIUS).to_degrees();
    let lat = (meters.y() / EARTH_RADIUS).sinh().atan().to_degrees();
    lon_lat(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::lat_lon;

    #[test]
    fn unprojecting_known_points() {
        let origin = unproject(lon_lat(0.0, 0.0));
        approx::assert_relative_eq!(origin.x(), 0.0);
        approx::assert_relative_eq!(origin.y(), 0.0);

        // 10°E on the equator.
        let position = unproject(lon_lat(1_113_194.907_932_736, 0.0));
        approx::assert_relative_eq!(position.x(), 10.0, epsilon = 1e-9);
        approx::assert_relative_eq!(position.y(), 0.0);

        // Vienna.
        let vienna = unproject(lon_lat(1_822_902.9, 6_141_486.1));
        approx::assert_relative_eq!(vienna.x(), 16.3754, epsilon = 1e-4);
        approx::assert_relative_eq!(vienna.y(), 48.2077, epsilon = 1e-4);
    }

    #[test]
    fn project_there_and_back() {
        let st_poelten = lat_lon(48.2049, 15.6256);
        let calculated = unproject(project(st_poelten));

        approx::assert_relative_eq!(calculated.x(), st_poelten.x(), epsilon = 1e-9);
        approx::assert_relative_eq!(calculated.y(), st_poelten.y(), epsilon = 1e-9);
    }

    #[test]
    fn symmetric_input_gives_symmetric_output() {
        let min = unproject(lon_lat(-1.5e-05, -9e-06));
        let max = unproject(lon_lat(1.5e-05, 9e-06));

        assert_eq!(min.x().abs(), max.x().abs());
        assert_eq!(min.y().abs(), max.y().abs());
    }
}
