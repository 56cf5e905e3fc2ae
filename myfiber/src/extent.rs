//! Map viewport as reported by the host application, and the bounding box sent to the API.

use std::{fmt::Display, num::ParseFloatError, str::FromStr};

use crate::position::{Position, lon_lat};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ViewportError {
    #[error("viewport '{0}' should consist of two corners separated by ':'")]
    Corners(String),

    #[error("corner '{0}' should consist of two coordinates separated by ','")]
    Coordinates(String),

    #[error("invalid coordinate '{0}': {1}")]
    Number(String, ParseFloatError),
}

/// Rectangle of the visible map, in the coordinate reference system of the map canvas.
///
/// Parsed from `"minx,miny : maxx,maxy"`, whitespace around the numbers is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub min: Position,
    pub max: Position,
}

impl FromStr for Viewport {
    type Err = ViewportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let corners: Vec<&str> = s.split(':').collect();
        let [min, max] = corners[..] else {
            return Err(ViewportError::Corners(s.to_owned()));
        };

        Ok(Self {
            min: parse_corner(min)?,
            max: parse_corner(max)?,
        })
    }
}

fn parse_corner(corner: &str) -> Result<Position, ViewportError> {
    let coordinates: Vec<&str> = corner.split(',').map(str::trim).collect();
    let [x, y] = coordinates[..] else {
        return Err(ViewportError::Coordinates(corner.trim().to_owned()));
    };

    Ok(lon_lat(parse_coordinate(x)?, parse_coordinate(y)?))
}

fn parse_coordinate(text: &str) -> Result<f64, ViewportError> {
    text.parse()
        .map_err(|err| ViewportError::Number(text.to_owned(), err))
}

/// Bounding box in WGS84 degrees, as expected by the `bbox` query parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Area the API serves data for. Used as a replacement for nonsensical viewports and as the
    /// limit for the others.
    pub const FALLBACK: Self = Self {
        min_x: 9.53,
        min_y: 46.4,
        max_x: 17.17,
        max_y: 49.02,
    };

    pub fn from_corners(min: Position, max: Position) -> Self {
        Self {
            min_x: min.x(),
            min_y: min.y(),
            max_x: max.x(),
            max_y: max.y(),
        }
    }

    /// Fit the box into [`BoundingBox::FALLBACK`].
    ///
    /// Right after start, the host reports a tiny box centered at the origin instead of the real
    /// canvas extent. Such box (symmetric on either axis) is replaced by the fallback as a whole,
    /// any other one gets each of its bounds clamped separately.
    pub fn adjust(self) -> Self {
        let fallback = Self::FALLBACK;

        if self.min_x.abs() == self.max_x.abs() || self.min_y.abs() == self.max_y.abs() {
            log::debug!("Degenerate extent {self:?}, using fallback.");
            return fallback;
        }

        Self {
            min_x: self.min_x.clamp(fallback.min_x, fallback.max_x),
            min_y: self.min_y.clamp(fallback.min_y, fallback.max_y),
            max_x: self.max_x.clamp(fallback.min_x, fallback.max_x),
            max_y: self.max_y.clamp(fallback.min_y, fallback.max_y),
        }
    }
}

/// Formats as `minx,miny,maxx,maxy`.
impl Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            format_coordinate(self.min_x),
            format_coordinate(self.min_y),
            format_coordinate(self.max_x),
            format_coordinate(self.max_y)
        )
    }
}

/// Round to 6 decimal digits and drop the trailing zeros, together with the decimal point if
/// nothing is left after it.
pub fn format_coordinate(value: f64) -> String {
    let text = format!("{value:.6}");
    match text.trim_end_matches('0').trim_end_matches('.') {
        "-0" => "0".to_owned(),
        trimmed => trimmed.to_owned(),
    }
}
