//! Coordinate reference systems of the map canvas and their transformation to WGS84.

use std::{fmt::Debug, str::FromStr};

use proj4rs::proj::Proj;

use crate::{
    mercator,
    position::{Position, lon_lat},
};

const WGS84_PROJ: &str = "+proj=longlat +datum=WGS84 +no_defs";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("unknown coordinate reference system '{0}'")]
    UnknownCrs(String),

    #[error("invalid definition of '{crs}': {reason}")]
    Definition { crs: String, reason: String },

    #[error("could not transform from '{crs}': {reason}")]
    Transform { crs: String, reason: String },
}

/// Coordinate reference system of the map canvas.
///
/// Accepts `AUTHORITY:CODE` identifiers (only EPSG is known, space after the colon is fine),
/// bare EPSG codes and PROJ.4 definitions starting with `+`.
pub enum Crs {
    /// EPSG:4326, the target of all transformations.
    Wgs84,

    /// EPSG:3857 and its historical aliases.
    WebMercator,

    /// Anything else, handled by proj4rs.
    Proj {
        identifier: String,
        source: Box<Proj>,
        wgs84: Box<Proj>,
    },
}

impl Crs {
    pub fn from_epsg(code: u32) -> Result<Self, ProjectionError> {
        match code {
            4326 => Ok(Self::Wgs84),
            3857 | 3785 | 900_913 | 102_100 => Ok(Self::WebMercator),
            _ => {
                let identifier = format!("EPSG:{code}");
                let definition = u16::try_from(code)
                    .ok()
                    .and_then(crs_definitions::from_code)
                    .ok_or_else(|| ProjectionError::UnknownCrs(identifier.clone()))?;
                Self::from_proj_string(identifier, definition.proj4)
            }
        }
    }

    fn from_proj_string(identifier: String, definition: &str) -> Result<Self, ProjectionError> {
        let invalid = |err: proj4rs::errors::Error| ProjectionError::Definition {
            crs: identifier.clone(),
            reason: err.to_string(),
        };
        let source = Proj::from_proj_string(definition).map_err(invalid)?;
        let wgs84 = Proj::from_proj_string(WGS84_PROJ).map_err(invalid)?;

        Ok(Self::Proj {
            identifier,
            source: Box::new(source),
            wgs84: Box::new(wgs84),
        })
    }

    /// Transform position expressed in this system into WGS84 longitude and latitude.
    pub fn to_wgs84(&self, position: Position) -> Result<Position, ProjectionError> {
        match self {
            Self::Wgs84 => Ok(position),
            Self::WebMercator => Ok(mercator::unproject(position)),
            Self::Proj {
                identifier,
                source,
                wgs84,
            } => {
                let mut point = (position.x(), position.y(), 0.0);

                // proj4rs works with radians for geographical systems.
                if source.is_latlong() {
                    point.0 = point.0.to_radians();
                    point.1 = point.1.to_radians();
                }

                proj4rs::transform::transform(source, wgs84, &mut point).map_err(|err| {
                    ProjectionError::Transform {
                        crs: identifier.clone(),
                        reason: err.to_string(),
                    }
                })?;

                Ok(lon_lat(point.0.to_degrees(), point.1.to_degrees()))
            }
        }
    }
}

impl FromStr for Crs {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.starts_with('+') {
            return Self::from_proj_string(s.to_owned(), s);
        }

        let code = match s.split_once(':') {
            Some((authority, code)) if authority.trim().eq_ignore_ascii_case("EPSG") => code,
            Some(_) => return Err(ProjectionError::UnknownCrs(s.to_owned())),
            None => s,
        };

        let code = code
            .trim()
            .parse()
            .ok()
            .ok_or_else(|| ProjectionError::UnknownCrs(s.to_owned()))?;

        Self::from_epsg(code)
    }
}

impl Debug for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wgs84 => write!(f, "Crs(EPSG:4326)"),
            Self::WebMercator => write!(f, "Crs(EPSG:3857)"),
            Self::Proj { identifier, .. } => write!(f, "Crs({identifier})"),
        }
    }
}
