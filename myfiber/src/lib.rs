#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

mod client;
pub mod config;
mod extent;
pub mod mercator;
mod position;
mod projection;
mod query;
mod request;
mod response;
mod retry;
mod transport;

pub use client::{Client, ClientOptions, Error, HeaderValue, USER_AGENT};
pub use config::{ConfigError, ConfigStore, Configuration, FileStore, MemoryStore};
pub use extent::{BoundingBox, Viewport, ViewportError};
pub use position::{Position, lat_lon, lon_lat};
pub use projection::{Crs, ProjectionError};
pub use query::{Params, encode_query};
pub use request::{BBOX_PARAM, BuildError, RequestBuilder};
pub use response::{Document, Response};
pub use transport::{HttpTransport, Transport};
