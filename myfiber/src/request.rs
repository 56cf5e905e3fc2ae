//! Requests for the currently visible part of the map.

use crate::{
    client::{self, Client},
    config::Configuration,
    extent::{BoundingBox, Viewport, ViewportError},
    projection::{Crs, ProjectionError},
    query::{Params, split_url},
    response::Document,
    transport::Transport,
};

/// Name of the query parameter carrying the bounding box.
pub const BBOX_PARAM: &str = "bbox";

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Viewport(#[from] ViewportError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Request(#[from] client::Error),
}

/// Request of an API endpoint, limited to what is visible on the map canvas.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    path: String,
    params: Params,
    viewport: String,
    crs: String,
}

impl RequestBuilder {
    /// * `url` - endpoint path, possibly with a query string of its own, which is kept.
    /// * `viewport` - extent of the canvas, as `"minx,miny : maxx,maxy"`.
    /// * `crs` - identifier of the canvas coordinate reference system, e.g. `"EPSG:3857"`.
    pub fn new(url: &str, viewport: impl Into<String>, crs: impl Into<String>) -> Self {
        let (path, params) = split_url(url);
        Self {
            path,
            params,
            viewport: viewport.into(),
            crs: crs.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parameters which came with the URL.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Visible extent in WGS84, fitted into the area served by the API.
    pub fn bbox(&self) -> Result<BoundingBox, BuildError> {
        let viewport: Viewport = self.viewport.parse()?;
        let crs: Crs = self.crs.parse()?;

        let min = crs.to_wgs84(viewport.min)?;
        let max = crs.to_wgs84(viewport.max)?;

        Ok(BoundingBox::from_corners(min, max).adjust())
    }

    /// Parameters of the URL together with the bounding box. Bounding box from the URL, if any,
    /// gets overwritten.
    pub fn query(&self) -> Result<Params, BuildError> {
        let mut params = self.params.clone();
        params.insert(BBOX_PARAM.to_owned(), self.bbox()?.to_string());
        Ok(params)
    }

    /// Issue the request with a new [`Client`].
    pub fn build_request(&self, configuration: &Configuration) -> Result<Document, BuildError> {
        let client = Client::new(configuration)?;
        self.send(&client)
    }

    /// Issue the request with given client.
    pub fn send<T: Transport>(&self, client: &Client<T>) -> Result<Document, BuildError> {
        let params = self.query()?;
        log::debug!("Requesting {} with {params:?}.", self.path);
        Ok(client.request(&self.path, Some(&params))?)
    }
}
