use bytes::Bytes;
use serde::Deserialize;

use crate::client::Error;

/// Parsed JSON document returned by the API, typically a GeoJSON `FeatureCollection`.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// HTTP statuses after which the request is attempted again.
pub const RETRIABLE_STATUSES: [u16; 1] = [503];

/// Status and body of an HTTP response, as received from a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Human readable explanation the API puts into error responses, if there is any.
    pub fn message(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct ErrorBody {
            msg: Option<String>,
        }

        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.msg)
    }
}

/// What to do with a response.
#[derive(Debug)]
pub(crate) enum Inspection {
    Done(Document),
    Retriable,
    Fatal(Error),
}

pub(crate) fn inspect(response: &Response) -> Inspection {
    if RETRIABLE_STATUSES.contains(&response.status) {
        return Inspection::Retriable;
    }

    if response.status != 200 {
        return Inspection::Fatal(Error::Api {
            status: response.status,
            message: response.message(),
        });
    }

    match serde_json::from_slice(&response.body) {
        Ok(serde_json::Value::Object(document)) => Inspection::Done(document),
        Ok(other) => {
            log::trace!("Unexpected body: {other}");
            Inspection::Fatal(Error::NotADocument)
        }
        Err(err) => Inspection::Fatal(Error::Body(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_unavailable_is_retriable() {
        let response = Response::new(503, r#"{"msg": "maintenance"}"#);
        assert!(matches!(inspect(&response), Inspection::Retriable));
    }

    #[test]
    fn document_is_returned_as_is() {
        let response = Response::new(200, r#"{"type": "FeatureCollection", "features": []}"#);
        let Inspection::Done(document) = inspect(&response) else {
            panic!("expected a document");
        };
        assert_eq!(document["type"], "FeatureCollection");
        assert_eq!(document["features"], serde_json::json!([]));
    }

    #[test]
    fn error_status_carries_the_message() {
        let response = Response::new(401, r#"{"msg": "invalid api key"}"#);
        assert!(matches!(
            inspect(&response),
            Inspection::Fatal(Error::Api { status: 401, message: Some(message) })
                if message == "invalid api key"
        ));
    }

    #[test]
    fn error_status_without_message() {
        for body in ["", "<html>Bad Gateway</html>", r#"{"error": "x"}"#, r#"{"msg": 5}"#] {
            assert!(matches!(
                inspect(&Response::new(502, body)),
                Inspection::Fatal(Error::Api {
                    status: 502,
                    message: None
                })
            ));
        }
    }

    #[test]
    fn malformed_success_body_is_fatal() {
        assert!(matches!(
            inspect(&Response::new(200, "{\"type\": ")),
            Inspection::Fatal(Error::Body(_))
        ));
        assert!(matches!(
            inspect(&Response::new(200, "[1, 2, 3]")),
            Inspection::Fatal(Error::NotADocument)
        ));
    }
}
