//! Request correlation IDs.
//!
//! A caller-supplied `X-Request-ID` is kept; otherwise a random 32-hex-digit
//! ID is generated. The ID is echoed on the response and recorded on the
//! request span.

use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use uuid::Uuid;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates IDs as simple-format v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeHexRequestId;

impl MakeRequestId for MakeHexRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().simple().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Layer that assigns an ID to requests arriving without one.
pub fn set_layer() -> SetRequestIdLayer<MakeHexRequestId> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeHexRequestId)
}

/// Layer that copies the request's ID onto its response.
pub fn propagate_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_32_hex_digits() {
        let request = Request::new(());
        let id = MakeHexRequestId.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert_eq!(text.len(), 32);
        assert!(text.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_differ() {
        let request = Request::new(());
        let a = MakeHexRequestId.make_request_id(&request).unwrap();
        let b = MakeHexRequestId.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
