use crate::foundation::error::{PlatenError, PlatenResult};
use crate::wire::validate::{validate_request, validate_response};
use serde_json::Value;

/// A render request, as carried over the channel.
///
/// `id` is a caller-generated unique token correlating the reply; `css` and
/// `html` are the fully template-expanded composed document; `width` and
/// `height` are the target raster dimensions in device pixels.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderRequest {
    /// Correlation token, echoed unchanged in the response.
    pub id: String,
    /// Expanded stylesheet text of the composed document.
    pub css: String,
    /// Expanded markup text of the composed document.
    pub html: String,
    /// Target raster width in device pixels, non-zero.
    pub width: u32,
    /// Target raster height in device pixels, non-zero.
    pub height: u32,
}

/// A render response: the request's token and a PNG data URI.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderResponse {
    /// The originating request's correlation token, unchanged.
    pub id: String,
    /// Self-contained `data:image/png;base64,` image reference.
    pub uri: String,
}

impl RenderRequest {
    /// Encode for the channel, validating at the send boundary.
    pub fn to_value(&self) -> PlatenResult<Value> {
        let v = serde_json::to_value(self)
            .map_err(|e| PlatenError::protocol(format!("encode render request: {e}")))?;
        validate_request(&v)
            .map_err(|e| PlatenError::validation(format!("render request: {e}")))?;
        Ok(v)
    }

    /// Decode from the channel, validating at the receive boundary.
    pub fn from_value(v: &Value) -> PlatenResult<Self> {
        validate_request(v)
            .map_err(|e| PlatenError::validation(format!("render request: {e}")))?;
        serde_json::from_value(v.clone())
            .map_err(|e| PlatenError::protocol(format!("decode render request: {e}")))
    }
}

impl RenderResponse {
    /// Encode for the channel, validating at the send boundary.
    pub fn to_value(&self) -> PlatenResult<Value> {
        let v = serde_json::to_value(self)
            .map_err(|e| PlatenError::protocol(format!("encode render response: {e}")))?;
        validate_response(&v)
            .map_err(|e| PlatenError::validation(format!("render response: {e}")))?;
        Ok(v)
    }

    /// Decode from the channel, validating at the receive boundary.
    pub fn from_value(v: &Value) -> PlatenResult<Self> {
        validate_response(v)
            .map_err(|e| PlatenError::validation(format!("render response: {e}")))?;
        serde_json::from_value(v.clone())
            .map_err(|e| PlatenError::protocol(format!("decode render response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> RenderRequest {
        RenderRequest {
            id: "req-1".to_owned(),
            css: "rect { fill: red; }".to_owned(),
            html: "<rect/>".to_owned(),
            width: 320,
            height: 200,
        }
    }

    #[test]
    fn request_round_trips_through_the_channel_encoding() {
        let req = request();
        let v = req.to_value().unwrap();
        assert_eq!(RenderRequest::from_value(&v).unwrap(), req);
    }

    #[test]
    fn zero_dimension_request_is_rejected_at_send() {
        let mut req = request();
        req.width = 0;
        let err = req.to_value().unwrap_err();
        assert!(matches!(err, PlatenError::Validation(_)));
    }

    #[test]
    fn malformed_incoming_request_is_rejected_at_receive() {
        let v = json!({"id": "a", "css": "", "html": "", "width": "320", "height": 1});
        assert!(RenderRequest::from_value(&v).is_err());
    }

    #[test]
    fn response_round_trips_through_the_channel_encoding() {
        let resp = RenderResponse {
            id: "req-1".to_owned(),
            uri: "data:image/png;base64,AA==".to_owned(),
        };
        let v = resp.to_value().unwrap();
        assert_eq!(RenderResponse::from_value(&v).unwrap(), resp);
    }
}
