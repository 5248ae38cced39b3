use super::{body::*, error::*};

use {
    bytes::*,
    http::{response::*, *},
    http_body::*,
    http_body_util::*,
    std::{result::Result, sync::*, time::*},
};

/// Common reference type for [CapturedResponse].
pub type CapturedResponseRef = Arc<CapturedResponse>;

//
// CapturedResponse
//

/// Captured HTTP response.
///
/// The upstream body is a one-shot stream, so we read it exactly once into immutable [Bytes] and
/// hand out independent copies to every caller.
#[derive(Clone, Debug)]
pub struct CapturedResponse {
    /// Response parts.
    ///
    /// Extensions are kept, so that client-specific data (such as a [ReasonPhrase]) survives.
    pub parts: Parts,

    /// Response body.
    pub body: Bytes,

    /// Optional cache duration.
    pub duration: Option<Duration>,
}

impl CapturedResponse {
    /// Constructor.
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body,
            duration: None,
        }
    }

    /// Constructor.
    ///
    /// Reads the entire response body. Trailers are discarded.
    pub async fn new_for<BodyT>(response: Response<BodyT>) -> Result<Self, TransportError>
    where
        BodyT: Body,
        BodyT::Error: Into<CapturedError>,
    {
        let (parts, body) = response.into_parts();
        let body = body.collect().await.map_err(TransportError::new)?.to_bytes();
        Ok(Self::new(parts, body))
    }

    /// Status.
    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    /// Status text.
    ///
    /// The [ReasonPhrase] extension if present, otherwise the status's canonical reason.
    pub fn status_text(&self) -> &str {
        match self.parts.extensions.get::<ReasonPhrase>() {
            Some(reason_phrase) => reason_phrase.as_str(),
            None => self.parts.status.canonical_reason().unwrap_or_default(),
        }
    }

    /// Headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Create a [Response] with an independent copy of the body.
    pub fn to_response<BodyT>(&self) -> Response<CoalescedBody<BodyT>> {
        Response::from_parts(self.parts.clone(), CoalescedBody::captured(self.body.clone()))
    }
}

//
// ReasonPhrase
//

/// Reason phrase as sent by the server.
///
/// Clients that preserve non-canonical reason phrases can insert it as a response extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReasonPhrase(pub String);

impl ReasonPhrase {
    /// As string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReasonPhrase {
    fn from(reason_phrase: &str) -> Self {
        Self(reason_phrase.into())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, http::header::*};

    #[tokio::test]
    async fn captures_and_materializes() {
        let upstream = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from_static(b"{\"detail\":\"Not found.\"}")))
            .unwrap();

        let captured = CapturedResponse::new_for(upstream).await.unwrap();
        assert_eq!(captured.status(), StatusCode::NOT_FOUND);
        assert_eq!(captured.status_text(), "Not Found");

        for _ in 0..2 {
            let response = captured.to_response::<Full<Bytes>>();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(
                response.headers().get(CONTENT_TYPE).unwrap(),
                "application/json"
            );
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(body, Bytes::from_static(b"{\"detail\":\"Not found.\"}"));
        }
    }

    #[test]
    fn prefers_reason_phrase_extension() {
        let (parts, _) = Response::builder()
            .status(StatusCode::OK)
            .extension(ReasonPhrase::from("Totally Fine"))
            .body(())
            .unwrap()
            .into_parts();

        let captured = CapturedResponse::new(parts, Bytes::new());
        assert_eq!(captured.status_text(), "Totally Fine");

        let response = captured.to_response::<Full<Bytes>>();
        assert_eq!(
            response.extensions().get::<ReasonPhrase>(),
            Some(&ReasonPhrase::from("Totally Fine"))
        );
    }
}
