use super::error::*;

use {
    bytes::*,
    http_body::*,
    std::{pin::*, task::*},
};

//
// CoalescedBody
//

/// Response body returned by the coalescing service.
///
/// Requests that bypass coalescing get the upstream body as is. All others get a buffered copy
/// of the captured body. Copies are cheap (they share the same immutable [Bytes]) and independent:
/// reading one never affects another.
#[derive(Debug)]
pub enum CoalescedBody<BodyT> {
    /// Upstream body, passed through.
    Upstream(BodyT),

    /// Captured body. [None] once it has been read.
    Captured(Option<Bytes>),
}

impl<BodyT> CoalescedBody<BodyT> {
    /// Constructor.
    pub fn captured(bytes: Bytes) -> Self {
        Self::Captured(Some(bytes))
    }
}

impl<BodyT> Body for CoalescedBody<BodyT>
where
    BodyT: Body<Data = Bytes> + Unpin,
    BodyT::Error: Into<CapturedError>,
{
    type Data = Bytes;
    type Error = TransportError;

    fn poll_frame(
        self: Pin<&mut Self>,
        context: &mut Context<'_>,
    ) -> Poll<Option<std::result::Result<Frame<Self::Data>, Self::Error>>> {
        match self.get_mut() {
            Self::Upstream(body) => Pin::new(body)
                .poll_frame(context)
                .map(|frame| frame.map(|frame| frame.map_err(TransportError::new))),

            Self::Captured(bytes) => Poll::Ready(
                bytes
                    .take()
                    .filter(|bytes| !bytes.is_empty())
                    .map(|bytes| Ok(Frame::data(bytes))),
            ),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Upstream(body) => body.is_end_stream(),
            Self::Captured(bytes) => bytes.as_ref().is_none_or(|bytes| bytes.is_empty()),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Upstream(body) => body.size_hint(),
            Self::Captured(bytes) => {
                SizeHint::with_exact(bytes.as_ref().map(|bytes| bytes.len()).unwrap_or_default() as u64)
            }
        }
    }
}
