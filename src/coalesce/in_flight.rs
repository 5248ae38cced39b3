use super::{error::*, key::*, response::*};

use {
    futures::future::*,
    parking_lot::Mutex,
    std::{collections::*, fmt, result::Result, sync::Arc},
};

/// Result of an upstream call, as shared by every attached caller.
pub type CaptureResult = Result<CapturedResponseRef, TransportError>;

/// Future of [CaptureResult] that can be awaited by many callers.
pub type SharedCapture = Shared<BoxFuture<'static, CaptureResult>>;

//
// InFlight
//

/// Registry of upstream calls that have been dispatched but have not yet settled.
///
/// Clones refer to the same shared state.
pub struct InFlight<CoalesceKeyT = CommonCoalesceKey> {
    state: Arc<Mutex<InFlightState<CoalesceKeyT>>>,
}

struct InFlightState<CoalesceKeyT> {
    entries: HashMap<CoalesceKeyT, InFlightEntry>,
    next_generation: u64,
}

struct InFlightEntry {
    generation: u64,
    capture: SharedCapture,
}

//
// Attachment
//

/// Outcome of [InFlight::attach_or_dispatch].
pub enum Attachment {
    /// Attached to an existing in-flight call.
    Attached(SharedCapture),

    /// Dispatched a new call.
    Dispatched(SharedCapture),
}

impl Attachment {
    /// The shared capture.
    pub fn into_capture(self) -> SharedCapture {
        match self {
            Self::Attached(capture) | Self::Dispatched(capture) => capture,
        }
    }
}

impl<CoalesceKeyT> InFlight<CoalesceKeyT>
where
    CoalesceKeyT: CoalesceKey,
{
    /// Attach to the in-flight call for the key, or register a new one.
    ///
    /// `dispatch` is called only if there is no in-flight call. It receives the new entry's
    /// generation, which the returned future must hand to [settle](Self::settle) when it
    /// completes. Lookup and registration are atomic.
    pub fn attach_or_dispatch<DispatchT>(
        &self,
        key: &CoalesceKeyT,
        dispatch: DispatchT,
    ) -> Attachment
    where
        DispatchT: FnOnce(u64) -> BoxFuture<'static, CaptureResult>,
    {
        let mut state = self.state.lock();

        if let Some(entry) = state.entries.get(key) {
            return Attachment::Attached(entry.capture.clone());
        }

        state.next_generation += 1;
        let generation = state.next_generation;
        let capture = dispatch(generation).shared();

        state.entries.insert(
            key.clone(),
            InFlightEntry {
                generation,
                capture: capture.clone(),
            },
        );

        Attachment::Dispatched(capture)
    }

    /// Remove the entry for the key if it is still of the given generation.
    pub fn settle(&self, key: &CoalesceKeyT, generation: u64) {
        let mut state = self.state.lock();
        if state
            .entries
            .get(key)
            .is_some_and(|entry| entry.generation == generation)
        {
            state.entries.remove(key);
        }
    }

    /// Whether there is an in-flight call for the key.
    pub fn contains(&self, key: &CoalesceKeyT) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    /// Number of in-flight calls.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether there are no in-flight calls.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget all in-flight calls.
    ///
    /// Callers that are already attached still receive their results.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }
}

impl<CoalesceKeyT> Clone for InFlight<CoalesceKeyT> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<CoalesceKeyT> Default for InFlight<CoalesceKeyT> {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(InFlightState {
                entries: HashMap::new(),
                next_generation: 0,
            })),
        }
    }
}

impl<CoalesceKeyT> fmt::Debug for InFlight<CoalesceKeyT> {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter
            .debug_struct("InFlight")
            .field("len", &self.state.lock().entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        bytes::*,
        http::{Method, Response, Uri},
    };

    fn key(path: &str) -> CommonCoalesceKey {
        let uri: Uri = path.parse().unwrap();
        CommonCoalesceKey::for_request(&Method::GET, &uri, &Default::default(), &Default::default())
    }

    fn captured(body: &'static str) -> CaptureResult {
        let (parts, _) = Response::new(()).into_parts();
        Ok(Arc::new(CapturedResponse::new(parts, Bytes::from_static(body.as_bytes()))))
    }

    #[tokio::test]
    async fn attaches_until_settled() {
        let in_flight = InFlight::default();
        let key = key("/api/posts/");

        let settling = in_flight.clone();
        let settled_key = key.clone();
        let first = in_flight.attach_or_dispatch(&key, move |generation| {
            async move {
                settling.settle(&settled_key, generation);
                captured("posts")
            }
            .boxed()
        });
        assert!(matches!(first, Attachment::Dispatched(_)));

        let second = in_flight.attach_or_dispatch(&key, |_| unreachable!());
        assert!(matches!(second, Attachment::Attached(_)));
        assert_eq!(in_flight.len(), 1);

        let (first, second) = join(first.into_capture(), second.into_capture()).await;
        assert_eq!(first.unwrap().body, second.unwrap().body);
        assert!(in_flight.is_empty());
    }

    #[tokio::test]
    async fn stale_generation_does_not_remove_newer_entry() {
        let in_flight = InFlight::default();
        let key = key("/api/clubs/");

        let old = in_flight
            .attach_or_dispatch(&key, |_| async { captured("old") }.boxed())
            .into_capture();
        in_flight.clear();
        let _new = in_flight.attach_or_dispatch(&key, |_| async { captured("new") }.boxed());

        // Generation 1 belonged to the cleared entry
        in_flight.settle(&key, 1);
        assert!(in_flight.contains(&key));

        assert_eq!(old.await.unwrap().body, Bytes::from_static(b"old"));
    }
}
