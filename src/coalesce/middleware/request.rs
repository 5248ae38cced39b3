use super::{configuration::*, hooks::*};

use http::*;

//
// CoalescableRequest
//

/// Coalescable request.
pub trait CoalescableRequest {
    /// Whether the request must bypass coalescing and caching.
    ///
    /// Only GET requests are coalescable. May call the `coalescable_by_request` hook.
    fn should_skip_coalescing<CacheT>(
        &self,
        configuration: &MiddlewareCoalescingConfiguration<CacheT>,
    ) -> bool;
}

impl<RequestBodyT> CoalescableRequest for Request<RequestBodyT> {
    fn should_skip_coalescing<CacheT>(
        &self,
        configuration: &MiddlewareCoalescingConfiguration<CacheT>,
    ) -> bool {
        let method = self.method();
        if !method.as_str().eq_ignore_ascii_case(Method::GET.as_str()) {
            tracing::debug!("skip (non-GET {})", method);
            return true;
        }

        if let Some(coalescable) = &configuration.coalescable_by_request
            && !coalescable(CoalescableHookContext::new(self.uri(), self.headers()))
        {
            tracing::debug!("skip (coalescable_by_request=false)");
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::coalesce::implementation::memory::*,
        std::sync::*,
    };

    type Configuration = MiddlewareCoalescingConfiguration<MemoryCacheImplementation>;

    fn get(uri: &str) -> Request<()> {
        Request::get(uri).body(()).unwrap()
    }

    #[test]
    fn only_get_is_coalescable() {
        let configuration = Configuration::default();

        assert!(!get("/api/posts/").should_skip_coalescing(&configuration));

        let lower_case = Request::builder()
            .method(Method::from_bytes(b"get").unwrap())
            .uri("/api/posts/")
            .body(())
            .unwrap();
        assert!(!lower_case.should_skip_coalescing(&configuration));

        for method in [
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
        ] {
            let request = Request::builder()
                .method(method)
                .uri("/api/posts/")
                .body(())
                .unwrap();
            assert!(request.should_skip_coalescing(&configuration));
        }
    }

    fn not_notifications(context: CoalescableHookContext) -> bool {
        !context.uri.path().starts_with("/api/notifications/")
    }

    #[test]
    fn hook_can_opt_out() {
        let mut configuration = Configuration::default();
        configuration.coalescable_by_request = Some(Arc::new(Box::new(not_notifications)));

        assert!(!get("/api/posts/").should_skip_coalescing(&configuration));
        assert!(get("/api/notifications/").should_skip_coalescing(&configuration));
    }
}
