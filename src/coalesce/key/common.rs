use super::{super::credentials::*, key::*};

use {
    bytes::*,
    http::{header::*, uri::*, *},
    std::{collections::*, fmt},
};

//
// CommonCoalesceKey
//

/// [CoalesceKey] implementation designed for common use cases.
///
/// Two requests share a key when they have the same method, the same target (including its query),
/// the same [Credentials], and the same set of headers. Header order and header name case do not
/// matter.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CommonCoalesceKey {
    /// Method (upper case).
    pub method: Method,

    /// Target URI, exactly as requested.
    pub target: String,

    /// Credentials mode.
    pub credentials: Credentials,

    /// Normalized headers (sorted by name).
    pub headers: BTreeMap<String, Bytes>,
}

impl CommonCoalesceKey {
    /// Constructor.
    pub fn new(
        method: Method,
        target: String,
        credentials: Credentials,
        headers: BTreeMap<String, Bytes>,
    ) -> Self {
        Self {
            method,
            target,
            credentials,
            headers,
        }
    }
}

impl CoalesceKey for CommonCoalesceKey {
    fn for_request(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self {
        Self::new(
            normalize_method(method),
            uri.to_string(),
            Credentials::for_extensions(extensions),
            normalize_headers(headers),
        )
    }
}

impl fmt::Display for CommonCoalesceKey {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let mut headers = String::default();
        for (name, value) in &self.headers {
            if !headers.is_empty() {
                headers += "&";
            }
            headers += &format!("{}={}", name, String::from_utf8_lossy(value));
        }

        write!(
            formatter,
            "{}|{}|{}|{}",
            self.method, self.target, self.credentials, headers
        )
    }
}

/// Normalize headers.
///
/// Names are lower case (guaranteed by [HeaderName]). Multiple values for the same name are
/// joined with ", " in their original order. Entries are sorted by name.
pub fn normalize_headers(headers: &HeaderMap) -> BTreeMap<String, Bytes> {
    let mut normalized = BTreeMap::new();

    for name in headers.keys() {
        let mut joined = BytesMut::new();
        for value in headers.get_all(name) {
            if !joined.is_empty() {
                joined.extend_from_slice(b", ");
            }
            joined.extend_from_slice(value.as_bytes());
        }
        normalized.insert(name.as_str().into(), joined.freeze());
    }

    normalized
}

// Methods are case-sensitive in HTTP, but we treat "get" as "GET".
fn normalize_method(method: &Method) -> Method {
    if method.as_str().eq_ignore_ascii_case(Method::GET.as_str()) {
        Method::GET
    } else {
        method.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(request: &Request<()>) -> CommonCoalesceKey {
        CommonCoalesceKey::for_request(
            request.method(),
            request.uri(),
            request.headers(),
            request.extensions(),
        )
    }

    #[test]
    fn header_order_and_case_are_irrelevant() {
        let first = Request::get("http://localhost:8000/api/posts/?page=2")
            .header("Accept", "application/json")
            .header("X-Token", "abc")
            .body(())
            .unwrap();
        let second = Request::get("http://localhost:8000/api/posts/?page=2")
            .header("x-token", "abc")
            .header("accept", "application/json")
            .body(())
            .unwrap();

        assert_eq!(key(&first), key(&second));
        assert_eq!(
            key(&first).to_string(),
            "GET|http://localhost:8000/api/posts/?page=2|same-origin|accept=application/json&x-token=abc"
        );
    }

    #[test]
    fn query_header_values_and_credentials_are_relevant() {
        let base = Request::get("/api/clubs/1/").body(()).unwrap();

        let query = Request::get("/api/clubs/1/?full=1").body(()).unwrap();
        assert_ne!(key(&base), key(&query));

        let header = Request::get("/api/clubs/1/")
            .header("Authorization", "Bearer a")
            .body(())
            .unwrap();
        let other_header = Request::get("/api/clubs/1/")
            .header("Authorization", "Bearer b")
            .body(())
            .unwrap();
        assert_ne!(key(&header), key(&other_header));

        let include = Request::get("/api/clubs/1/")
            .extension(Credentials::Include)
            .body(())
            .unwrap();
        assert_ne!(key(&base), key(&include));

        let same_origin = Request::get("/api/clubs/1/")
            .extension(Credentials::SameOrigin)
            .body(())
            .unwrap();
        assert_eq!(key(&base), key(&same_origin));
    }

    #[test]
    fn repeated_headers_are_joined_in_order() {
        let request = Request::get("/")
            .header("Accept-Language", "en")
            .header("Accept-Language", "fr")
            .body(())
            .unwrap();

        let headers = normalize_headers(request.headers());
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers.get("accept-language"),
            Some(&Bytes::from_static(b"en, fr"))
        );
    }

    #[test]
    fn lower_case_method_is_get() {
        let request = Request::builder()
            .method(Method::from_bytes(b"get").unwrap())
            .uri("/")
            .body(())
            .unwrap();
        assert_eq!(key(&request).method, Method::GET);
    }
}
