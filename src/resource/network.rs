//! # Network Resources
//!
//! [`NetworkResource`] describes an HTTP(S) endpoint. Implementors supply the
//! raw fields; the provided [`NetworkResource::build_request`] turns them into a
//! [`Request`] or reports that no well-formed request exists.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use url::Url;

use super::{HttpMethod, QueryItem, Request, Resource};

/// An HTTP(S) endpoint returning a JSON model.
///
/// # Example
/// ```rust
/// use typed_fetch::resource::{NetworkResource, Resource};
///
/// struct Repos { endpoint: String }
///
/// impl Resource for Repos {
///     type Model = Vec<serde_json::Value>;
/// }
///
/// impl NetworkResource for Repos {
///     fn url(&self) -> &str { &self.endpoint }
/// }
///
/// let ok = Repos { endpoint: "https://api.example.com/users/alice/repos".into() };
/// assert!(ok.build_request().is_some());
///
/// let broken = Repos { endpoint: "not a url".into() };
/// assert!(broken.build_request().is_none());
/// ```
pub trait NetworkResource: Resource {
    /// Target URL as written by the caller; parsed in [`build_request`](Self::build_request).
    fn url(&self) -> &str;

    fn method(&self) -> HttpMethod {
        HttpMethod::Get
    }

    fn headers(&self) -> Option<&BTreeMap<String, String>> {
        None
    }

    fn query_items(&self) -> Option<&[QueryItem]> {
        None
    }

    fn json_body(&self) -> Option<&serde_json::Value> {
        None
    }

    /// Derives the concrete request.
    ///
    /// Pure: the same fields always give the same answer. Returns `None` when
    /// the URL does not parse or is not `http`/`https`, or when a header name or
    /// value is malformed. Query items are appended in the order supplied. A
    /// JSON body gets `Content-Type: application/json` unless one was given.
    fn build_request(&self) -> Option<Request> {
        let mut url = Url::parse(self.url()).ok()?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        if let Some(items) = self.query_items().filter(|items| !items.is_empty()) {
            let mut pairs = url.query_pairs_mut();
            for item in items {
                match &item.value {
                    Some(value) => pairs.append_pair(&item.name, value),
                    None => pairs.append_key_only(&item.name),
                };
            }
        }

        let mut headers = BTreeMap::new();
        for (name, value) in self.headers().into_iter().flatten() {
            if !is_header_name(name) || !is_header_value(value) {
                return None;
            }
            headers.insert(name.clone(), value.clone());
        }

        let body = match self.json_body() {
            Some(json) => {
                let bytes = serde_json::to_vec(json).ok()?;
                if !headers.keys().any(|k| k.eq_ignore_ascii_case("content-type")) {
                    headers.insert("Content-Type".to_string(), "application/json".to_string());
                }
                Some(bytes)
            }
            None => None,
        };

        Some(Request {
            method: self.method(),
            url,
            headers,
            body,
        })
    }
}

// RFC 9110 token characters.
fn is_header_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

// Visible ASCII, obs-text and HTAB. No other control bytes.
fn is_header_value(value: &str) -> bool {
    !value
        .bytes()
        .any(|b| (b < 0x20 && b != b'\t') || b == 0x7f)
}

/// A ready-made network descriptor generic over its model.
///
/// Immutable once built; the `with_*` methods consume and return `self`.
///
/// ```rust
/// use typed_fetch::resource::{HttpMethod, NetworkJsonResource, NetworkResource};
///
/// let resource = NetworkJsonResource::<Vec<String>>::new("https://api.example.com/tags")
///     .with_method(HttpMethod::Post)
///     .with_header("Accept", "application/json")
///     .with_query_item("page", "2")
///     .with_json_body(serde_json::json!({ "prefix": "rust" }));
///
/// let request = resource.build_request().unwrap();
/// assert_eq!(request.url.as_str(), "https://api.example.com/tags?page=2");
/// assert_eq!(request.headers["Content-Type"], "application/json");
/// ```
pub struct NetworkJsonResource<M> {
    url: String,
    method: HttpMethod,
    headers: Option<BTreeMap<String, String>>,
    query_items: Option<Vec<QueryItem>>,
    json_body: Option<serde_json::Value>,
    _model: PhantomData<fn() -> M>,
}

impl<M> NetworkJsonResource<M> {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: None,
            query_items: None,
            json_body: None,
            _model: PhantomData,
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_query_item(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_items
            .get_or_insert_with(Vec::new)
            .push(QueryItem::new(name, value));
        self
    }

    pub fn with_query_items(mut self, items: impl IntoIterator<Item = QueryItem>) -> Self {
        self.query_items.get_or_insert_with(Vec::new).extend(items);
        self
    }

    pub fn with_json_body(mut self, body: serde_json::Value) -> Self {
        self.json_body = Some(body);
        self
    }
}

impl<M> Clone for NetworkJsonResource<M> {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            method: self.method,
            headers: self.headers.clone(),
            query_items: self.query_items.clone(),
            json_body: self.json_body.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for NetworkJsonResource<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkJsonResource")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("query_items", &self.query_items)
            .field("json_body", &self.json_body)
            .finish()
    }
}

impl<M: DeserializeOwned + Send + 'static> Resource for NetworkJsonResource<M> {
    type Model = M;
}

impl<M: DeserializeOwned + Send + 'static> NetworkResource for NetworkJsonResource<M> {
    fn url(&self) -> &str {
        &self.url
    }

    fn method(&self) -> HttpMethod {
        self.method
    }

    fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    fn query_items(&self) -> Option<&[QueryItem]> {
        self.query_items.as_deref()
    }

    fn json_body(&self) -> Option<&serde_json::Value> {
        self.json_body.as_ref()
    }
}
