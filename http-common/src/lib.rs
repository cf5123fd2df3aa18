// Copyright (c) Microsoft. All rights reserved.

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::type_complexity
)]

mod backoff;
pub use backoff::{Backoff, DEFAULT_BACKOFF};

mod proxy;
pub use proxy::{cloud_connector, ProxyConfig};

mod request;
pub use request::{HttpRequest, HttpResponse};

/// See [`cloud_connector`].
pub type CloudConnector =
    hyper_proxy::ProxyConnector<hyper_openssl::HttpsConnector<hyper::client::HttpConnector>>;

/// Ref <https://url.spec.whatwg.org/#path-percent-encode-set>
pub const PATH_SEGMENT_ENCODE_SET: &percent_encoding::AsciiSet = &percent_encoding::CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`') // fragment percent-encode set
    .add(b'#')
    .add(b'?')
    .add(b'{')
    .add(b'}') // path percent-encode set
    .add(b'/')
    .add(b'%'); // a single segment, so neither may appear unescaped

/// Percent-encodes `segment` so that it can be used as exactly one path segment.
pub fn encode_path_segment(segment: &str) -> String {
    percent_encoding::utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    #[test]
    fn encode_path_segment() {
        assert_eq!("rg1", super::encode_path_segment("rg1"));
        assert_eq!("my%20store", super::encode_path_segment("my store"));
        assert_eq!("a%2Fb", super::encode_path_segment("a/b"));
        assert_eq!("a%3Fb%23c", super::encode_path_segment("a?b#c"));
        assert_eq!("100%25", super::encode_path_segment("100%"));
    }
}
