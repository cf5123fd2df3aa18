// Copyright (c) Microsoft. All rights reserved.

use std::io;
use std::net::IpAddr;

const HTTPS_PROXY_ENV_VARS: [&str; 2] = ["HTTPS_PROXY", "https_proxy"];
const NO_PROXY_ENV_VARS: [&str; 2] = ["NO_PROXY", "no_proxy"];

/// The outbound proxy for HTTPS requests to the cloud.
///
/// Only `https` destinations are proxied. Plain HTTP (the instance metadata service, App Service
/// identity endpoints), loopback and link-local hosts, and hosts listed in `NO_PROXY` are
/// always connected to directly.
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    uri: hyper::Uri,

    /// Lowercase host suffixes, or `*` for every host.
    no_proxy: Vec<String>,
}

impl ProxyConfig {
    pub fn new(uri: hyper::Uri) -> Self {
        ProxyConfig {
            uri,
            no_proxy: vec![],
        }
    }

    /// Adds the hosts of `list`, a comma-separated `NO_PROXY` value such as
    /// `localhost,.corp.contoso.com,10.0.0.4`
    #[must_use]
    pub fn with_no_proxy(mut self, list: &str) -> Self {
        self.no_proxy.extend(
            list.split(',')
                .map(|entry| {
                    let entry = entry.trim().to_ascii_lowercase();
                    match entry.strip_prefix("*.").or_else(|| entry.strip_prefix('.')) {
                        Some(suffix) => suffix.to_owned(),
                        None => entry,
                    }
                })
                .filter(|entry| !entry.is_empty()),
        );

        self
    }

    /// Reads `HTTPS_PROXY` and `NO_PROXY` (or their lowercase forms). `None` if no proxy is set.
    pub fn from_env() -> io::Result<Option<Self>> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> io::Result<Option<Self>> {
        let first_set = |names: [&str; 2]| {
            names
                .into_iter()
                .find_map(|name| var(name).filter(|value| !value.is_empty()))
        };

        let Some(uri) = first_set(HTTPS_PROXY_ENV_VARS) else {
            return Ok(None);
        };
        let uri = uri
            .parse::<hyper::Uri>()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        let mut config = ProxyConfig::new(uri);
        if let Some(no_proxy) = first_set(NO_PROXY_ENV_VARS) {
            config = config.with_no_proxy(&no_proxy);
        }

        log::info!(
            "Using HTTPS proxy server {} (bypassed for: {})",
            config.masked_uri()?,
            if config.no_proxy.is_empty() {
                "local hosts".to_owned()
            } else {
                config.no_proxy.join(", ")
            },
        );

        Ok(Some(config))
    }

    /// Whether a request to `scheme://host` is sent through the proxy.
    fn intercepts(&self, scheme: Option<&str>, host: Option<&str>) -> bool {
        let (Some("https"), Some(host)) = (scheme, host) else {
            return false;
        };
        let host = host.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase();

        if host == "localhost" {
            return false;
        }
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) if ip.is_loopback() || ip.is_link_local() => return false,
            Ok(IpAddr::V6(ip)) if ip.is_loopback() => return false,
            _ => (),
        }

        !self.no_proxy.iter().any(|entry| {
            entry == "*"
                || host == *entry
                || host
                    .strip_suffix(entry.as_str())
                    .map_or(false, |prefix| prefix.ends_with('.'))
        })
    }

    /// The proxy URI with its password, if any, replaced by asterisks.
    fn masked_uri(&self) -> io::Result<url::Url> {
        let mut uri = url::Url::parse(&self.uri.to_string())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

        if uri.password().is_some() {
            uri.set_password(Some("******")).map_err(|()| {
                io::Error::new(io::ErrorKind::InvalidInput, "could not mask proxy password")
            })?;
        }

        Ok(uri)
    }

    fn into_proxy(self) -> io::Result<hyper_proxy::Proxy> {
        let uri = url::Url::parse(&self.uri.to_string())
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        let decode = |value: &str| {
            percent_encoding::percent_decode_str(value)
                .decode_utf8()
                .map(std::borrow::Cow::into_owned)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
        };
        let credentials = if uri.username().is_empty() {
            None
        } else {
            Some((
                decode(uri.username())?,
                decode(uri.password().unwrap_or_default())?,
            ))
        };

        let proxy_uri = self.uri.clone();
        let intercept = hyper_proxy::Intercept::from(
            move |scheme: Option<&str>, host: Option<&str>, _port: Option<u16>| {
                self.intercepts(scheme, host)
            },
        );

        let mut proxy = hyper_proxy::Proxy::new(intercept, proxy_uri);
        if let Some((username, password)) = credentials {
            proxy.set_authorization(headers::Authorization::basic(&username, &password));
        }

        Ok(proxy)
    }
}

/// The connector for every request to the cloud: OpenSSL for `https` (plain `http` is still
/// allowed, for the instance metadata service), through `proxy` where it applies.
pub fn cloud_connector(proxy: Option<ProxyConfig>) -> io::Result<crate::CloudConnector> {
    let mut http_connector = hyper::client::HttpConnector::new();
    http_connector.enforce_http(false);

    let tls_connector = openssl::ssl::SslConnector::builder(openssl::ssl::SslMethod::tls())?;
    let https_connector =
        hyper_openssl::HttpsConnector::with_connector(http_connector, tls_connector)?;

    let mut connector = hyper_proxy::ProxyConnector::new(https_connector)?;
    if let Some(proxy) = proxy {
        connector.add_proxy(proxy.into_proxy()?);
    }

    Ok(connector)
}
