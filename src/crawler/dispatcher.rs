//! Host-pattern dispatch table.
//!
//! The [`Dispatcher`] keeps an ordered list of `(host substring, constructor)`
//! routes. The first route whose pattern occurs in the URL's host wins; a
//! fresh crawler is constructed for every resolution.

use std::sync::Arc;

use tracing::debug;
use url::Url;

use super::{Bunkr, Crawler, Cyberdrop, DispatchError, Pixeldrain};
use crate::http::HttpClient;

/// Builds a crawler bound to the shared client.
pub type CrawlerFactory = Arc<dyn Fn(Arc<HttpClient>) -> Box<dyn Crawler> + Send + Sync>;

struct Route {
    pattern: String,
    name: &'static str,
    factory: CrawlerFactory,
}

/// Ordered host-substring to crawler table.
#[derive(Default)]
pub struct Dispatcher {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| (&r.pattern, r.name)))
            .finish()
    }
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher with the built-in hosts: cyberdrop, bunkr, pixeldrain.
    #[must_use]
    pub fn with_default_hosts() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register("cyberdrop", "cyberdrop", |client| {
            Box::new(Cyberdrop::new(client))
        });
        dispatcher.register("bunkr", "bunkr", |client| Box::new(Bunkr::new(client)));
        dispatcher.register("pixeldrain", "pixeldrain", |client| {
            Box::new(Pixeldrain::new(client))
        });
        dispatcher
    }

    /// Appends a route. Earlier routes take precedence.
    pub fn register<F>(&mut self, pattern: impl Into<String>, name: &'static str, factory: F)
    where
        F: Fn(Arc<HttpClient>) -> Box<dyn Crawler> + Send + Sync + 'static,
    {
        let pattern = pattern.into().to_ascii_lowercase();
        debug!(pattern = %pattern, name, "registering crawler");
        self.routes.push(Route {
            pattern,
            name,
            factory: Arc::new(factory),
        });
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Name of the route that would handle `url`, if any.
    #[must_use]
    pub fn route_name(&self, url: &Url) -> Option<&'static str> {
        self.find(url).map(|route| route.name)
    }

    /// Constructs the crawler for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::HostNotSupported`] carrying the exact URL when
    /// no route matches.
    pub fn resolve(
        &self,
        url: &Url,
        client: &Arc<HttpClient>,
    ) -> Result<Box<dyn Crawler>, DispatchError> {
        let route = self.find(url).ok_or_else(|| DispatchError::HostNotSupported {
            url: url.to_string(),
        })?;
        debug!(url = %url, crawler = route.name, "dispatched");
        Ok((route.factory)(Arc::clone(client)))
    }

    fn find(&self, url: &Url) -> Option<&Route> {
        let host = url.host_str()?.to_ascii_lowercase();
        self.routes
            .iter()
            .find(|route| host.contains(route.pattern.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::crawler::ScrapeError;
    use crate::http::ClientConfig;
    use crate::media::Media;

    struct Named(&'static str);

    #[async_trait]
    impl Crawler for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn get_media(&self, url: &Url) -> Result<Media, ScrapeError> {
            Err(ScrapeError::undefined_media_type(url.as_str(), ""))
        }
    }

    fn client() -> Arc<HttpClient> {
        Arc::new(HttpClient::new(ClientConfig::default()).unwrap())
    }

    #[test]
    fn test_default_hosts_registered_in_order() {
        let dispatcher = Dispatcher::with_default_hosts();
        assert_eq!(dispatcher.route_count(), 3);
    }

    #[test]
    fn test_cyberdrop_album_dispatches_to_cyberdrop() {
        let dispatcher = Dispatcher::with_default_hosts();
        let url = Url::parse("https://cyberdrop.example/a/xyz").unwrap();
        let crawler = dispatcher.resolve(&url, &client()).unwrap();
        assert_eq!(crawler.name(), "cyberdrop");
    }

    #[test]
    fn test_host_match_is_substring_and_case_insensitive() {
        let dispatcher = Dispatcher::with_default_hosts();
        let url = Url::parse("https://CDN.Bunkr.si/v/abc").unwrap();
        assert_eq!(dispatcher.route_name(&url), Some("bunkr"));
        let url = Url::parse("https://pixeldrain.com/u/abc").unwrap();
        assert_eq!(dispatcher.route_name(&url), Some("pixeldrain"));
    }

    #[test]
    fn test_unknown_host_carries_exact_url() {
        let dispatcher = Dispatcher::with_default_hosts();
        let url = Url::parse("https://unknown.example/a/xyz?p=1").unwrap();
        let err = dispatcher.resolve(&url, &client()).err().unwrap();
        assert_eq!(
            err,
            DispatchError::HostNotSupported {
                url: "https://unknown.example/a/xyz?p=1".to_string()
            }
        );
    }

    #[test]
    fn test_first_matching_route_wins() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.register("drop", "first", |_| Box::new(Named("first")));
        dispatcher.register("cyberdrop", "second", |_| Box::new(Named("second")));
        let url = Url::parse("https://cyberdrop.example/a/1").unwrap();
        let crawler = dispatcher.resolve(&url, &client()).unwrap();
        assert_eq!(crawler.name(), "first");
    }

    #[test]
    fn test_url_without_host_not_supported() {
        let dispatcher = Dispatcher::with_default_hosts();
        let url = Url::parse("file:///tmp/cyberdrop").unwrap();
        assert!(dispatcher.route_name(&url).is_none());
    }
}
