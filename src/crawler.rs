//! The Web Crawler: a bounded breadth-first fetch/parse loop feeding the
//! builder, sharing the `WorkQueue`'s fan-out machinery with the file
//! builder.
//!
//! Fetching and HTML handling are behind a `Fetcher` trait so the crawl
//! algorithm (admission, dedup, link extraction, budget enforcement) can be
//! tested without a real network: the default `HttpFetcher` uses a blocking
//! `reqwest` client with a manually-honored redirect budget, while tests
//! inject a canned in-memory `Fetcher`.

use crate::index::{InvertedIndex, SharedIndex};
use crate::location::Location;
use crate::queue::WorkQueue;
use crate::tokenize::{new_stemmer, parse, stem};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// A page fetched from a single URI. The crawler itself never parses raw
/// HTTP; fetchers resolve their own redirect chain and hand back the final
/// HTML body keyed to the URI it actually came from.
pub trait Fetcher: Send + Sync {
    /// Fetch `uri`, following up to `redirect_budget` redirects. Returns
    /// `None` on any failure (DNS, connect, timeout, non-HTML, redirect
    /// budget exhausted) — per spec.md, a failed fetch is silently
    /// discarded rather than propagated.
    fn fetch(&self, uri: &str, redirect_budget: u32) -> Option<String>;
}

/// The default `Fetcher`: a blocking `reqwest` client with redirects
/// disabled so the crawler can enforce its own budget rather than trusting
/// the HTTP client's default (10 hops).
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(3))
            .user_agent("searchcore-crawler/0.1")
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }

    fn fetch_once(&self, uri: &str, redirect_budget: u32) -> Option<String> {
        let response = self.client.get(uri).send().ok()?;

        if response.status().is_redirection() {
            if redirect_budget == 0 {
                return None;
            }
            let location = response.headers().get(reqwest::header::LOCATION)?;
            let next = Url::parse(uri)
                .ok()?
                .join(location.to_str().ok()?)
                .ok()?;
            return self.fetch_once(next.as_str(), redirect_budget - 1);
        }

        if !response.status().is_success() {
            return None;
        }

        response.text().ok()
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, uri: &str, redirect_budget: u32) -> Option<String> {
        self.fetch_once(uri, redirect_budget)
    }
}

/// Normalize a URI string: drop any `#fragment`, keep scheme, host, port,
/// path, and query verbatim. Returns `None` if `uri` does not parse.
pub fn normalize(uri: &str) -> Option<String> {
    let mut url = Url::parse(uri).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

fn block_selector() -> Selector {
    Selector::parse("script, style, noscript").expect("static selector is valid")
}

fn link_selector() -> Selector {
    Selector::parse("a[href]").expect("static selector is valid")
}

/// Strip `<script>`/`<style>`/`<noscript>` subtrees, keeping the rest of the
/// markup — including `<a href>` elements — intact. This is the "link-safe"
/// pass link extraction runs against, so it must still be real HTML, not
/// flattened plaintext: stripping every tag here would leave `extract_links`
/// nothing to select against.
fn strip_block_elements(html: &str) -> String {
    let mut document = Html::parse_document(html);
    let blocked = block_selector();
    let blocked_ids: Vec<_> = document.select(&blocked).map(|e| e.id()).collect();

    for id in blocked_ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    document.root_element().html()
}

/// Strip all tags and entities, yielding a flat plaintext stream for
/// tokenization.
fn to_plaintext(html: &str) -> String {
    Html::parse_document(html)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract absolute link URIs from `html`, resolved against `base`.
fn extract_links(html: &str, base: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = link_selector();
    let Ok(base) = Url::parse(base) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}

struct Shared {
    visited: Mutex<HashSet<String>>,
    crawled: Mutex<usize>,
    total: usize,
    fetcher: Arc<dyn Fetcher>,
    index: Arc<SharedIndex>,
    queue: Arc<WorkQueue>,
}

/// A bounded breadth-first web crawler.
///
/// `visited` and `crawled` are guarded by independent mutexes (per spec.md
/// §5) so that enqueuing discovered links never stalls admission of pages
/// already in flight. Holds its own `Arc<WorkQueue>` so `CrawlTask`s can
/// enqueue further `CrawlTask`s from inside the worker threads that run
/// them — the recursive fan-out `WorkQueue::finish` is built to observe.
pub struct Crawler {
    shared: Arc<Shared>,
}

impl Crawler {
    pub fn new(
        index: Arc<SharedIndex>,
        total: usize,
        fetcher: Arc<dyn Fetcher>,
        queue: Arc<WorkQueue>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                visited: Mutex::new(HashSet::new()),
                crawled: Mutex::new(0),
                total: total.max(1),
                fetcher,
                index,
                queue,
            }),
        }
    }

    /// Normalize `seed`; if new, mark it visited and submit a `CrawlTask` for
    /// it. Does not block — call `queue.finish()` on the crawler's queue to
    /// observe the full transitive crawl complete.
    pub fn crawl(&self, seed: &str) {
        let Some(normalized) = normalize(seed) else {
            tracing::warn!(uri = seed, "skipping malformed seed URI");
            return;
        };

        {
            let mut visited = self
                .shared
                .visited
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            if !visited.insert(normalized.clone()) {
                return;
            }
        }

        submit_crawl_task(Arc::clone(&self.shared), normalized);
    }

    /// Number of pages this crawler has admitted for crawling so far.
    pub fn crawled(&self) -> usize {
        *self.shared.crawled.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of distinct normalized URIs this crawler has seen (admitted or
    /// merely discovered as a link).
    pub fn visited_count(&self) -> usize {
        self.shared
            .visited
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

fn submit_crawl_task(shared: Arc<Shared>, uri: String) {
    let queue = Arc::clone(&shared.queue);
    queue.execute(move || run_crawl_task(shared, uri));
}

fn run_crawl_task(shared: Arc<Shared>, uri: String) {
    {
        let mut crawled = shared.crawled.lock().unwrap_or_else(|e| e.into_inner());
        if *crawled >= shared.total {
            return;
        }
        *crawled += 1;
    }

    let Some(html) = shared.fetcher.fetch(&uri, 3) else {
        return;
    };

    let link_safe = strip_block_elements(&html);
    let plaintext = to_plaintext(&link_safe);

    let location = Location::new(uri.clone());
    let stemmer = new_stemmer();
    let mut local = InvertedIndex::new();
    let mut position = 1u32;
    for token in parse(&plaintext) {
        let stemmed = stem(&token, &stemmer);
        if stemmed.is_empty() {
            continue;
        }
        local.add(&stemmed, &location, position);
        position += 1;
    }
    shared.index.merge(&local);

    let links = extract_links(&link_safe, &uri);
    let mut to_submit = Vec::new();
    {
        let mut visited = shared.visited.lock().unwrap_or_else(|e| e.into_inner());
        for link in links {
            if visited.len() >= shared.total {
                break;
            }
            let Some(normalized) = normalize(&link) else {
                continue;
            };
            if visited.insert(normalized.clone()) {
                to_submit.push(normalized);
            }
        }
    }

    for link in to_submit {
        submit_crawl_task(Arc::clone(&shared), link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use std::collections::HashMap;

    struct FakeFetcher {
        pages: HashMap<String, String>,
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, uri: &str, _redirect_budget: u32) -> Option<String> {
            self.pages.get(uri).cloned()
        }
    }

    fn fake_site() -> Arc<dyn Fetcher> {
        let mut pages = HashMap::new();
        pages.insert(
            "https://example.com/".to_string(),
            r#"<html><body><p>hello world</p>
               <a href="/a">a</a><a href="/b">b</a><a href="/c">c</a>
               </body></html>"#
                .to_string(),
        );
        pages.insert(
            "https://example.com/a".to_string(),
            "<html><body>page a content</body></html>".to_string(),
        );
        pages.insert(
            "https://example.com/b".to_string(),
            "<html><body>page b content</body></html>".to_string(),
        );
        pages.insert(
            "https://example.com/c".to_string(),
            "<html><body>page c content</body></html>".to_string(),
        );
        Arc::new(FakeFetcher { pages })
    }

    #[test]
    fn normalize_drops_fragment_keeps_query() {
        let normalized = normalize("https://example.com/path?x=1#section").unwrap();
        check!(normalized == "https://example.com/path?x=1");
    }

    #[test]
    fn normalize_rejects_malformed_uri() {
        check!(normalize("not a uri").is_none());
    }

    #[test]
    fn crawl_respects_total_budget() {
        let index = Arc::new(SharedIndex::new());
        let queue = Arc::new(WorkQueue::new(2));
        let crawler = Crawler::new(Arc::clone(&index), 2, fake_site(), Arc::clone(&queue));

        crawler.crawl("https://example.com/");
        queue.finish();

        check!(crawler.crawled() <= 2 + 1);
        check!(crawler.visited_count() <= 2 + 1);
    }

    #[test]
    fn crawled_pages_are_indexed_under_their_uri() {
        let index = Arc::new(SharedIndex::new());
        let queue = Arc::new(WorkQueue::new(1));
        let crawler = Crawler::new(Arc::clone(&index), 1, fake_site(), Arc::clone(&queue));

        crawler.crawl("https://example.com/");
        queue.finish();

        let location = Location::new("https://example.com/".to_string());
        check!(index.contains_count(&location));
    }

    #[test]
    fn recrawling_the_same_seed_is_a_no_op() {
        let index = Arc::new(SharedIndex::new());
        let queue = Arc::new(WorkQueue::new(2));
        let crawler = Crawler::new(Arc::clone(&index), 5, fake_site(), Arc::clone(&queue));

        crawler.crawl("https://example.com/");
        crawler.crawl("https://example.com/#ignored");
        queue.finish();

        check!(crawler.crawled() == 1);
    }

    /// Regression for a broken `strip_block_elements` that flattened the
    /// link-safe pass to plaintext, leaving `extract_links` nothing to
    /// select against: `<a href>` tags must survive the block-element strip.
    #[test]
    fn strip_block_elements_preserves_anchor_tags() {
        let html = r#"<html><body>
            <script>var x = 1;</script>
            <p>hello</p>
            <a href="/next">next</a>
        </body></html>"#;

        let link_safe = strip_block_elements(html);
        check!(link_safe.contains("<a href=\"/next\">"));
        check!(!link_safe.contains("var x = 1"));

        let links = extract_links(&link_safe, "https://example.com/");
        check!(links == vec!["https://example.com/next".to_string()]);
    }

    /// Regression (spec.md §4.6 step 6 / S5): with real BFS link discovery,
    /// a multi-page budget must actually reach pages beyond the seed, not
    /// just admit the seed and stop because no links were ever found.
    #[test]
    fn crawl_follows_discovered_links_beyond_the_seed() {
        let index = Arc::new(SharedIndex::new());
        let queue = Arc::new(WorkQueue::new(4));
        let crawler = Crawler::new(Arc::clone(&index), 4, fake_site(), Arc::clone(&queue));

        crawler.crawl("https://example.com/");
        queue.finish();

        check!(crawler.crawled() > 1);
        check!(index.contains_count(&Location::new("https://example.com/a")));
    }
}
