//! Link classification: which domain a URL points at, whether it is internal
//! to the site, and whether it may be previewed at all.

use reqwest::Url;

use crate::preview::preferences::PreviewMode;

#[derive(Debug, Clone, Copy)]
pub struct BannedDomain {
    pub name: &'static str,
    pub domain: &'static str,
}

/// Domains that refuse to render inside a frame (or that we never want
/// embedded). Subdomains are banned along with the listed domain.
pub const BANNED_DOMAINS: &[BannedDomain] = &[
    BannedDomain { name: "Amazon", domain: "amazon.com" },
    BannedDomain { name: "Oxford English Dictionary", domain: "oed.com" },
    BannedDomain { name: "Github", domain: "github.com" },
    BannedDomain { name: "Youtube", domain: "youtube.com" },
    BannedDomain { name: "Localhost", domain: "localhost" },
    BannedDomain { name: "Hetzner", domain: "hetzner.com" },
    BannedDomain { name: "Substack", domain: "substack.com" },
    BannedDomain { name: "Stripe", domain: "stripe.com" },
    BannedDomain { name: "TikTok", domain: "tiktok.com" },
    BannedDomain { name: "Medium", domain: "medium.com" },
];

/// Host of `url` without a leading `www.`. Unparsable input is returned as is.
pub fn domain_of(url: &str) -> String {
    match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
        Some(host) => host.strip_prefix("www.").unwrap_or(&host).to_string(),
        None => url.to_string(),
    }
}

/// `domain` is `base` or one of its subdomains.
pub fn domain_matches(domain: &str, base: &str) -> bool {
    domain == base
        || domain
            .strip_suffix(base)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

pub fn banned_domain(url: &str) -> Option<&'static BannedDomain> {
    let domain = domain_of(url);
    BANNED_DOMAINS
        .iter()
        .find(|b| domain_matches(&domain, b.domain))
}

pub fn is_banned(url: &str) -> bool {
    banned_domain(url).is_some()
}

/// `href` values that are not navigable links at all.
pub fn is_non_link(href: &str) -> bool {
    let href = href.trim();
    href.is_empty() || href == "#" || href.to_ascii_lowercase().starts_with("javascript:")
}

/// Decides internal vs external relative to the site's own host.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    site_host: String,
}

impl LinkClassifier {
    pub fn new(site_host: impl Into<String>) -> Self {
        Self {
            site_host: site_host.into(),
        }
    }

    /// Relative links, fragments and same-host URLs are internal. Anything
    /// that fails to parse is assumed internal too.
    pub fn is_internal(&self, url: &str) -> bool {
        if ["/", "#", "./", "../"].iter().any(|p| url.starts_with(p)) {
            return true;
        }
        match Url::parse(url) {
            Ok(parsed) => parsed.host_str() == Some(self.site_host.as_str()),
            Err(_) => true,
        }
    }

    /// Banned domains never preview. Otherwise internal links need mode
    /// `all` and external links need anything but `off`.
    pub fn previewable(&self, url: &str, mode: PreviewMode) -> bool {
        if is_non_link(url) || is_banned(url) {
            return false;
        }
        if self.is_internal(url) {
            mode == PreviewMode::All
        } else {
            mode != PreviewMode::Off
        }
    }
}
