//! Link icon assignment: tags outbound links with a small glyph for the kind
//! of resource they point at (PDFs, well-known sites).

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::preview::domains::{domain_of, domain_matches, LinkClassifier};

#[derive(Debug, Clone, Deserialize)]
pub struct LinkDescriptor {
    pub id: String,
    pub href: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkIcon {
    Pdf,
    Wikipedia,
    Arxiv,
    Github,
    Youtube,
    Twitter,
    Reddit,
    Archive,
    HackerNews,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IconAssignment {
    pub id: String,
    pub icon: LinkIcon,
}

const DOMAIN_ICONS: &[(&str, LinkIcon)] = &[
    ("wikipedia.org", LinkIcon::Wikipedia),
    ("arxiv.org", LinkIcon::Arxiv),
    ("github.com", LinkIcon::Github),
    ("youtube.com", LinkIcon::Youtube),
    ("youtu.be", LinkIcon::Youtube),
    ("twitter.com", LinkIcon::Twitter),
    ("x.com", LinkIcon::Twitter),
    ("reddit.com", LinkIcon::Reddit),
    ("archive.org", LinkIcon::Archive),
    ("news.ycombinator.com", LinkIcon::HackerNews),
];

/// PDFs get an icon wherever they live; other internal links never do.
pub fn icon_for(href: &str, classifier: &LinkClassifier) -> Option<LinkIcon> {
    if points_at_pdf(href) {
        return Some(LinkIcon::Pdf);
    }
    if classifier.is_internal(href) {
        return None;
    }
    let domain = domain_of(href);
    DOMAIN_ICONS
        .iter()
        .find(|(base, _)| domain_matches(&domain, base))
        .map(|(_, icon)| *icon)
}

/// Icons for the links that have one, in input order.
pub fn assign_icons(links: &[LinkDescriptor], classifier: &LinkClassifier) -> Vec<IconAssignment> {
    links
        .iter()
        .filter_map(|link| {
            icon_for(&link.href, classifier).map(|icon| IconAssignment {
                id: link.id.clone(),
                icon,
            })
        })
        .collect()
}

fn points_at_pdf(href: &str) -> bool {
    let path = match Url::parse(href) {
        Ok(url) => url.path().to_string(),
        // Relative: drop query and fragment by hand.
        Err(_) => href.split(['?', '#']).next().unwrap_or_default().to_string(),
    };
    path.to_ascii_lowercase().ends_with(".pdf")
}
