//! Slug derivation shared by category routes, the loader and series URLs.
//!
//! Categories are matched by `category_slug` at both write and read time, so
//! the two must never diverge. Two categories that differ only in case or
//! whitespace collapse to one slug; the loader warns about that when it sees it.

/// Lower-cases and replaces each whitespace run with a single `-`.
///
/// `category_slug("Tech News") == "tech-news"`, and applying it to its own
/// output is a no-op.
pub fn category_slug(category: &str) -> String {
    let mut slug = String::with_capacity(category.len());
    let mut in_space = false;
    for ch in category.chars() {
        if ch.is_whitespace() {
            if !in_space {
                slug.push('-');
            }
            in_space = true;
        } else {
            slug.extend(ch.to_lowercase());
            in_space = false;
        }
    }
    slug
}

/// Title-cases a hyphenated slug for display: `tech-news` -> `Tech News`.
pub fn display_name(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
