//! Related content: a pluggable scorer that ranks sibling posts against a target.
//!
//! Default: `OverlapScorer` (weighted tag / category / title-word overlap).
//! `AppState` holds an `Arc<dyn RelatedScorer>` so the ranking can be swapped
//! without touching handlers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::content::models::ContentItem;

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceWeights {
    pub shared_tag: u32,
    pub same_category: u32,
    pub title_word: u32,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            shared_tag: 3,
            same_category: 2,
            title_word: 1,
        }
    }
}

/// A candidate with its score, as returned by `related_posts`.
#[derive(Debug, Clone)]
pub struct RelatedPost<'a> {
    pub score: u32,
    pub post: &'a ContentItem,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

pub trait RelatedScorer: Send + Sync {
    fn score(&self, target: &ContentItem, candidate: &ContentItem) -> u32;
}

// ────────────────────────────────────────────────────────────────────────────
// OverlapScorer
// ────────────────────────────────────────────────────────────────────────────

/// Weighted-sum overlap scorer.
///
/// - `shared_tag` per tag in the intersection of both tag sets
/// - `same_category` when categories are exactly equal
/// - `title_word` per candidate title token found in the target title; a
///   token repeated in the candidate title scores each time
#[derive(Debug, Clone, Default)]
pub struct OverlapScorer {
    pub weights: RelevanceWeights,
}

impl RelatedScorer for OverlapScorer {
    fn score(&self, target: &ContentItem, candidate: &ContentItem) -> u32 {
        let target_tags: HashSet<&str> = target.tags.iter().map(String::as_str).collect();
        let candidate_tags: HashSet<&str> = candidate.tags.iter().map(String::as_str).collect();
        let shared_tags = target_tags.intersection(&candidate_tags).count() as u32;

        let category = u32::from(target.category == candidate.category);

        let target_words: HashSet<String> = title_tokens(&target.title).collect();
        let title_hits = title_tokens(&candidate.title)
            .filter(|w| target_words.contains(w))
            .count() as u32;

        shared_tags * self.weights.shared_tag
            + category * self.weights.same_category
            + title_hits * self.weights.title_word
    }
}

/// Lower-cased tokens split on non-word characters (anything but ASCII
/// alphanumerics and `_`). Accented letters count as separators.
fn title_tokens(title: &str) -> impl Iterator<Item = String> + '_ {
    title
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Ranks `pool` against the post whose slug is `target_slug`.
///
/// Returns an empty list when the target is not in the pool. The target is
/// excluded by slug, zero scores are dropped, and ties go to the more recent
/// effective date.
pub fn related_posts<'a>(
    scorer: &dyn RelatedScorer,
    target_slug: &str,
    pool: &[&'a ContentItem],
    limit: Option<usize>,
) -> Vec<RelatedPost<'a>> {
    let Some(target) = pool.iter().find(|p| p.slug == target_slug) else {
        return Vec::new();
    };

    let mut ranked: Vec<RelatedPost<'a>> = pool
        .iter()
        .filter(|p| p.slug != target.slug)
        .filter_map(|&post| {
            let score = scorer.score(target, post);
            (score > 0).then_some(RelatedPost { score, post })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.post.effective_date().cmp(a.post.effective_date()))
    });

    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
