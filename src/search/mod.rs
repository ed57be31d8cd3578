//! Fuzzy search over post metadata
//!
//! Every post is scored against the query on three weighted fields (title,
//! summary, tags). Scores are distances: 0.0 is a perfect hit, 1.0 means
//! nothing matched. Candidates whose distance exceeds the configured
//! threshold are dropped.

use serde::Serialize;

use crate::config::SearchConfig;
use crate::content::PostMetadata;

/// Searchable field of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Summary,
    Tags,
}

impl SearchField {
    pub fn weight(self) -> f64 {
        match self {
            SearchField::Title => 1.0,
            SearchField::Summary => 0.8,
            SearchField::Tags => 0.6,
        }
    }
}

/// Field that contributed to a hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    pub field: SearchField,
    pub value: String,
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub item: PostMetadata,
    /// Distance in `[0, 1]`, lower is better
    pub score: f64,
    pub matches: Vec<SearchMatch>,
}

struct IndexedPost {
    meta: PostMetadata,
    title: String,
    summary: String,
    tags: Vec<String>,
}

/// Pre-normalized search corpus, in corpus order
pub struct SearchIndex {
    entries: Vec<IndexedPost>,
}

impl SearchIndex {
    /// Build an index; `posts` must already be in corpus order
    pub fn build<'a, I>(posts: I) -> Self
    where
        I: IntoIterator<Item = &'a PostMetadata>,
    {
        let entries = posts
            .into_iter()
            .map(|meta| IndexedPost {
                title: meta.title.to_lowercase(),
                summary: meta.summary.to_lowercase(),
                tags: meta.tags.iter().map(|t| t.to_lowercase()).collect(),
                meta: meta.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rank posts against `query`, best first.
    ///
    /// A blank query returns nothing. Equal scores keep corpus order.
    pub fn search(&self, query: &str, config: &SearchConfig) -> Vec<ScoredResult> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        let tokens = tokenize(&query);

        let mut results: Vec<ScoredResult> = self
            .entries
            .iter()
            .filter_map(|entry| score_entry(entry, &query, &tokens, config.threshold))
            .collect();

        results.sort_by(|a, b| a.score.total_cmp(&b.score));
        if let Some(limit) = config.limit {
            results.truncate(limit);
        }
        results
    }
}

fn score_entry(
    entry: &IndexedPost,
    query: &str,
    tokens: &[&str],
    threshold: f64,
) -> Option<ScoredResult> {
    let mut best = 0.0_f64;
    let mut matches = Vec::new();

    let mut consider = |field: SearchField, quality: f64, value: &str| {
        let weighted = field.weight() * quality;
        if weighted > 0.0 && 1.0 - weighted <= threshold {
            matches.push(SearchMatch {
                field,
                value: value.to_string(),
            });
        }
        best = best.max(weighted);
    };

    consider(
        SearchField::Title,
        field_quality(query, tokens, &entry.title),
        &entry.meta.title,
    );
    consider(
        SearchField::Summary,
        field_quality(query, tokens, &entry.summary),
        &entry.meta.summary,
    );

    let best_tag = entry
        .tags
        .iter()
        .enumerate()
        .map(|(i, tag)| (i, field_quality(query, tokens, tag)))
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((i, quality)) = best_tag {
        consider(SearchField::Tags, quality, &entry.meta.tags[i]);
    }

    let score = 1.0 - best;
    (score <= threshold && !matches.is_empty()).then(|| ScoredResult {
        item: entry.meta.clone(),
        score,
        matches,
    })
}

/// Best quality a field can reach without containing the whole query
const SCATTERED_CAP: f64 = 0.9;

/// How well `text` answers the query, in `[0, 1]`
fn field_quality(query: &str, tokens: &[&str], text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    if let Some(pos) = text.find(query) {
        let at_boundary = text[..pos]
            .chars()
            .next_back()
            .map(|c| !c.is_alphanumeric())
            .unwrap_or(true);
        return if at_boundary { 1.0 } else { 0.95 };
    }

    if tokens.is_empty() {
        return 0.0;
    }

    let words = tokenize(text);
    if words.is_empty() {
        return 0.0;
    }

    let total: f64 = tokens
        .iter()
        .map(|token| {
            words
                .iter()
                .map(|word| word_similarity(token, word))
                .fold(0.0, f64::max)
        })
        .sum();
    // Scattered words never outrank the query appearing verbatim
    (total / tokens.len() as f64).min(SCATTERED_CAP)
}

fn word_similarity(token: &str, word: &str) -> f64 {
    if token == word {
        1.0
    } else if word.starts_with(token) {
        0.9
    } else if word.contains(token) {
        0.8
    } else {
        let max_len = token.chars().count().max(word.chars().count());
        1.0 - levenshtein(token, word) as f64 / max_len as f64
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Edit distance over chars
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}
