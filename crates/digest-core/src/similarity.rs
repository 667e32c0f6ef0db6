/// Content-similarity signal from positive feedback.
///
/// A TF-IDF model (lowercase unigrams and bigrams, English stop words dropped, smoothed IDF,
/// L2-normalized vectors) is fitted on the recent corpus. A candidate's similarity is its
/// highest cosine against any positively rated item. The result feeds
/// `scoring::rank_items` as a `url -> similarity` map.
///
/// Vectors are `BTreeMap`s so that dot products sum in a fixed order and identical input
/// always yields bit-identical scores.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::NewsItem;

const MAX_FEATURES: usize = 5000;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
        "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
        "between", "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down",
        "during", "each", "few", "for", "from", "further", "had", "has", "have", "having", "he",
        "her", "here", "hers", "herself", "him", "himself", "his", "how", "however", "i", "if",
        "in", "into", "is", "it", "its", "itself", "just", "me", "more", "most", "my",
        "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other",
        "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so",
        "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
        "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
        "up", "upon", "very", "was", "we", "were", "what", "when", "where", "which", "while",
        "who", "whom", "why", "will", "with", "within", "without", "would", "yet", "you",
        "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

type SparseVector = BTreeMap<String, f64>;

/// Fitted TF-IDF vocabulary.
#[derive(Debug, Clone)]
pub struct SimilarityModel {
    idf: HashMap<String, f64>,
}

fn item_text(item: &NewsItem) -> String {
    format!("{} {}", item.title, item.evidence).trim().to_string()
}

/// Unigrams then bigrams over stop-word-filtered tokens.
fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOP_WORDS.contains(t))
        .collect();

    let mut out: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    out.extend(tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1])));
    out
}

impl SimilarityModel {
    /// Fit on a corpus. `None` when no document has any usable term.
    pub fn fit(corpus: &[NewsItem]) -> Option<Self> {
        let docs: Vec<Vec<String>> = corpus
            .iter()
            .map(|item| terms(&item_text(item)))
            .filter(|t| !t.is_empty())
            .collect();
        if docs.is_empty() {
            return None;
        }

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_default() += 1;
            }
            for term in doc {
                *term_freq.entry(term.as_str()).or_default() += 1;
            }
        }

        let mut vocabulary: Vec<&str> = doc_freq.keys().copied().collect();
        if vocabulary.len() > MAX_FEATURES {
            vocabulary.sort_by(|a, b| term_freq[b].cmp(&term_freq[a]).then_with(|| a.cmp(b)));
            vocabulary.truncate(MAX_FEATURES);
        }

        let n = docs.len() as f64;
        let idf = vocabulary
            .into_iter()
            .map(|term| {
                let df = doc_freq[term] as f64;
                (term.to_string(), ((1.0 + n) / (1.0 + df)).ln() + 1.0)
            })
            .collect();

        debug!(documents = docs.len(), "fitted similarity model");
        Some(Self { idf })
    }

    fn vectorize(&self, text: &str) -> SparseVector {
        let mut vector = SparseVector::new();
        for term in terms(text) {
            if let Some(idf) = self.idf.get(&term) {
                *vector.entry(term).or_insert(0.0) += idf;
            }
        }
        let norm = vector.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            vector.values_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    a.iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum()
}

/// Similarity of each item to the positive history, keyed by item URL.
///
/// Cold start (no model or no positives) scores every item 0.0. An item whose URL is itself
/// a positive scores 0.0 so the feedback that produced it cannot promote it again.
pub fn compute_similarity_scores(
    model: Option<&SimilarityModel>,
    positives: &[NewsItem],
    items: &[NewsItem],
) -> HashMap<String, f64> {
    let Some(model) = model.filter(|_| !positives.is_empty()) else {
        return items.iter().map(|item| (item.url.clone(), 0.0)).collect();
    };

    let positive_urls: HashSet<&str> = positives.iter().map(|p| p.url.as_str()).collect();
    let positive_vectors: Vec<SparseVector> = positives
        .iter()
        .map(|p| model.vectorize(&item_text(p)))
        .collect();

    items
        .iter()
        .map(|item| {
            let score = if positive_urls.contains(item.url.as_str()) {
                0.0
            } else {
                let vector = model.vectorize(&item_text(item));
                positive_vectors
                    .iter()
                    .map(|p| cosine(&vector, p))
                    .fold(0.0_f64, f64::max)
                    .clamp(0.0, 1.0)
            };
            (item.url.clone(), score)
        })
        .collect()
}
