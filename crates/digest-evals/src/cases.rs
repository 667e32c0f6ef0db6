/// The fixed ranking case battery.
///
/// Cases are pure data: loading them reads no clock and no files. Every case labels its
/// items with the source `fixture`.
use std::path::{Path, PathBuf};

use digest_core::{RankConfig, SearchField};

pub const FIXTURE_SOURCE: &str = "fixture";

const BOOSTS: [f64; 5] = [1.0, 2.0, 3.0, 5.0, 8.0];
const HALF_LIVES: [f64; 6] = [3.0, 6.0, 12.0, 24.0, 72.0, 168.0];
const TIE_BREAK_REPEATS: usize = 24;

pub const KEYWORD_FIXTURE: &str = "case_keyword_boost.xml";
pub const RECENCY_FIXTURE: &str = "case_recency.xml";
pub const TITLE_VS_EVIDENCE_FIXTURE: &str = "case_title_vs_evidence.xml";
pub const TIE_BREAK_FIXTURE: &str = "case_tie_break.xml";
pub const SOURCE_WEIGHT_FIXTURE: &str = "case_source_weight.xml";

#[derive(Debug, Clone)]
pub struct EvalCase {
    pub case_id: String,
    pub fixture_path: PathBuf,
    pub source: String,
    pub expected_titles: Vec<String>,
    pub top_n: usize,
    pub cfg: RankConfig,
    /// Label items with their own `<source>` element when present
    pub use_item_source: bool,
}

/// Fixtures shipped with this crate.
pub fn bundled_fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join("evals")
}

fn titles(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

fn merger_boost(boost: f64, fields: &[SearchField]) -> RankConfig {
    RankConfig::default()
        .with_keyword_boosts([("merger", boost)])
        .with_search_fields(fields.iter().copied())
}

/// All 52 cases, in a fixed order.
pub fn load_cases(fixtures_dir: &Path) -> Vec<EvalCase> {
    let mut cases = Vec::with_capacity(52);
    let mut add = |case_id: String,
                   fixture: &str,
                   expected: &[&str],
                   top_n: usize,
                   cfg: RankConfig,
                   use_item_source: bool| {
        cases.push(EvalCase {
            case_id,
            fixture_path: fixtures_dir.join(fixture),
            source: FIXTURE_SOURCE.to_string(),
            expected_titles: titles(expected),
            top_n,
            cfg,
            use_item_source,
        });
    };

    // Keyword in the title outranks a newer item without it
    for boost in BOOSTS {
        add(
            format!("kw_merger_title_boost_{}", boost as u32),
            KEYWORD_FIXTURE,
            &["Company A announces merger talks", "Company B quarterly results"],
            2,
            merger_boost(boost, &[SearchField::Title]),
            false,
        );
    }

    for half_life in HALF_LIVES {
        add(
            format!("recency_half_life_{}", half_life as u32),
            RECENCY_FIXTURE,
            &["Newer item", "Older item"],
            2,
            RankConfig::default()
                .with_half_life_hours(half_life)
                .with_search_fields([SearchField::Title]),
            false,
        );
    }

    // search_fields decides which item the keyword lifts
    let x = "Company X quarterly results";
    let y = "Company Y announces merger talks";
    let z = "Company Z product launch";
    for boost in BOOSTS {
        let b = boost as u32;
        add(
            format!("title_only_merger_boost_{b}"),
            TITLE_VS_EVIDENCE_FIXTURE,
            &[y, x, z],
            3,
            merger_boost(boost, &[SearchField::Title]),
            false,
        );
        add(
            format!("evidence_only_merger_boost_{b}"),
            TITLE_VS_EVIDENCE_FIXTURE,
            &[x, y, z],
            3,
            merger_boost(boost, &[SearchField::Evidence]),
            false,
        );
        add(
            format!("both_fields_merger_boost_{b}"),
            TITLE_VS_EVIDENCE_FIXTURE,
            &[x, y, z],
            3,
            merger_boost(boost, &[SearchField::Title, SearchField::Evidence]),
            false,
        );
    }

    // Same score, same timestamp: repeated to catch any nondeterminism
    for i in 1..=TIE_BREAK_REPEATS {
        add(
            format!("tie_break_order_{i}"),
            TIE_BREAK_FIXTURE,
            &["Item A", "Item B"],
            2,
            RankConfig::default().with_search_fields([SearchField::Title]),
            false,
        );
    }

    // Items carry equal relevance through the shared "article" topic, so only the
    // per-source weight separates them.
    let high = "Article from HighWeight source";
    let default = "Article from DefaultWeight source";
    let low = "Article from LowWeight source";
    add(
        "source_weight_high_beats_default".to_string(),
        SOURCE_WEIGHT_FIXTURE,
        &[high, default, low],
        3,
        RankConfig::default()
            .with_topics(["article"])
            .with_source_weights([("highweight", 2.0), ("defaultweight", 1.0), ("lowweight", 0.5)])
            .with_search_fields([SearchField::Title]),
        true,
    );
    add(
        "source_weight_inverted".to_string(),
        SOURCE_WEIGHT_FIXTURE,
        &[low, default, high],
        3,
        RankConfig::default()
            .with_topics(["article"])
            .with_source_weights([("highweight", 0.5), ("defaultweight", 1.0), ("lowweight", 2.0)])
            .with_search_fields([SearchField::Title]),
        true,
    );

    cases
}
