//! Category-distribution recommendation engine.
//!
//! # Responsibility
//! - Select entries inside a recent time window.
//! - Build a dense per-category histogram and rank it.
//! - Derive three proposals steering toward the least-attended category.
//!
//! # Invariants
//! - Read-only: the engine never writes the cache or the queue.
//! - Every fixed category appears in the histogram, even with count 0.
//! - Ranking is a stable descending sort; ties keep canonical category order.
//! - Entries with unparsable dates are treated as epoch 0.

use crate::clock::{Clock, DAY_MS, SYSTEM_CLOCK};
use crate::kv::KeyValueStore;
use crate::model::category::Category;
use crate::model::record::Entry;
use crate::repo::cache_repo::CacheRepository;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Window length used when callers have no preference.
pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Fixed reflective-journaling category for proposal B.
pub const REFLECTION_CATEGORY: Category = Category::MindMental;

const TITLE_TOUCH: &str = "Touch it for one minute";
const TITLE_RESET: &str = "Three minutes to reset perception";
const TITLE_BLIND_SPOT: &str = "One-line blind-spot memo";
const BOOTSTRAP_NOTE: &str = "Not enough logs yet; provisional suggestions.";

const NAIVE_DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// One suggested action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub title: String,
    pub body: String,
    /// Effort estimate in minutes.
    pub minutes: u32,
    pub cat: Category,
}

/// Diagnostic fields returned alongside proposals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    /// Most frequent recent category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift: Option<Category>,
    /// Category the proposals steer toward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Category>,
    /// Entries inside the window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Set only for the empty-history bootstrap set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Proposal triplet labeled A/B/C.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalSet {
    #[serde(rename = "A")]
    pub a: Proposal,
    #[serde(rename = "B")]
    pub b: Proposal,
    #[serde(rename = "C")]
    pub c: Proposal,
    pub meta: ProposalMeta,
}

impl ProposalSet {
    pub fn get(&self, choice: ProposalChoice) -> &Proposal {
        match choice {
            ProposalChoice::A => &self.a,
            ProposalChoice::B => &self.b,
            ProposalChoice::C => &self.c,
        }
    }

    /// Whether this is the empty-history bootstrap set.
    pub fn is_bootstrap(&self) -> bool {
        self.meta.note.is_some()
    }
}

/// Label of one proposal in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProposalChoice {
    #[default]
    A,
    B,
    C,
}

impl ProposalChoice {
    /// Parses `A`/`B`/`C` case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }

    /// Parses a choice, falling back to `A` for empty or unknown input.
    pub fn parse_or_default(value: &str) -> Self {
        if value.trim().is_empty() {
            return Self::default();
        }
        Self::parse(value).unwrap_or_else(|| {
            warn!("event=proposal_choice module=service status=fallback choice=A");
            Self::default()
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }
}

impl Display for ProposalChoice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dense per-category histogram plus its ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    counts: [usize; Category::COUNT],
    sorted: Vec<(Category, usize)>,
}

impl CategorySummary {
    pub fn count(&self, category: Category) -> usize {
        self.counts[category.index()]
    }

    /// Counts in canonical category order.
    pub fn by_category(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        Category::ALL
            .into_iter()
            .map(|category| (category, self.count(category)))
    }

    /// Categories by descending count; ties keep canonical order.
    pub fn sorted(&self) -> &[(Category, usize)] {
        &self.sorted
    }

    /// Most frequent category.
    pub fn top(&self) -> (Category, usize) {
        self.sorted
            .first()
            .copied()
            .unwrap_or((Category::Other, 0))
    }

    /// Least frequent category other than `Other`.
    ///
    /// Scans the ranking from the end, so among equally rare categories the
    /// last one in canonical order wins.
    pub fn bottom(&self) -> (Category, usize) {
        self.sorted
            .iter()
            .rev()
            .find(|(category, _)| *category != Category::Other)
            .copied()
            .unwrap_or((Category::Other, 0))
    }
}

/// Counts entries per category, folding unknown categories into `Other`.
pub fn summarize(entries: &[Entry]) -> CategorySummary {
    let mut counts = [0usize; Category::COUNT];
    for entry in entries {
        counts[entry.aggregation_category().index()] += 1;
    }

    let mut sorted: Vec<(Category, usize)> = Category::ALL
        .into_iter()
        .map(|category| (category, counts[category.index()]))
        .collect();
    sorted.sort_by(|left, right| right.1.cmp(&left.1));

    CategorySummary { counts, sorted }
}

/// Parses an entry date into epoch milliseconds.
///
/// Accepts RFC 3339 timestamps, offset-less date-times (read in the local
/// time zone) and plain `YYYY-MM-DD` dates (UTC midnight). A local time
/// skipped by a DST transition does not parse; a repeated one takes the
/// earlier instant.
pub fn parse_entry_date_ms(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.timestamp_millis());
    }
    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Local
                .from_local_datetime(&parsed)
                .earliest()
                .map(|local| local.timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp_millis())
}

/// Keeps entries dated at or after `now_ms - days`.
pub fn filter_recent(entries: Vec<Entry>, days: u32, now_ms: i64) -> Vec<Entry> {
    let cutoff = now_ms.saturating_sub(i64::from(days).saturating_mul(DAY_MS));
    entries
        .into_iter()
        .filter(|entry| entry.date().and_then(parse_entry_date_ms).unwrap_or(0) >= cutoff)
        .collect()
}

/// Builds proposals from entries already restricted to the window.
pub fn propose_from(recent: &[Entry], days: u32, focus_category: &str) -> ProposalSet {
    if recent.is_empty() {
        return bootstrap_proposals();
    }

    let summary = summarize(recent);
    let drift = summary.top().0;
    let target = Category::parse(focus_category).unwrap_or(summary.bottom().0);

    ProposalSet {
        a: Proposal {
            title: TITLE_TOUCH.to_string(),
            body: format!(
                "Over the last {days} days \"{drift}\" dominated. Spend one minute on {target} today to pull the balance back a little.\nExample: do one tiny {target} action and log it."
            ),
            minutes: 1,
            cat: target,
        },
        b: Proposal {
            title: TITLE_RESET.to_string(),
            body: format!(
                "Turn the recent trend into a note, then into action.\n1) Frequent category lately: {drift}\n2) Missing category: {target}\n3) Smallest step for today: one\nWrite this in three minutes."
            ),
            minutes: 3,
            cat: REFLECTION_CATEGORY,
        },
        c: Proposal {
            title: TITLE_BLIND_SPOT.to_string(),
            body: format!(
                "Write one line on why {target} keeps thinning out (e.g. time, energy, priority, friction).\nSave it and hand it to tomorrow's you."
            ),
            minutes: 2,
            cat: target,
        },
        meta: ProposalMeta {
            days: Some(days),
            drift: Some(drift),
            target: Some(target),
            count: Some(recent.len()),
            note: None,
        },
    }
}

/// Fixed proposals for a user with no recent history.
pub fn bootstrap_proposals() -> ProposalSet {
    ProposalSet {
        a: Proposal {
            title: TITLE_TOUCH.to_string(),
            body: "There is nothing to predict from without logs. Add one step on the today page and come back.".to_string(),
            minutes: 1,
            cat: Category::Other,
        },
        b: Proposal {
            title: TITLE_RESET.to_string(),
            body: "Write three lines: your current mood and the condition blocking you most right now.".to_string(),
            minutes: 3,
            cat: REFLECTION_CATEGORY,
        },
        c: Proposal {
            title: TITLE_BLIND_SPOT.to_string(),
            body: "Write one line about today's stumbling condition and save it.".to_string(),
            minutes: 2,
            cat: REFLECTION_CATEGORY,
        },
        meta: ProposalMeta {
            note: Some(BOOTSTRAP_NOTE.to_string()),
            ..ProposalMeta::default()
        },
    }
}

/// Read-only engine over the current cache snapshot.
pub struct RecommendationEngine<'s, S: KeyValueStore + ?Sized> {
    cache: CacheRepository<'s, S>,
    clock: &'s dyn Clock,
}

impl<'s, S: KeyValueStore + ?Sized> RecommendationEngine<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self::with_clock(store, &SYSTEM_CLOCK)
    }

    pub fn with_clock(store: &'s S, clock: &'s dyn Clock) -> Self {
        Self {
            cache: CacheRepository::with_clock(store, clock),
            clock,
        }
    }

    /// Entries dated within the last `days` days, inclusive of the edge.
    pub fn recent_entries(&self, days: u32) -> Vec<Entry> {
        let entries = self.cache.load().entries;
        let total = entries.len();
        let recent = filter_recent(entries, days, self.clock.now_ms());
        debug!(
            "event=recent_entries module=service status=ok days={} total={} recent={}",
            days,
            total,
            recent.len()
        );
        recent
    }

    /// Histogram of the last `days` days.
    pub fn summarize_recent(&self, days: u32) -> CategorySummary {
        summarize(&self.recent_entries(days))
    }

    /// Builds the A/B/C proposal set for the last `days` days.
    ///
    /// A valid `focus_category` overrides the computed least-attended target;
    /// anything else, including an empty string, is ignored.
    pub fn propose(&self, days: u32, focus_category: &str) -> ProposalSet {
        let recent = self.recent_entries(days);
        let proposals = propose_from(&recent, days, focus_category);
        match (&proposals.meta.target, &proposals.meta.drift) {
            (Some(target), Some(drift)) => info!(
                "event=propose module=service status=ok days={} count={} drift={} target={}",
                days,
                recent.len(),
                drift,
                target
            ),
            _ => info!("event=propose module=service status=bootstrap days={days}"),
        }
        proposals
    }
}

#[cfg(test)]
mod tests {
    use super::{
        filter_recent, parse_entry_date_ms, propose_from, summarize, ProposalChoice,
    };
    use crate::model::category::Category;
    use crate::model::record::Entry;
    use chrono::{Local, NaiveDate, TimeZone};

    fn entry(date: &str, category: &str) -> Entry {
        Entry::new(format!("{date}-{category}"), date, "09:00", "", category)
    }

    #[test]
    fn summarize_is_dense_and_ranks_stably() {
        let entries = vec![
            entry("2026-10-01", "Health"),
            entry("2026-10-01", "Work"),
            entry("2026-10-01", "Health"),
            entry("2026-10-01", "Work"),
        ];
        let summary = summarize(&entries);

        assert_eq!(summary.by_category().count(), 9);
        assert_eq!(summary.count(Category::Money), 0);
        // Work precedes Health canonically, so it wins the tie.
        assert_eq!(summary.sorted()[0], (Category::Work, 2));
        assert_eq!(summary.sorted()[1], (Category::Health, 2));
        assert_eq!(summary.sorted()[2], (Category::Family, 0));
    }

    #[test]
    fn bottom_skips_other_and_prefers_last_tied_category() {
        let summary = summarize(&[entry("2026-10-01", "Work")]);
        assert_eq!(summary.top(), (Category::Work, 1));
        assert_eq!(summary.bottom(), (Category::MindMental, 0));
    }

    #[test]
    fn unknown_categories_count_as_other_without_rewriting() {
        let entries = vec![entry("2026-10-01", "Gardening")];
        let summary = summarize(&entries);
        assert_eq!(summary.count(Category::Other), 1);
        assert_eq!(entries[0].category(), Some("Gardening"));
    }

    #[test]
    fn parse_entry_date_accepts_supported_shapes() {
        assert_eq!(parse_entry_date_ms("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_entry_date_ms("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(parse_entry_date_ms("1970-01-01T00:00:00.250+00:00"), Some(250));
        assert_eq!(parse_entry_date_ms("2026-10-16X"), None);
        assert_eq!(parse_entry_date_ms("yesterday"), None);
        assert_eq!(parse_entry_date_ms(""), None);
    }

    #[test]
    fn offset_less_date_times_are_local() {
        let naive = NaiveDate::from_ymd_opt(2026, 10, 16)
            .and_then(|date| date.and_hms_milli_opt(8, 30, 0, 250))
            .unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .timestamp_millis();

        assert_eq!(parse_entry_date_ms("2026-10-16T08:30:00.250"), Some(expected));
        assert_eq!(
            parse_entry_date_ms("2026-10-16T08:30"),
            Some(expected - 250)
        );
    }

    #[test]
    fn filter_recent_drops_unparsable_and_non_string_dates() {
        let entries = vec![
            entry("garbage", "Work"),
            entry("1970-01-11", "Work"),
            Entry::from_value(serde_json::json!({"id": "n", "date": 20261016})),
        ];
        let recent = filter_recent(entries, 1, 10 * 86_400_000 + 5);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].date(), Some("1970-01-11"));
    }

    #[test]
    fn propose_from_tags_a_and_c_with_target_and_b_with_reflection() {
        let entries = vec![entry("2026-10-01", "Work"), entry("2026-10-01", "Work")];
        let set = propose_from(&entries, 7, "");

        assert_eq!(set.meta.drift, Some(Category::Work));
        assert_eq!(set.meta.target, Some(Category::MindMental));
        assert_eq!(set.meta.count, Some(2));
        assert_eq!((set.a.minutes, set.b.minutes, set.c.minutes), (1, 3, 2));
        assert_eq!(set.a.cat, Category::MindMental);
        assert_eq!(set.b.cat, Category::MindMental);
        assert_eq!(set.c.cat, Category::MindMental);
        assert!(set.a.body.contains("\"Work\""));
    }

    #[test]
    fn invalid_focus_is_ignored() {
        let entries = vec![entry("2026-10-01", "Work")];
        let set = propose_from(&entries, 7, "Sleeping");
        assert_eq!(set.meta.target, Some(Category::MindMental));
    }

    #[test]
    fn choice_parsing_falls_back_to_a() {
        assert_eq!(ProposalChoice::parse(" b "), Some(ProposalChoice::B));
        assert_eq!(ProposalChoice::parse("D"), None);
        assert_eq!(ProposalChoice::parse_or_default(""), ProposalChoice::A);
        assert_eq!(ProposalChoice::parse_or_default("z"), ProposalChoice::A);
        assert_eq!(ProposalChoice::parse_or_default("c"), ProposalChoice::C);
    }
}
