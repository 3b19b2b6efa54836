//! Keyword relevance gate.
//!
//! An entry is kept when its title or summary mentions a keyword or a
//! priority entity, and no exclusion phrase vetoes it. Matching is plain
//! case-insensitive substring search, so phrases keep their spacing
//! (`"ev "` must not match "every").

use serde::{Deserialize, Serialize};
use tracing::debug;

/// How exclusion phrases veto an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionMode {
    /// Any single phrase present drops the entry.
    #[default]
    Any,
    /// Only drop when every phrase is present.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceRules {
    pub keywords: Vec<String>,
    pub priority_entities: Vec<String>,
    pub exclusion_phrases: Vec<String>,
    pub exclusion_mode: ExclusionMode,
}

/// Which rule sets fired for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceDecision {
    pub has_keyword: bool,
    pub has_priority_entity: bool,
    pub has_exclusion: bool,
}

impl RelevanceDecision {
    pub fn keep(&self) -> bool {
        (self.has_keyword || self.has_priority_entity) && !self.has_exclusion
    }
}

impl Default for RelevanceRules {
    fn default() -> Self {
        Self {
            keywords: to_owned(&[
                "oil", "crude", "brent", "wti", "lng", "natural gas", "jkm", "ttf",
                "henry hub", "power", "electricity", "gas-fired", "coal", "naphtha",
                "propane", "butane", "shale", "opec", "eia", "iea",
            ]),
            priority_entities: to_owned(&[
                "trafigura", "vitol", "gunvor", "jera", "glencore", "shell trading",
                "totalenergies", "bp trading", "mercuria", "cargill", "koch", "hartree",
            ]),
            exclusion_phrases: to_owned(&[
                "ethanol", "biofuel", "biodiesel", "renewable diesel", "corn", "solar",
                "wind", "battery", "ev ", "electric vehicle", "hydrogen", "carbon capture",
                "climate", "net zero", "paris agreement", "cop", "football", "nfl",
            ]),
            exclusion_mode: ExclusionMode::Any,
        }
    }
}

impl RelevanceRules {
    /// Lowercase every term and drop blanks and repeats, keeping first-seen order.
    /// Inner and trailing spaces are significant and left alone.
    pub fn normalized(self) -> Self {
        Self {
            keywords: clean_terms(self.keywords),
            priority_entities: clean_terms(self.priority_entities),
            exclusion_phrases: clean_terms(self.exclusion_phrases),
            exclusion_mode: self.exclusion_mode,
        }
    }

    /// True if the rules can ever keep anything.
    pub fn is_usable(&self) -> bool {
        !self.keywords.is_empty() || !self.priority_entities.is_empty()
    }

    pub fn evaluate(&self, title: &str, summary: &str) -> RelevanceDecision {
        let text = format!("{} {}", title, summary).to_lowercase();
        let contains = |term: &String| text.contains(term.as_str());

        let has_exclusion = if self.exclusion_phrases.is_empty() {
            false
        } else {
            match self.exclusion_mode {
                ExclusionMode::Any => self.exclusion_phrases.iter().any(contains),
                ExclusionMode::All => self.exclusion_phrases.iter().all(contains),
            }
        };

        RelevanceDecision {
            has_keyword: self.keywords.iter().any(contains),
            has_priority_entity: self.priority_entities.iter().any(contains),
            has_exclusion,
        }
    }

    /// Keep/drop decision. Depends on nothing but the two strings and the rules.
    pub fn is_relevant(&self, title: &str, summary: &str) -> bool {
        let decision = self.evaluate(title, summary);
        if decision.has_exclusion && (decision.has_keyword || decision.has_priority_entity) {
            debug!(title, "dropped by exclusion phrase");
        }
        decision.keep()
    }
}

fn to_owned(terms: &[&str]) -> Vec<String> {
    terms.iter().map(|t| t.to_string()).collect()
}

fn clean_terms(terms: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        if term.trim().is_empty() {
            continue;
        }
        let lowered = term.to_lowercase();
        if !out.contains(&lowered) {
            out.push(lowered);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(keywords: &[&str], entities: &[&str], exclusions: &[&str]) -> RelevanceRules {
        RelevanceRules {
            keywords: to_owned(keywords),
            priority_entities: to_owned(entities),
            exclusion_phrases: to_owned(exclusions),
            exclusion_mode: ExclusionMode::Any,
        }
    }

    #[test]
    fn keyword_or_entity_keeps() {
        let r = RelevanceRules::default();
        assert!(r.is_relevant("Brent climbs above $80", ""));
        assert!(r.is_relevant("Vitol books tanker", "freight desk expands"));
        assert!(!r.is_relevant("Local bakery opens", "bread and pastries"));
    }

    #[test]
    fn exclusion_wins_over_keyword() {
        let r = RelevanceRules::default();
        assert!(!r.is_relevant("Oil major bets on solar", ""));
        let d = r.evaluate("Oil major bets on solar", "");
        assert!(d.has_keyword);
        assert!(d.has_exclusion);
        assert!(!d.keep());
    }

    #[test]
    fn title_and_summary_are_both_searched() {
        let r = rules(&["lng"], &[], &["football"]);
        assert!(r.is_relevant("Cargo arrives", "first LNG shipment of winter"));
        assert!(!r.is_relevant("LNG cargo", "delayed by football traffic"));
    }

    #[test]
    fn all_mode_needs_every_phrase() {
        let mut r = rules(&["oil"], &[], &["solar", "wind"]);
        r.exclusion_mode = ExclusionMode::All;
        assert!(r.is_relevant("Oil and solar", ""));
        assert!(!r.is_relevant("Oil, solar and wind", ""));
    }

    #[test]
    fn empty_exclusions_never_veto_in_either_mode() {
        let mut r = rules(&["oil"], &[], &[]);
        assert!(r.is_relevant("oil", ""));
        r.exclusion_mode = ExclusionMode::All;
        assert!(r.is_relevant("oil", ""));
    }

    #[test]
    fn trailing_space_in_phrase_is_significant() {
        let r = RelevanceRules::default().normalized();
        // "every" must not trip the "ev " exclusion.
        assert!(r.is_relevant("Crude rises every week", ""));
        assert!(!r.is_relevant("Crude demand from ev fleets", ""));
    }

    #[test]
    fn normalized_lowercases_and_dedups() {
        let r = rules(&["Oil", "oil", "  ", "WTI"], &["Vitol"], &["EV "]).normalized();
        assert_eq!(r.keywords, vec!["oil".to_string(), "wti".to_string()]);
        assert_eq!(r.priority_entities, vec!["vitol".to_string()]);
        assert_eq!(r.exclusion_phrases, vec!["ev ".to_string()]);
    }

    #[test]
    fn decision_is_pure() {
        let r = RelevanceRules::default();
        let inputs = [("OPEC cuts output", "cartel"), ("Wind farm", "power"), ("", "")];
        let first: Vec<bool> = inputs.iter().map(|(t, s)| r.is_relevant(t, s)).collect();
        let second: Vec<bool> = inputs.iter().rev().map(|(t, s)| r.is_relevant(t, s)).collect();
        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
        assert_eq!(first, vec![true, false, false]);
    }
}
