// Named Entity Extraction
// Gazetteer + pattern + capitalization recognizer behind the `EntityExtractor` trait
//
// Two passes:
// 1. gazetteer phrases and regex patterns (money, percent, date, ordinal, cardinal),
//    overlaps resolved earliest-start then longest
// 2. title-case runs over the tokens the first pass left uncovered

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::NamedEntity;
use crate::services::model_store::ModelError;
use crate::services::text_processor::{is_sentence_start, tokenize, Token};

pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<NamedEntity>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gazetteer {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub version: String,
    /// label -> surface forms, matched case-sensitively
    pub phrases: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub org_cues: Vec<String>,
    #[serde(default)]
    pub location_cues: Vec<String>,
    #[serde(default)]
    pub stopwords: Vec<String>,
    #[serde(default)]
    pub decorative: Vec<String>,
    #[serde(default)]
    pub connectors: Vec<String>,
}

const MONTHS: &str = "January|February|March|April|June|July|August|September|October|November|December";
const NUMBER: &str = r"[0-9]+(?:,[0-9]+)*(?:\.[0-9]+)?";

fn pattern_sources() -> Vec<(&'static str, String)> {
    vec![
        (
            "MONEY",
            format!(
                r"(?:[$₹€£]\s?|\b(?:Rs\.?|INR|USD)\s?){n}(?:\s+(?i:crore|lakh|million|billion|trillion))?|\b{n}(?:\s+(?i:million|billion|trillion|lakh|crore))?\s+(?i:rupees|dollars|euros|pounds)\b|\b{n}\s+(?i:crore|lakh)\b",
                n = NUMBER
            ),
        ),
        (
            "PERCENT",
            format!(r"\b{n}(?:\s*%|\s+(?i:percent|per\s+cent)\b)", n = NUMBER),
        ),
        (
            "DATE",
            format!(
                r"\b(?:(?:{m})(?:\s+[0-9]{{1,2}}(?:st|nd|rd|th)?)?(?:,?\s+[0-9]{{4}})?|May(?:\s+[0-9]{{1,2}}(?:st|nd|rd|th)?)?,?\s+[0-9]{{4}}|May\s+[0-9]{{1,2}}(?:st|nd|rd|th)?|[0-9]{{1,2}}(?:st|nd|rd|th)?\s+(?:{m}|May)(?:,?\s+[0-9]{{4}})?|Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday|(?i:today|tonight|tomorrow|yesterday)|(?i:(?:this|next|last|coming|previous)\s+(?:year|month|week|decade|century|session))|(?:1[0-9]{{3}}|20[0-9]{{2}})s?)\b",
                m = MONTHS
            ),
        ),
        (
            "ORDINAL",
            r"(?i:\b(?:first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth)\b)|\b[0-9]+(?:st|nd|rd|th)\b"
                .to_string(),
        ),
        (
            "CARDINAL",
            r"\b[0-9]+(?:[.,][0-9]+)*\b|(?i:\b(?:two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|twenty|thirty|forty|fifty|sixty|seventy|eighty|ninety|hundred|thousand|million|billion|lakh|crore|dozens?|hundreds|thousands|millions|billions)\b)"
                .to_string(),
        ),
    ]
}

#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    end: usize,
    label: String,
    /// Lower wins when start and length tie.
    priority: usize,
}

pub struct GazetteerEntityExtractor {
    phrase_re: Option<Regex>,
    phrase_labels: HashMap<String, String>,
    patterns: Vec<(&'static str, Regex)>,
    /// Tokenized titles, longest first
    titles: Vec<Vec<String>>,
    title_words: HashSet<String>,
    org_cues: HashSet<String>,
    location_cues: HashSet<String>,
    stopwords: HashSet<String>,
    decorative: HashSet<String>,
    connectors: HashSet<String>,
    version: String,
}

fn to_set(items: Vec<String>) -> HashSet<String> {
    items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

impl GazetteerEntityExtractor {
    pub fn new(gazetteer: Gazetteer) -> Result<Self, ModelError> {
        let mut phrase_labels = HashMap::new();
        for (label, phrases) in gazetteer.phrases {
            for phrase in phrases {
                let phrase = phrase.trim().to_string();
                if phrase.is_empty() {
                    continue;
                }
                phrase_labels.entry(phrase).or_insert_with(|| label.clone());
            }
        }

        // Longest first so alternation prefers "Indian Ocean" over "Indian"
        let mut surface: Vec<&String> = phrase_labels.keys().collect();
        surface.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let phrase_re = if surface.is_empty() {
            None
        } else {
            let alternation = surface
                .iter()
                .map(|p| regex::escape(p))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!(r"\b(?:{})\b", alternation))
                .map_err(|e| ModelError::Invalid(format!("gazetteer phrases: {}", e)))?;
            Some(re)
        };

        let mut patterns = Vec::new();
        for (label, source) in pattern_sources() {
            let re = Regex::new(&source)
                .map_err(|e| ModelError::Invalid(format!("{} pattern: {}", label, e)))?;
            patterns.push((label, re));
        }

        let mut titles: Vec<Vec<String>> = gazetteer
            .titles
            .iter()
            .map(|t| t.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|t| !t.is_empty())
            .collect();
        titles.sort_by(|a, b| b.len().cmp(&a.len()));
        let title_words = titles.iter().flatten().cloned().collect();

        Ok(Self {
            phrase_re,
            phrase_labels,
            patterns,
            titles,
            title_words,
            org_cues: to_set(gazetteer.org_cues),
            location_cues: to_set(gazetteer.location_cues),
            stopwords: to_set(gazetteer.stopwords),
            decorative: to_set(gazetteer.decorative),
            connectors: to_set(gazetteer.connectors),
            version: gazetteer.version,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    fn known_spans(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if let Some(re) = &self.phrase_re {
            for m in re.find_iter(text) {
                if let Some(label) = self.phrase_labels.get(m.as_str()) {
                    candidates.push(Candidate {
                        start: m.start(),
                        end: m.end(),
                        label: label.clone(),
                        priority: 0,
                    });
                }
            }
        }

        for (idx, (label, re)) in self.patterns.iter().enumerate() {
            for m in re.find_iter(text) {
                candidates.push(Candidate {
                    start: m.start(),
                    end: m.end(),
                    label: label.to_string(),
                    priority: idx + 1,
                });
            }
        }

        candidates.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then((b.end - b.start).cmp(&(a.end - a.start)))
                .then(a.priority.cmp(&b.priority))
        });

        let mut accepted: Vec<Candidate> = Vec::new();
        let mut last_end = 0usize;
        for c in candidates {
            if accepted.is_empty() || c.start >= last_end {
                last_end = c.end;
                accepted.push(c);
            }
        }
        accepted
    }

    /// Whitespace joins words in a run; a period also joins after a title or an initial.
    fn joinable_gap(&self, gap: &str, prev: &str) -> bool {
        if gap.is_empty() {
            return false;
        }
        let is_blank = |s: &str| !s.is_empty() && s.chars().all(|c| c == ' ' || c == '\t');
        if is_blank(gap) {
            return true;
        }
        if let Some(rest) = gap.strip_prefix('.') {
            let is_initial = prev.len() == 1 && prev.chars().all(|c| c.is_ascii_uppercase());
            return is_blank(rest) && (self.title_words.contains(prev) || is_initial);
        }
        false
    }

    /// Number of leading tokens that form a title ("Mr", "Prime Minister").
    fn match_title(&self, words: &[&Token<'_>]) -> Option<usize> {
        self.titles
            .iter()
            .find(|title| {
                title.len() <= words.len()
                    && title.iter().zip(words.iter()).all(|(t, w)| t == w.text)
            })
            .map(|title| title.len())
    }

    fn label_run(&self, kept: &[&Token<'_>], titled: bool) -> &'static str {
        if titled {
            return "PERSON";
        }
        if kept.iter().any(|t| self.org_cues.contains(t.text)) {
            return "ORG";
        }
        if kept.iter().any(|t| self.location_cues.contains(t.text)) {
            return "LOC";
        }
        if kept.len() == 1 && is_acronym(kept[0].text) {
            return "ORG";
        }
        "PERSON"
    }

    fn resolve_run(&self, text: &str, words: &[&Token<'_>]) -> Option<Candidate> {
        let run_start = words.first()?.start;

        let mut lo = 0;
        let mut stripped_stopword = false;
        while lo < words.len() {
            let w = words[lo].text;
            if self.decorative.contains(w) {
                lo += 1;
            } else if self.stopwords.contains(w) {
                stripped_stopword = true;
                lo += 1;
            } else {
                break;
            }
        }

        let mut titled = false;
        if let Some(n) = self.match_title(&words[lo..]) {
            lo += n;
            titled = true;
            // "Minister of Finance" names an office, not a person
            if lo >= words.len() || self.connectors.contains(words[lo].text) {
                return None;
            }
        }

        let mut hi = words.len();
        while hi > lo
            && (self.connectors.contains(words[hi - 1].text) || self.stopwords.contains(words[hi - 1].text))
        {
            hi -= 1;
        }
        if lo >= hi {
            return None;
        }

        let kept = &words[lo..hi];
        let anchor = if stripped_stopword { run_start } else { kept[0].start };
        // A lone capitalized word opening a sentence is too ambiguous to keep
        if !titled && kept.len() < 2 && is_sentence_start(text, anchor) {
            return None;
        }

        Some(Candidate {
            start: kept[0].start,
            end: kept[kept.len() - 1].end,
            label: self.label_run(kept, titled).to_string(),
            priority: usize::MAX,
        })
    }

    fn capitalized_runs(&self, text: &str, known: &[Candidate]) -> Vec<Candidate> {
        let tokens = tokenize(text);
        let covered = |t: &Token<'_>| known.iter().any(|c| t.start < c.end && c.start < t.end);

        let mut out = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if covered(&tokens[i]) || !is_capitalized(tokens[i].text) {
                i += 1;
                continue;
            }

            let mut run: Vec<&Token<'_>> = vec![&tokens[i]];
            let mut j = i + 1;
            while j < tokens.len() {
                let prev = run[run.len() - 1];
                let tok = &tokens[j];
                if covered(tok) || !self.joinable_gap(&text[prev.end..tok.start], prev.text) {
                    break;
                }
                if is_capitalized(tok.text) {
                    run.push(tok);
                    j += 1;
                    continue;
                }
                // Connector only when a capitalized word follows: "Ministry of Finance"
                let bridged = self.connectors.contains(tok.text)
                    && tokens.get(j + 1).map_or(false, |next| {
                        is_capitalized(next.text)
                            && !covered(next)
                            && self.joinable_gap(&text[tok.end..next.start], tok.text)
                    });
                if bridged {
                    run.push(tok);
                    j += 1;
                    continue;
                }
                break;
            }

            if let Some(candidate) = self.resolve_run(text, &run) {
                out.push(candidate);
            }
            i = j;
        }
        out
    }
}

impl EntityExtractor for GazetteerEntityExtractor {
    fn extract(&self, text: &str) -> Vec<NamedEntity> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut spans = self.known_spans(text);
        let runs = self.capitalized_runs(text, &spans);
        spans.extend(runs);
        spans.sort_by_key(|c| c.start);

        spans
            .into_iter()
            .map(|c| NamedEntity {
                text: text[c.start..c.end].to_string(),
                label: c.label,
                start: c.start,
                end: c.end,
            })
            .collect()
    }
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().map_or(false, |c| c.is_ascii_uppercase())
}

fn is_acronym(word: &str) -> bool {
    word.len() >= 2 && word.chars().all(|c| c.is_ascii_uppercase())
}
