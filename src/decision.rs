//! Turning classifier scores into displayable labels.

use crate::{
    constants::{DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_VOTE_WINDOW},
    Error, Result,
};
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Label set of the bundled mudra classifier, in model output order
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "Alapadmam", "Alapadmam(1)", "Anjali", "Aralam", "Aralam(1)", "Ardhachandran",
    "Ardhachandran(1)", "Ardhapathaka", "Ardhapathaka(1)", "Berunda", "Bramaram", "Bramaram(1)",
    "Chakra", "Chandrakala", "Chandrakala(1)", "Chaturam", "Chaturam(1)", "Garuda", "Hamsapaksha",
    "Hamsapaksha(1)", "Hamsasyam", "Hamsasyam(1)", "Kangulam", "Kangulam(1)", "Kapith", "Kapith(1)",
    "Kapotham", "Karkatta", "Kartariswastika", "Katakamukha", "Katakavardhana", "Katrimukha",
    "Khatva", "Kilaka", "Kurma", "Matsya", "Mayura", "Mayura(1)", "Mrigasirsha", "Mrigasirsha(1)",
    "Mukulam", "Mukulam(1)", "Mushti", "Mushti(1)", "Nagabandha", "Padmakosha", "Padmakosha(1)",
    "Pasha", "Pathaka", "Pathaka(1)", "Pushpaputa", "Sakata", "Samputa", "Sarpasirsha",
    "Sarpasirsha(1)", "Shanka", "Shivalinga", "Shukatundam", "Shukatundam(1)", "Sikharam",
    "Sikharam(1)", "Simhamukham", "Simhamukham(1)", "Suchi", "Suchi(1)", "Swastikam",
    "Tamarachudam", "Tamarachudam(1)", "Tripathaka", "Tripathaka(1)", "Trishulam", "Trishulam(1)",
];

/// Fixed, ordered list of class labels.
///
/// Index `i` names output `i` of the classifier. Length and order must match
/// the model exactly; only the length can be checked at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    labels: Vec<Arc<str>>,
}

impl Vocabulary {
    /// # Errors
    ///
    /// Returns an error if the list is empty, contains a blank label or
    /// contains duplicates.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels: Vec<Arc<str>> = labels.into_iter().map(|s| Arc::from(s.as_ref().trim())).collect();
        if labels.is_empty() {
            return Err(Error::ConfigError("Vocabulary must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        for (idx, label) in labels.iter().enumerate() {
            if label.is_empty() {
                return Err(Error::ConfigError(format!("Vocabulary label {idx} is blank")));
            }
            if !seen.insert(label.clone()) {
                return Err(Error::ConfigError(format!("Duplicate vocabulary label: {label}")));
            }
        }
        Ok(Self { labels })
    }

    /// Load one label per line, ignoring blank lines
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the labels are invalid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::new(content.lines().filter(|line| !line.trim().is_empty()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<str>> {
        self.labels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<str>> {
        self.labels.iter()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            labels: DEFAULT_VOCABULARY.iter().map(|&s| Arc::from(s)).collect(),
        }
    }
}

/// One entry of a class distribution
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScore {
    pub label: Arc<str>,
    pub probability: f32,
}

/// Classifier scores paired with their labels, in vocabulary order
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDistribution {
    scores: Vec<ClassScore>,
}

impl ClassDistribution {
    /// Pair raw scores with the vocabulary
    ///
    /// # Errors
    ///
    /// Returns [`Error::VocabularyMismatch`] if the lengths differ.
    pub fn new(vocabulary: &Vocabulary, probabilities: &[f32]) -> Result<Self> {
        if probabilities.len() != vocabulary.len() {
            return Err(Error::VocabularyMismatch {
                model: probabilities.len(),
                vocabulary: vocabulary.len(),
            });
        }
        let scores = vocabulary
            .iter()
            .zip(probabilities)
            .map(|(label, &probability)| ClassScore {
                label: label.clone(),
                probability,
            })
            .collect();
        Ok(Self { scores })
    }

    #[must_use]
    pub fn scores(&self) -> &[ClassScore] {
        &self.scores
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Index and entry of the highest probability.
    ///
    /// Ties resolve to the lowest index; NaN scores never win.
    #[must_use]
    pub fn argmax(&self) -> Option<(usize, &ClassScore)> {
        let mut best: Option<(usize, &ClassScore)> = None;
        for (idx, score) in self.scores.iter().enumerate() {
            if score.probability.is_nan() {
                continue;
            }
            match best {
                Some((_, current)) if score.probability <= current.probability => {}
                _ => best = Some((idx, score)),
            }
        }
        best
    }

    /// The `k` most probable entries, highest first
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<&ClassScore> {
        let mut ranked: Vec<&ClassScore> = self.scores.iter().filter(|s| !s.probability.is_nan()).collect();
        // Stable sort keeps vocabulary order among equal scores
        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        ranked.truncate(k);
        ranked
    }
}

/// Outcome of the label decision for one hand in one frame
#[derive(Debug, Clone, PartialEq)]
pub enum LabelDecision {
    Recognized { name: Arc<str>, confidence: f32 },
    Unknown,
}

impl LabelDecision {
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Recognized { .. })
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Recognized { name, .. } => Some(name),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for LabelDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recognized { name, confidence } => write!(f, "{name} ({:.1}%)", confidence * 100.0),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Confidence gate on the top classifier score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPolicy {
    threshold: f32,
}

impl LabelPolicy {
    /// # Errors
    ///
    /// Returns an error if `threshold` is outside `[0, 1]`.
    pub fn new(threshold: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidInput(format!(
                "Confidence threshold must be between 0.0 and 1.0, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Recognize the top class only if its probability exceeds the threshold
    #[must_use]
    pub fn decide(&self, distribution: &ClassDistribution) -> LabelDecision {
        match distribution.argmax() {
            Some((_, top)) if top.probability > self.threshold => LabelDecision::Recognized {
                name: top.label.clone(),
                confidence: top.probability,
            },
            _ => LabelDecision::Unknown,
        }
    }
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Majority vote over the most recent decisions of one hand.
///
/// With a window of 1 every decision passes through unchanged. With a larger
/// window a label is only shown while it holds a strict majority of the
/// window; otherwise the output is `Unknown`.
#[derive(Debug, Clone)]
pub struct LabelVoter {
    window_size: usize,
    recent: VecDeque<LabelDecision>,
}

impl LabelVoter {
    /// # Errors
    ///
    /// Returns an error if `window_size` is 0.
    pub fn new(window_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(Error::InvalidInput("Vote window must be greater than 0".to_string()));
        }
        Ok(Self {
            window_size,
            recent: VecDeque::with_capacity(window_size),
        })
    }

    /// Record a decision and return the voted decision
    pub fn vote(&mut self, decision: LabelDecision) -> LabelDecision {
        if self.recent.len() >= self.window_size {
            self.recent.pop_front();
        }
        self.recent.push_back(decision);

        let Some(latest) = self.recent.back() else {
            return LabelDecision::Unknown;
        };
        if self.window_size == 1 {
            return latest.clone();
        }

        // Newest first so the confidence shown is the most recent one for the winner
        for candidate in self.recent.iter().rev() {
            let LabelDecision::Recognized { name, .. } = candidate else {
                continue;
            };
            let votes = self.recent.iter().filter(|d| d.name() == Some(&**name)).count();
            if votes * 2 > self.window_size {
                return candidate.clone();
            }
        }
        LabelDecision::Unknown
    }

    pub fn reset(&mut self) {
        self.recent.clear();
    }
}

impl Default for LabelVoter {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_VOTE_WINDOW,
            recent: VecDeque::with_capacity(DEFAULT_VOTE_WINDOW),
        }
    }
}
