//! Utterance classifier - decides whether text is a movie query or conversation
//!
//! Classification is an ordered list of rules evaluated first-match-wins. The
//! order matters: a message such as "hi, show me movies" matches both the
//! movie-keyword rule and a greeting pattern and must come out as a database
//! request.

use regex::Regex;
use serde::Serialize;
use tracing::trace;

use crate::types::ClassificationLabel;

/// Substrings that mark a message as a movie database request
pub const MOVIE_KEYWORDS: &[&str] = &[
    "movie", "movies", "film", "films", "cinema", "actor", "actress", "director", "genre",
    "rating", "watch", "watched", "popular", "best", "top", "recommend", "find", "show",
    "list", "search",
];

const GREETING_PATTERNS: &[&str] = &[
    r"\b(hi|hello|hey|good morning|good afternoon|good evening)\b",
    r"\b(how are you|how do you do|what's up|sup)\b",
    r"\b(nice to meet you|pleased to meet you)\b",
];

const GOODBYE_PATTERNS: &[&str] = &[
    r"\b(bye|goodbye|see you|farewell|take care)\b",
    r"\b(thanks|thank you|thx)\b.*\b(bye|goodbye)\b",
    r"\b(that's all|that's it|nothing else)\b",
];

const HELP_PATTERNS: &[&str] = &[
    r"\b(help|what can you do|what do you do|how do you work)\b",
    r"\b(show me|tell me|explain)\b.*\b(what|how|examples|commands|options|features)\b",
    r"\b(commands|options|features)\b",
];

const SMALL_TALK_PATTERNS: &[&str] = &[
    r"\b(how are you|how do you do|what's up)\b",
    r"\b(what's your name|who are you)\b",
    r"\b(what time|what day|what date)\b",
    r"\b(weather|temperature|rain|sunny)\b",
];

/// Condition tested by a single classifier rule against lower-cased text
#[derive(Debug, Clone)]
pub enum RulePredicate {
    /// Any keyword appears as a substring
    ContainsKeyword(Vec<&'static str>),
    /// Any regex matches
    MatchesPattern(Vec<Regex>),
    /// At most `max_words` words and none of `keywords`
    ShortWithoutKeywords {
        max_words: usize,
        keywords: Vec<&'static str>,
    },
}

impl RulePredicate {
    fn patterns(sources: &[&str]) -> Self {
        // Compile regex patterns once - these should never fail
        let compiled = sources
            .iter()
            .map(|p| Regex::new(p).expect("Invalid regex pattern"))
            .collect();
        RulePredicate::MatchesPattern(compiled)
    }

    pub fn matches(&self, text_lower: &str) -> bool {
        match self {
            RulePredicate::ContainsKeyword(keywords) => {
                keywords.iter().any(|k| text_lower.contains(k))
            }
            RulePredicate::MatchesPattern(patterns) => {
                patterns.iter().any(|p| p.is_match(text_lower))
            }
            RulePredicate::ShortWithoutKeywords { max_words, keywords } => {
                text_lower.split_whitespace().count() <= *max_words
                    && !keywords.iter().any(|k| text_lower.contains(k))
            }
        }
    }
}

/// One `(predicate, outcome)` entry in the priority chain
#[derive(Debug, Clone)]
pub struct ClassifierRule {
    pub name: &'static str,
    pub predicate: RulePredicate,
    pub label: ClassificationLabel,
}

/// Outcome of classification along with the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub label: ClassificationLabel,
    /// Name of the rule that fired, or `"fallback"` when none did
    pub rule: &'static str,
}

/// Stateless, pattern-driven utterance classifier
#[derive(Debug, Clone)]
pub struct UtteranceClassifier {
    rules: Vec<ClassifierRule>,
}

impl UtteranceClassifier {
    pub fn new() -> Self {
        Self::with_short_utterance_words(2)
    }

    pub fn with_short_utterance_words(max_words: usize) -> Self {
        let rules = vec![
            ClassifierRule {
                name: "movie_keyword",
                predicate: RulePredicate::ContainsKeyword(MOVIE_KEYWORDS.to_vec()),
                label: ClassificationLabel::DatabaseRequest,
            },
            ClassifierRule {
                name: "greeting",
                predicate: RulePredicate::patterns(GREETING_PATTERNS),
                label: ClassificationLabel::Greeting,
            },
            ClassifierRule {
                name: "goodbye",
                predicate: RulePredicate::patterns(GOODBYE_PATTERNS),
                label: ClassificationLabel::Goodbye,
            },
            ClassifierRule {
                name: "help",
                predicate: RulePredicate::patterns(HELP_PATTERNS),
                label: ClassificationLabel::Help,
            },
            ClassifierRule {
                name: "small_talk",
                predicate: RulePredicate::patterns(SMALL_TALK_PATTERNS),
                label: ClassificationLabel::SmallTalk,
            },
            ClassifierRule {
                name: "short_utterance",
                predicate: RulePredicate::ShortWithoutKeywords {
                    max_words,
                    keywords: MOVIE_KEYWORDS.to_vec(),
                },
                label: ClassificationLabel::Greeting,
            },
        ];

        Self { rules }
    }

    /// The rule chain in evaluation order
    pub fn rules(&self) -> &[ClassifierRule] {
        &self.rules
    }

    /// Label `text`. Total: every input, including the empty string, gets a label.
    pub fn classify(&self, text: &str) -> ClassificationLabel {
        self.classify_detailed(text).label
    }

    pub fn classify_detailed(&self, text: &str) -> Classification {
        let text_lower = text.to_lowercase();
        let text_lower = text_lower.trim();

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.predicate.matches(text_lower) {
                trace!(rule = rule.name, index, label = %rule.label, "classifier rule fired");
                return Classification {
                    label: rule.label,
                    rule: rule.name,
                };
            }
        }

        Classification {
            label: ClassificationLabel::Unclear,
            rule: "fallback",
        }
    }
}

impl Default for UtteranceClassifier {
    fn default() -> Self {
        Self::new()
    }
}
