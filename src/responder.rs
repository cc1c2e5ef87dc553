//! Canned replies for conversational messages

use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ClassificationLabel, Utterance};

const NAME: &str = "{name}";

const GREETINGS: &[&str] = &[
    "Hello{name}! 👋 I'm your NQL Movie Chatbot. I can help you find and explore movies using natural language!",
    "Hi there{name}! 🎬 Ready to discover some amazing movies? Just ask me anything about films!",
    "Hey{name}! 🍿 Welcome to the movie world! I can help you find the perfect movie to watch.",
    "Good to see you{name}! 🎭 I'm here to help you explore movies. What would you like to know?",
    "Hello{name}! 🎪 I'm your movie assistant. Ask me about any movie, genre, actor, or director!",
];

const GOODBYES: &[&str] = &[
    "Goodbye{name}! 👋 Thanks for chatting about movies with me. Come back anytime!",
    "See you later{name}! 🎬 Hope you found some great movies to watch!",
    "Take care{name}! 🍿 Happy movie watching!",
    "Farewell{name}! 🎭 Don't forget to check out those movie recommendations!",
    "Bye{name}! 🎪 Thanks for using the NQL Movie Chatbot!",
];

const HELP_MESSAGE: &str = "🎬 **I'm your NQL Movie Chatbot!** Here's what I can help you with:

**🔍 Movie Queries:**
- Find movies by genre, director, or actor
- Search by rating, release date, or popularity
- Get recommendations based on your preferences

**💬 Natural Language:**
Just ask me naturally! For example:
- \"Find me the most watched movies this year\"
- \"Show me the best action movies\"
- \"What are Christopher Nolan's highest rated films?\"

**🎯 Example Questions:**
- \"How many movies do you have?\"
- \"Show me action movies from 2024\"
- \"Find most watched movies of 2025\"

What would you like to explore? 🚀";

const HOW_ARE_YOU_MESSAGE: &str = "I'm doing great, thank you! 😊 I'm always excited to help you discover amazing movies. How can I assist you today?";
const WHO_ARE_YOU_MESSAGE: &str = "I'm your NQL Movie Chatbot! 🎬 I specialize in helping you find and explore movies using natural language. I can understand complex queries about films, actors, directors, genres, and more!";
const SMALL_TALK_MESSAGE: &str = "That's interesting! 😊 I'm here to help you with all things movies. What would you like to know about films?";
const UNCLEAR_MESSAGE: &str = "I'm not sure I understand that. 🤔 I'm here to help you with movie-related queries! Try asking me about movies, actors, directors, genres, or ratings.";

const GREETING_SUGGESTIONS: &[&str] = &[
    "Find me the highest rated movies",
    "Show me action movies from 2024",
    "What are the most popular movies by Christopher Nolan?",
    "Find movies with rating above 8.0",
];
const HELP_SUGGESTIONS: &[&str] = &[
    "Find me the highest rated movies",
    "Show me action movies from 2024",
    "What are the most popular movies by Christopher Nolan?",
];
const SMALL_TALK_SUGGESTIONS: &[&str] = &[
    "Find me some great movies",
    "Show me the highest rated films",
    "What are the most popular movies?",
];
const WHO_ARE_YOU_SUGGESTIONS: &[&str] = &[
    "Show me what you can do",
    "Find me some great movies",
    "What are the most popular films?",
];
const UNCLEAR_SUGGESTIONS: &[&str] = &[
    "Find me some great movies",
    "Show me the highest rated films",
    "What are the most popular movies?",
    "Help me understand what you can do",
];

/// A templated reply plus follow-up suggestions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Template family the reply came from
    pub kind: ClassificationLabel,
    pub message: String,
    pub suggestions: Vec<String>,
}

impl Reply {
    fn new(kind: ClassificationLabel, message: String, suggestions: &[&str]) -> Self {
        Self {
            kind,
            message,
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Maps conversational labels to reply templates
///
/// Randomness is injected per call so callers control seeding.
pub struct ConversationalResponder {
    how_are_you: Regex,
    who_are_you: Regex,
}

impl ConversationalResponder {
    pub fn new() -> Self {
        Self {
            how_are_you: Regex::new(r"\b(how are you|how do you do)\b").expect("Invalid regex pattern"),
            who_are_you: Regex::new(r"\b(what's your name|who are you)\b").expect("Invalid regex pattern"),
        }
    }

    /// Reply for `label`. `database_request` is not a conversational family and
    /// falls back to the unclear reply.
    pub fn respond<R: Rng + ?Sized>(
        &self,
        label: ClassificationLabel,
        speaker: Option<&str>,
        rng: &mut R,
    ) -> Reply {
        match label {
            ClassificationLabel::Greeting => Reply::new(
                label,
                pick(GREETINGS, speaker, rng),
                GREETING_SUGGESTIONS,
            ),
            ClassificationLabel::Goodbye => Reply::new(label, pick(GOODBYES, speaker, rng), &[]),
            ClassificationLabel::Help => {
                Reply::new(label, HELP_MESSAGE.to_string(), HELP_SUGGESTIONS)
            }
            ClassificationLabel::SmallTalk => Reply::new(
                label,
                SMALL_TALK_MESSAGE.to_string(),
                SMALL_TALK_SUGGESTIONS,
            ),
            ClassificationLabel::Unclear | ClassificationLabel::DatabaseRequest => Reply::new(
                ClassificationLabel::Unclear,
                UNCLEAR_MESSAGE.to_string(),
                UNCLEAR_SUGGESTIONS,
            ),
        }
    }

    /// Like [`respond`](Self::respond), but small talk picks its template from the message
    pub fn respond_to<R: Rng + ?Sized>(
        &self,
        label: ClassificationLabel,
        utterance: &Utterance,
        rng: &mut R,
    ) -> Reply {
        if label != ClassificationLabel::SmallTalk {
            return self.respond(label, utterance.speaker.as_deref(), rng);
        }

        let text_lower = utterance.text.to_lowercase();
        if self.how_are_you.is_match(&text_lower) {
            Reply::new(label, HOW_ARE_YOU_MESSAGE.to_string(), SMALL_TALK_SUGGESTIONS)
        } else if self.who_are_you.is_match(&text_lower) {
            Reply::new(label, WHO_ARE_YOU_MESSAGE.to_string(), WHO_ARE_YOU_SUGGESTIONS)
        } else {
            self.respond(label, utterance.speaker.as_deref(), rng)
        }
    }
}

impl Default for ConversationalResponder {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<R: Rng + ?Sized>(templates: &[&str], speaker: Option<&str>, rng: &mut R) -> String {
    let template = templates.choose(rng).copied().unwrap_or_default();
    let name = match speaker.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => format!(" {}", s),
        None => String::new(),
    };
    template.replace(NAME, &name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_greeting_includes_speaker() {
        let responder = ConversationalResponder::new();
        let mut rng = StdRng::seed_from_u64(7);
        let reply = responder.respond(ClassificationLabel::Greeting, Some("Sam"), &mut rng);
        assert_eq!(reply.kind, ClassificationLabel::Greeting);
        assert!(reply.message.contains(" Sam!"));
        assert_eq!(reply.suggestions.len(), 4);
    }

    #[test]
    fn test_greeting_without_speaker() {
        let responder = ConversationalResponder::new();
        let mut rng = StdRng::seed_from_u64(1);
        let reply = responder.respond(ClassificationLabel::Greeting, None, &mut rng);
        assert!(!reply.message.contains("{name}"));
        assert!(GREETINGS.iter().any(|t| t.replace(NAME, "") == reply.message));
    }

    #[test]
    fn test_same_seed_same_reply() {
        let responder = ConversationalResponder::new();
        let a = responder.respond(ClassificationLabel::Goodbye, Some("Ana"), &mut StdRng::seed_from_u64(42));
        let b = responder.respond(ClassificationLabel::Goodbye, Some("Ana"), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert!(a.suggestions.is_empty());
    }

    #[test]
    fn test_database_request_falls_back_to_unclear() {
        let responder = ConversationalResponder::new();
        let mut rng = StdRng::seed_from_u64(0);
        let reply = responder.respond(ClassificationLabel::DatabaseRequest, None, &mut rng);
        assert_eq!(reply.kind, ClassificationLabel::Unclear);
        assert_eq!(reply.message, UNCLEAR_MESSAGE);
    }

    #[test]
    fn test_small_talk_variants() {
        let responder = ConversationalResponder::new();
        let mut rng = StdRng::seed_from_u64(0);

        let reply = responder.respond_to(ClassificationLabel::SmallTalk, &Utterance::new("Who are you?"), &mut rng);
        assert_eq!(reply.message, WHO_ARE_YOU_MESSAGE);

        let reply = responder.respond_to(ClassificationLabel::SmallTalk, &Utterance::new("how do you do"), &mut rng);
        assert_eq!(reply.message, HOW_ARE_YOU_MESSAGE);

        let reply = responder.respond_to(ClassificationLabel::SmallTalk, &Utterance::new("sunny today"), &mut rng);
        assert_eq!(reply.message, SMALL_TALK_MESSAGE);
    }

    #[test]
    fn test_help_is_fixed() {
        let responder = ConversationalResponder::new();
        let mut rng = StdRng::seed_from_u64(3);
        let reply = responder.respond(ClassificationLabel::Help, Some("Kim"), &mut rng);
        assert_eq!(reply.message, HELP_MESSAGE);
    }
}
