//! Fallback question bank: canned questions used when generation is unavailable
//! or keeps repeating itself.
//!
//! Topic routing is an ordered rule table: the first rule whose keywords appear in
//! the outline's required skills or title wins, otherwise the general pool is used.
//! Routing is deterministic; only the pick within the resolved pool is random, and
//! the random source is supplied by the caller.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::interview::similarity::normalize;
use crate::models::outline::InterviewOutline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Frontend,
    Backend,
    Scripting,
    General,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Frontend => "frontend",
            Topic::Backend => "backend",
            Topic::Scripting => "scripting",
            Topic::General => "general",
        }
    }
}

/// One routing rule. A keyword matches any word of the outline that starts with it,
/// so "react" covers "ReactJS" while "api" does not fire on "rapid".
pub struct TopicRule {
    pub topic: Topic,
    pub keywords: &'static [&'static str],
}

/// Evaluated in order; earlier rules take precedence.
pub const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        topic: Topic::Frontend,
        keywords: &[
            "react", "frontend", "javascript", "css", "html", "vue", "angular", "svelte", "ui",
        ],
    },
    TopicRule {
        topic: Topic::Backend,
        keywords: &[
            "django", "python", "backend", "api", "sql", "postgres", "database", "platform",
            "microservice",
        ],
    },
    TopicRule {
        topic: Topic::Scripting,
        keywords: &["node", "typescript", "ecmascript", "scripting", "deno"],
    },
];

const FRONTEND_POOL: &[&str] = &[
    "Explain the difference between CSS grid and flexbox and when to use each.",
    "How does the browser's event loop work and how does it affect asynchronous JS?",
    "What are the benefits of virtual DOM in frameworks like React?",
    "Explain CORS and how to resolve common CORS issues in frontend apps.",
    "How do you optimize web performance for critical rendering path?",
];

const BACKEND_POOL: &[&str] = &[
    "Explain the difference between Django ORM and raw SQL.",
    "What is select_related vs prefetch_related in Django?",
    "How does Django handle database migrations?",
    "Explain Django middleware with an example.",
    "What are Django signals and when would you use them?",
];

const SCRIPTING_POOL: &[&str] = &[
    "Explain prototypal inheritance in JavaScript.",
    "What are closures and where are they useful?",
    "Describe event delegation and when you'd use it.",
];

const GENERAL_POOL: &[&str] = &[
    "Explain the difference between a process and a thread.",
    "How would you choose between an array and a hash map for a lookup-heavy workload?",
    "What is the difference between unit tests and integration tests, and when do you write each?",
    "Describe how you would debug a function that intermittently returns wrong results.",
    "Explain Big-O notation and analyse the complexity of binary search.",
];

pub fn pool(topic: Topic) -> &'static [&'static str] {
    match topic {
        Topic::Frontend => FRONTEND_POOL,
        Topic::Backend => BACKEND_POOL,
        Topic::Scripting => SCRIPTING_POOL,
        Topic::General => GENERAL_POOL,
    }
}

/// Resolves the topic from required skills and title. Independent of randomness.
pub fn resolve_topic(outline: &InterviewOutline) -> Topic {
    topic_for_text(&format!("{} {}", outline.required_skills, outline.title))
}

pub fn topic_for_text(text: &str) -> Topic {
    let normalized = normalize(text);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

    TOPIC_RULES
        .iter()
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|kw| words.iter().any(|w| w.starts_with(kw)))
        })
        .map(|rule| rule.topic)
        .unwrap_or(Topic::General)
}

/// A canned question chosen for an outline.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackPick {
    pub topic: Topic,
    pub text: String,
}

/// Picks a canned question for the outline, avoiding `excluded` (normalized texts).
/// When every entry of the pool is excluded the unfiltered pool is used.
pub fn pick_fallback<R: Rng + ?Sized>(
    outline: &InterviewOutline,
    excluded: &HashSet<String>,
    rng: &mut R,
) -> FallbackPick {
    let topic = resolve_topic(outline);
    let pool = pool(topic);

    let filtered: Vec<&str> = pool
        .iter()
        .copied()
        .filter(|q| !excluded.contains(&normalize(q)))
        .collect();

    let candidates: &[&str] = if filtered.is_empty() { pool } else { &filtered[..] };

    let text = candidates
        .choose(rng)
        .or_else(|| GENERAL_POOL.first())
        .copied()
        .unwrap_or("Describe a technical problem you solved recently and how you approached it.");

    FallbackPick {
        topic,
        text: text.to_string(),
    }
}
