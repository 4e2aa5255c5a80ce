//! Backend-independent description of which quizzes a listing should return.

use crate::dao::models::{QuizEntity, UserId};

/// Characters that carry a meaning inside a MongoDB (PCRE) regular expression.
const REGEX_META: &[char] = &[
    '\\', '^', '$', '.', '|', '?', '*', '+', '(', ')', '[', ']', '{', '}',
];

/// Filter applied to quiz listings and counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizFilter {
    /// Restrict to questions matching this pattern.
    pub search: Option<SearchPattern>,
    /// Restrict to quizzes written by this author.
    pub author_id: Option<UserId>,
    /// Restrict to quizzes this user marked as favourite.
    pub fan_id: Option<UserId>,
}

impl QuizFilter {
    /// Evaluate the filter against a quiz held in memory.
    pub fn matches(&self, quiz: &QuizEntity) -> bool {
        if let Some(author_id) = self.author_id {
            if quiz.author_id != Some(author_id) {
                return false;
            }
        }

        if let Some(fan_id) = self.fan_id {
            if !quiz.is_fan(fan_id) {
                return false;
            }
        }

        self.search
            .as_ref()
            .is_none_or(|pattern| pattern.matches(&quiz.question))
    }
}

/// Search text where each run of whitespace acts as a wildcard.
///
/// `"capital  italy"` matches any question containing `capital` followed, anywhere later, by
/// `italy`, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPattern {
    fragments: Vec<String>,
}

impl SearchPattern {
    /// Build a pattern from user input. Returns `None` when the input has no searchable text,
    /// which is equivalent to not filtering at all.
    pub fn parse(raw: &str) -> Option<Self> {
        let fragments: Vec<String> = raw.split_whitespace().map(str::to_lowercase).collect();
        if fragments.is_empty() {
            None
        } else {
            Some(Self { fragments })
        }
    }

    /// Whether `text` contains every fragment, in order, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        let mut rest = haystack.as_str();
        for fragment in &self.fragments {
            match rest.find(fragment.as_str()) {
                Some(index) => rest = &rest[index + fragment.len()..],
                None => return false,
            }
        }
        true
    }

    /// Render the pattern as an unanchored regular expression, meant to be used case-insensitively.
    pub fn to_regex(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| escape_regex(fragment))
            .collect::<Vec<_>>()
            .join(".*")
    }
}

fn escape_regex(fragment: &str) -> String {
    let mut escaped = String::with_capacity(fragment.len());
    for c in fragment.chars() {
        if REGEX_META.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
