//! Scope rules: the fast, local stage of scope validation.
//!
//! Rules are data: each pairs a case-insensitive pattern with a verdict and
//! a strength. The strongest matching rule decides; on equal strength a
//! block beats an allow. Queries no rule matches are `Ambiguous` and left
//! to the model-backed check in the tutor crate.

use crate::PolicyError;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tutorgate_config::ScopeConfig;

/// Strength given to `extra_block` patterns from configuration.
pub const CONFIGURED_BLOCK_STRENGTH: u8 = 65;
/// Strength given to `extra_allow` patterns from configuration.
pub const CONFIGURED_ALLOW_STRENGTH: u8 = 45;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleVerdict {
    Allow,
    Block,
}

/// One (pattern, verdict) pair.
#[derive(Debug, Clone)]
pub struct ScopeRule {
    pub name: String,
    pub verdict: RuleVerdict,
    pub strength: u8,
    pattern: Regex,
}

impl ScopeRule {
    /// Compile a rule. Matching is always case-insensitive.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        verdict: RuleVerdict,
        strength: u8,
    ) -> Result<Self, PolicyError> {
        let pattern = Regex::new(&format!("(?i){pattern}")).map_err(|e| {
            PolicyError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            name: name.into(),
            verdict,
            strength,
            pattern,
        })
    }

    pub fn matches(&self, query: &str) -> bool {
        self.pattern.is_match(query)
    }
}

/// What the local stage concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalDecision {
    Allow { rule: String },
    Block { rule: String },
    /// No rule fired.
    Ambiguous,
}

/// Imperative demands for a solution outrank learning words in the same query.
const SOLUTION_DEMAND_STRENGTH: u8 = 75;

/// Built-in rules as (name, pattern, verdict, strength).
const BUILTIN_RULES: &[(&str, &str, RuleVerdict, u8)] = &[
    (
        "harmful",
        r"\b(hack(ing)?\s+(into|someone)|steal(ing)?|malware|keylogger|ransomware|ddos|phishing)\b",
        RuleVerdict::Block,
        100,
    ),
    (
        "academic_dishonesty",
        r"\b(cheat(ing)?\s+on|plagiari[sz](e|ing)|plagiarism|bypass\s+the\s+(grader|autograder|tests))\b",
        RuleVerdict::Block,
        100,
    ),
    (
        "personal_data",
        r"\b(social\s+security\s+number|credit\s+card\s+numbers?|someone('s|\s+else's)\s+password|home\s+address\s+of)\b",
        RuleVerdict::Block,
        100,
    ),
    (
        "off_topic",
        r"\b(weather|news|sports?|recipes?|movies?|music|lyrics|horoscope|stock\s+tips?)\b",
        RuleVerdict::Block,
        80,
    ),
    (
        "off_topic_advice",
        r"\b(medical|legal|financial|relationship)\s+advice\b",
        RuleVerdict::Block,
        80,
    ),
    (
        "learning_intent",
        r"\b(explain|explanation|understand|confused|confusing|hint|stuck|debug(ging)?|why|approach|strategy)\b|\bnot\s+working\b|\bwhat('s|\s+is)\s+wrong\b",
        RuleVerdict::Allow,
        70,
    ),
    (
        "solution_request",
        r"\b(complete|full|entire|whole|final)\s+(solution|code|program|answer|implementation)\b",
        RuleVerdict::Block,
        60,
    ),
    (
        "do_it_for_me",
        r"\b(write|code|implement|finish|do|solve)\s+(it|this|that|the\s+whole\s+thing|the(\s+\w+){1,2})\s+for\s+me\b",
        RuleVerdict::Block,
        SOLUTION_DEMAND_STRENGTH,
    ),
    (
        "give_me_the_answer",
        r"\b(give|show|send|tell)\s+me\s+the\s+((complete|full|entire|whole|final|working)\s+)?(answer|solution|code)\b",
        RuleVerdict::Block,
        SOLUTION_DEMAND_STRENGTH,
    ),
    (
        "write_the_code",
        r"\b(write|implement)\s+(me\s+)?the\s+((complete|full|entire|whole|final|working)\s+)?(code|solution|function|program)\b",
        RuleVerdict::Block,
        SOLUTION_DEMAND_STRENGTH,
    ),
    (
        "learning_keyword",
        r"\b(how|what|difference|mean|means|help|start|idea|error|bug|issue|fix|fail(s|ing|ed)?|algorithm|complexity|loop|recursion|recursive|variable|function|array|list|string|pointer|index|runtime|time|space)\b|\bdata\s+structures?\b",
        RuleVerdict::Allow,
        40,
    ),
];

/// An ordered rule set.
#[derive(Debug, Clone, Default)]
pub struct ScopeRules {
    rules: Vec<ScopeRule>,
}

impl ScopeRules {
    /// An empty set. Every query is `Ambiguous`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in rule set.
    pub fn builtin() -> Self {
        let rules = BUILTIN_RULES
            .iter()
            .map(|(name, pattern, verdict, strength)| {
                ScopeRule::new(*name, pattern, *verdict, *strength)
                    .expect("built-in scope patterns are valid")
            })
            .collect();
        Self { rules }
    }

    /// Built-in rules plus configured extras.
    pub fn from_config(config: &ScopeConfig) -> Result<Self, PolicyError> {
        let mut set = Self::builtin();
        for (i, pattern) in config.extra_block.iter().enumerate() {
            set.push(ScopeRule::new(
                format!("configured_block_{i}"),
                pattern,
                RuleVerdict::Block,
                CONFIGURED_BLOCK_STRENGTH,
            )?);
        }
        for (i, pattern) in config.extra_allow.iter().enumerate() {
            set.push(ScopeRule::new(
                format!("configured_allow_{i}"),
                pattern,
                RuleVerdict::Allow,
                CONFIGURED_ALLOW_STRENGTH,
            )?);
        }
        Ok(set)
    }

    pub fn push(&mut self, rule: ScopeRule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide a query using the strongest matching rule.
    pub fn evaluate(&self, query: &str) -> LocalDecision {
        let mut best: Option<&ScopeRule> = None;
        for rule in self.rules.iter().filter(|r| r.matches(query)) {
            let wins = match best {
                None => true,
                Some(current) => {
                    rule.strength > current.strength
                        || (rule.strength == current.strength
                            && rule.verdict == RuleVerdict::Block
                            && current.verdict == RuleVerdict::Allow)
                }
            };
            if wins {
                best = Some(rule);
            }
        }

        match best {
            Some(rule) => {
                tracing::debug!(rule = %rule.name, verdict = ?rule.verdict, "Scope rule matched");
                match rule.verdict {
                    RuleVerdict::Allow => LocalDecision::Allow {
                        rule: rule.name.clone(),
                    },
                    RuleVerdict::Block => LocalDecision::Block {
                        rule: rule.name.clone(),
                    },
                }
            }
            None => LocalDecision::Ambiguous,
        }
    }
}
