//! Prompt Builder: turns a request and a directive into a bounded prompt.
//!
//! Layout:
//!
//! ```text
//! system: tutor framing → behavioral state → directive clause
//! user:   problem description → current code (optional) → learner query
//! ```
//!
//! Only the learner material is ever shortened. The problem description
//! and code are truncated first, sharing the remaining room fairly; the
//! query is cut only when nothing else is left to cut. As long as the budget
//! covers the framing and directive, `prompt.estimated_tokens()` never
//! exceeds it.

use tracing::debug;
use tutorgate_config::BudgetConfig;
use tutorgate_core::prompt::{Prompt, chars_for_tokens, estimate_tokens};
use tutorgate_core::tutoring::{InterventionDirective, TeachingStyle, TutoringRequest};

/// Appended to any section that was shortened.
pub const TRUNCATION_MARKER: &str = "…[truncated]";

/// Learner line used by hint mode when the query is empty.
pub const HINT_QUERY: &str = "I'm stuck and need a hint to get started.";

/// Hint-mode learner line when the request carries code.
pub const HINT_QUERY_WITH_CODE: &str =
    "I'm stuck. My current code is above. What should I focus on?";

const TUTOR_FRAMING: &str = "You are a Socratic programming tutor for novice learners \
solving algorithmic puzzles.

Rules:
- Never give direct solutions or complete code.
- Ask guiding questions that prompt thinking.
- Give hints about the approach, not the implementation.
- Keep replies to two or three short sentences in simple language.

Adapt your tone to the learner's state.";

/// The augmentation clause for a teaching style.
pub fn style_clause(style: TeachingStyle) -> &'static str {
    match style {
        TeachingStyle::SubtleHint => {
            "The learner is engaged. Offer a subtle hint that keeps them in flow."
        }
        TeachingStyle::SupportiveCheckIn => {
            "The learner has paused to think. Check in supportively and ask what they are considering."
        }
        TeachingStyle::GentleNudge => {
            "The learner has been idle for a while. Gently nudge them toward one small next step."
        }
        TeachingStyle::ConcreteStartingPoint => {
            "INTERVENTION: the learner appears disengaged. Be encouraging and give one concrete \
starting point, without writing the solution."
        }
        TeachingStyle::ReflectiveQuestion => {
            "The learner is guessing rapidly. Slow them down with a reflective question about their approach."
        }
        TeachingStyle::TargetedDebugging => {
            "The learner is debugging methodically. Support their process with a targeted debugging hint."
        }
        TeachingStyle::BigPicture => {
            "The learner is making many tiny edits. Step back and ask about their overall plan."
        }
        TeachingStyle::ExplainYourCode => {
            "The code may have been pasted. Ask the learner to explain it in their own words before going further."
        }
        TeachingStyle::ThoughtfulEdits => {
            "The learner is changing code very quickly. Ask them to make one deliberate change and predict its effect."
        }
        TeachingStyle::ProactiveNudge => {
            "The learner asked for a hint. Point them at one idea worth exploring, phrased as a question."
        }
    }
}

/// System half of the prompt: framing, state, then the directive.
pub fn system_prompt(directive: &InterventionDirective) -> String {
    format!(
        "{TUTOR_FRAMING}\n\nBehavioral state: {}\nUrgency: {}\n\n{}",
        directive.behavioral_context,
        directive.urgency,
        style_clause(directive.style),
    )
}

fn render_user(description: &str, code: Option<&str>, query: &str) -> String {
    let mut out = String::with_capacity(
        description.len() + code.map_or(0, str::len) + query.len() + 48,
    );
    out.push_str("Problem:\n");
    out.push_str(description);
    if let Some(code) = code {
        out.push_str("\n\nCurrent code:\n```\n");
        out.push_str(code);
        out.push_str("\n```");
    }
    out.push_str("\n\nLearner: ");
    out.push_str(query);
    out
}

/// Shorten `text` to at most `max_chars` characters, marking the cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - marker_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

/// Split `room` characters between description and code.
///
/// A section that fits inside its half gives the remainder to the other.
fn split_room(room: usize, description_len: usize, code_len: usize) -> (usize, usize) {
    if description_len + code_len <= room {
        return (description_len, code_len);
    }
    let half = room / 2;
    if description_len <= half {
        (description_len, room - description_len)
    } else if code_len <= half {
        (room - code_len, code_len)
    } else {
        (room - half, half)
    }
}

/// Builds tutoring prompts under an input token budget.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    input_budget: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&BudgetConfig::default())
    }
}

impl PromptBuilder {
    pub fn new(input_budget: usize) -> Self {
        Self { input_budget }
    }

    pub fn from_config(budget: &BudgetConfig) -> Self {
        Self::new(budget.input_tokens)
    }

    pub fn input_budget(&self) -> usize {
        self.input_budget
    }

    /// Tokens taken by everything that is never truncated.
    pub fn fixed_tokens(&self, directive: &InterventionDirective, has_code: bool) -> usize {
        let scaffold = render_user("", has_code.then_some(""), "");
        estimate_tokens(&system_prompt(directive)) + estimate_tokens(&scaffold)
    }

    /// Prompt for a learner question.
    pub fn build(&self, request: &TutoringRequest, directive: &InterventionDirective) -> Prompt {
        self.compose(request, &request.user_query, directive)
    }

    /// Prompt for the hint entry point. An empty query becomes a stock
    /// "I'm stuck" line.
    pub fn build_hint(
        &self,
        request: &TutoringRequest,
        directive: &InterventionDirective,
    ) -> Prompt {
        if !request.user_query.trim().is_empty() {
            return self.compose(request, &request.user_query, directive);
        }
        let query = if request.code().is_some() {
            HINT_QUERY_WITH_CODE
        } else {
            HINT_QUERY
        };
        self.compose(request, query, directive)
    }

    fn compose(
        &self,
        request: &TutoringRequest,
        query: &str,
        directive: &InterventionDirective,
    ) -> Prompt {
        let system = system_prompt(directive);
        let code = request.code();

        let user_tokens = self.input_budget.saturating_sub(estimate_tokens(&system));
        let user_chars = chars_for_tokens(user_tokens);
        let scaffold_chars = render_user("", code.map(|_| ""), "").chars().count();
        let mut room = user_chars.saturating_sub(scaffold_chars);

        let query_len = query.chars().count();
        let query = if query_len > room {
            debug!(from = query_len, to = room, "Truncating learner query");
            truncate_chars(query, room)
        } else {
            query.to_string()
        };
        room -= query.chars().count();

        let description = request.problem_description.as_str();
        let description_len = description.chars().count();
        let code_len = code.map_or(0, |c| c.chars().count());
        let (description_max, code_max) = split_room(room, description_len, code_len);

        if description_len > description_max {
            debug!(
                from = description_len,
                to = description_max,
                "Truncating problem description"
            );
        }
        if code_len > code_max {
            debug!(from = code_len, to = code_max, "Truncating current code");
        }

        let description = truncate_chars(description, description_max);
        let code = code.map(|c| truncate_chars(c, code_max));
        let user = render_user(&description, code.as_deref(), &query);

        Prompt::new(system, user)
    }
}
