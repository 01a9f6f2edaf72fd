pub mod ask;
pub mod config_cmd;
pub mod doctor;
pub mod hint;

use clap::Args;
use std::path::Path;
use tutorgate_config::AppConfig;
use tutorgate_core::behavior::{
    BehavioralSnapshot, CognitiveState, IterationState, ProvenanceState,
};
use tutorgate_core::tutoring::{TutoringRequest, TutoringResponse};
use tutorgate_tutor::Firewall;

/// Problem, code and behavioral flags shared by `ask` and `hint`.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Exercise identifier
    #[arg(long)]
    pub problem_id: String,

    /// Problem statement, or @path to read it from a file
    #[arg(long)]
    pub problem: String,

    /// Current code, or @path to read it from a file
    #[arg(long)]
    pub code: Option<String>,

    /// Session identifier for log correlation
    #[arg(long, default_value = "cli")]
    pub session: String,

    /// Cognitive state (ACTIVE, REFLECTIVE_PAUSE, PASSIVE_IDLE, DISENGAGEMENT)
    #[arg(long)]
    pub cognitive: Option<CognitiveState>,

    /// Iteration state (NORMAL, RAPID_GUESSING, DELIBERATE_DEBUGGING, MICRO_ITERATION)
    #[arg(long)]
    pub iteration: Option<IterationState>,

    /// Provenance state (INCREMENTAL_EDIT, SUSPECTED_PASTE, SPAMMING)
    #[arg(long)]
    pub provenance: Option<ProvenanceState>,

    /// Print the full response as JSON
    #[arg(long)]
    pub json: bool,
}

impl RequestArgs {
    fn snapshot(&self) -> Option<BehavioralSnapshot> {
        if self.cognitive.is_none() && self.iteration.is_none() && self.provenance.is_none() {
            return None;
        }
        Some(BehavioralSnapshot {
            cognitive: self.cognitive,
            iteration: self.iteration,
            provenance: self.provenance,
        })
    }

    /// Build the request, reading any `@file` arguments.
    pub fn to_request(&self, query: &str) -> Result<TutoringRequest, Box<dyn std::error::Error>> {
        let mut request = TutoringRequest::new(
            self.problem_id.clone(),
            resolve_text(&self.problem)?,
            query,
        )
        .with_session(self.session.clone());
        if let Some(code) = &self.code {
            request = request.with_code(resolve_text(code)?);
        }
        if let Some(snapshot) = self.snapshot() {
            request = request.with_behavior(snapshot);
        }
        Ok(request)
    }
}

/// `@path` reads the file; anything else is taken literally.
pub fn resolve_text(arg: &str) -> Result<String, Box<dyn std::error::Error>> {
    match arg.strip_prefix('@') {
        Some(path) => Ok(std::fs::read_to_string(Path::new(path))
            .map_err(|e| format!("Failed to read {path}: {e}"))?),
        None => Ok(arg.to_string()),
    }
}

/// Load configuration and wire the firewall.
pub fn load_firewall() -> Result<Firewall, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    TUTORGATE_API_KEY   (generic)");
        eprintln!("    OPENAI_API_KEY      (provider = \"openai\")");
        eprintln!("    GROQ_API_KEY        (provider = \"groq\")");
        eprintln!();
        eprintln!("  Or add api_key to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = tutorgate_providers::build_from_config(&config)?;
    Ok(Firewall::from_config(provider, &config)?)
}

/// Print a response as plain text or JSON.
pub fn print_response(
    response: &TutoringResponse,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        println!("{}", response.message);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args() -> RequestArgs {
        RequestArgs {
            problem_id: "two-sum".into(),
            problem: "Find two numbers that add to target.".into(),
            code: None,
            session: "cli".into(),
            cognitive: None,
            iteration: None,
            provenance: None,
            json: false,
        }
    }

    #[test]
    fn literal_text_passes_through() {
        assert_eq!(resolve_text("plain text").unwrap(), "plain text");
    }

    #[test]
    fn at_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "def solve():\n    pass\n").unwrap();
        let arg = format!("@{}", file.path().display());
        assert_eq!(resolve_text(&arg).unwrap(), "def solve():\n    pass\n");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = resolve_text("@/definitely/not/here.py").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn no_flags_means_no_snapshot() {
        let request = args().to_request("why?").unwrap();
        assert!(request.behavior.is_none());
        assert!(request.current_code.is_none());
        assert_eq!(request.session_id, "cli");
    }

    #[test]
    fn flags_build_a_snapshot() {
        let mut a = args();
        a.cognitive = Some(CognitiveState::PassiveIdle);
        a.code = Some("x = 1".into());
        let request = a.to_request("").unwrap();
        let snapshot = request.behavior.unwrap();
        assert_eq!(snapshot.cognitive, Some(CognitiveState::PassiveIdle));
        assert_eq!(snapshot.iteration, None);
        assert_eq!(request.current_code.as_deref(), Some("x = 1"));
    }
}
