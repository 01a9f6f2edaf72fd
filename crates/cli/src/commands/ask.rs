//! `tutorgate ask`: ask the tutor a question about an exercise.

use super::{RequestArgs, load_firewall, print_response};

pub async fn run(args: RequestArgs, query: String) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.to_request(&query)?;
    let firewall = load_firewall()?;

    let response = firewall.ask(&request).await?;
    if !response.is_allowed {
        tracing::info!("Query was outside the tutor's scope");
    }
    print_response(&response, args.json)
}
