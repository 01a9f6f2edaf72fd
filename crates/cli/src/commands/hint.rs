//! `tutorgate hint`: request a proactive hint, optionally with a question.

use super::{RequestArgs, load_firewall, print_response};

pub async fn run(args: RequestArgs, query: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let request = args.to_request(query.as_deref().unwrap_or_default())?;
    let firewall = load_firewall()?;

    let response = firewall.hint(&request).await?;
    print_response(&response, args.json)
}
