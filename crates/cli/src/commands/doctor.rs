//! `tutorgate doctor`: check configuration, credentials and the provider.

use std::time::Duration;
use tutorgate_config::AppConfig;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("tutorgate doctor");
    println!("================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  [ok]   Config file found at {}", config_path.display());
    } else {
        println!("  [info] No config file, using defaults (`tutorgate config --defaults` prints one)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            println!("         provider = {}, model = {}", config.provider, config.model);
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            return Err("configuration invalid".into());
        }
    };

    if config.has_api_key() {
        println!("  [ok]   API key configured");
        match tutorgate_providers::build_from_config(&config) {
            Ok(provider) => {
                match tokio::time::timeout(HEALTH_TIMEOUT, provider.health_check()).await {
                    Ok(Ok(true)) => println!("  [ok]   Provider '{}' reachable", provider.name()),
                    Ok(Ok(false)) => {
                        println!("  [warn] Provider '{}' answered with an error", provider.name());
                        issues += 1;
                    }
                    Ok(Err(e)) => {
                        println!("  [fail] Provider check failed: {e}");
                        issues += 1;
                    }
                    Err(_) => {
                        println!("  [fail] Provider did not answer within {}s", HEALTH_TIMEOUT.as_secs());
                        issues += 1;
                    }
                }
            }
            Err(e) => {
                println!("  [fail] Provider setup failed: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  [warn] No API key configured (set TUTORGATE_API_KEY)");
        issues += 1;
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
        Ok(())
    } else {
        println!("  {issues} issue(s) found. See above for details.");
        Err(format!("{issues} issue(s) found").into())
    }
}
