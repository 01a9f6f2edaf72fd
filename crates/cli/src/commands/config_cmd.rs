//! `tutorgate config`: show the effective or default configuration.

use tutorgate_config::AppConfig;

/// Effective configuration as TOML, with the API key redacted.
pub fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown)
}

pub async fn run(defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if defaults {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    println!(
        "# {}",
        AppConfig::config_dir().join("config.toml").display()
    );
    print!("{}", render(&config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".tutorgate"));
    }

    #[test]
    fn api_key_is_redacted() {
        let config = AppConfig {
            api_key: Some("sk-secret-value".into()),
            ..AppConfig::default()
        };
        let text = render(&config).unwrap();
        assert!(!text.contains("sk-secret-value"));
        assert!(text.contains("[REDACTED]"));
        assert!(text.contains("gpt-4o-mini"));
    }

    #[test]
    fn no_key_renders_without_placeholder() {
        let text = render(&AppConfig::default()).unwrap();
        assert!(!text.contains("api_key"));
        assert!(text.contains("[budget]"));
    }
}
