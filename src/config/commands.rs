//! Config command handlers

use anyhow::{Context, Result};
use colored::Colorize;

use super::Config;
use crate::cli::{ConfigAction, ConfigArgs};

pub fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(),
        ConfigAction::Init { force } => init_config(force),
        ConfigAction::Set { key, value } => set_config(&key, &value),
        ConfigAction::Get { key } => get_config(&key),
        ConfigAction::Path => show_path(),
    }
}

fn show_config() -> Result<()> {
    let mut config = Config::load()?;
    config.openai.api_key = mask_key(&config.openai.api_key);
    let content = toml::to_string_pretty(&config)?;

    println!("{}", "[Config]".green());
    println!("{}", content);

    Ok(())
}

fn init_config(force: bool) -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    if path.exists() && !force {
        println!(
            "{}",
            format!("Config file already exists: {}", path.display()).yellow()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let saved_path = Config::default().save()?;

    println!("{}", "[Config] Initialized".green());
    println!("  Created: {}", saved_path.display());
    println!();
    println!("Point the server at your model backend, e.g.:");
    println!("  meditongue config set backend.provider openai");

    Ok(())
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    set_value(&mut config, key, value)?;
    config.save()?;

    println!("{}", format!("[Config] Set {} = {}", key, value).green());
    Ok(())
}

fn set_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["server", "host"] => config.server.host = value.to_string(),
        ["server", "port"] => {
            config.server.port = value
                .parse()
                .with_context(|| format!("Invalid port: {}", value))?;
        }
        ["backend", "provider"] => config.backend.provider = value.to_string(),
        ["backend", "request_timeout_secs"] => {
            config.backend.request_timeout_secs = if value.is_empty() {
                None
            } else {
                Some(
                    value
                        .parse()
                        .with_context(|| format!("Invalid timeout: {}", value))?,
                )
            };
        }
        ["ollama", "base_url"] => config.ollama.base_url = value.to_string(),
        ["ollama", "model"] => config.ollama.model = value.to_string(),
        ["openai", "base_url"] => config.openai.base_url = value.to_string(),
        ["openai", "api_key"] => config.openai.api_key = value.to_string(),
        ["openai", "model"] => config.openai.model = value.to_string(),
        ["openai", "temperature"] => {
            config.openai.temperature = value
                .parse()
                .with_context(|| format!("Invalid temperature: {}", value))?;
        }
        ["glossary", "path"] => {
            config.glossary.path = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            };
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }

    Ok(())
}

fn get_config(key: &str) -> Result<()> {
    let config = Config::load()?;

    match get_value(&config, key)? {
        Some(v) => println!("{} = {}", key, v),
        None => println!("{} = (not set)", key),
    }

    Ok(())
}

fn get_value(config: &Config, key: &str) -> Result<Option<String>> {
    let parts: Vec<&str> = key.split('.').collect();

    let value = match parts.as_slice() {
        ["server", "host"] => Some(config.server.host.clone()),
        ["server", "port"] => Some(config.server.port.to_string()),
        ["backend", "provider"] => Some(config.backend.provider.clone()),
        ["backend", "request_timeout_secs"] => {
            config.backend.request_timeout_secs.map(|s| s.to_string())
        }
        ["ollama", "base_url"] => Some(config.ollama.base_url.clone()),
        ["ollama", "model"] => Some(config.ollama.model.clone()),
        ["openai", "base_url"] => Some(config.openai.base_url.clone()),
        ["openai", "api_key"] => Some(mask_key(&config.openai.api_key)),
        ["openai", "model"] => Some(config.openai.model.clone()),
        ["openai", "temperature"] => Some(config.openai.temperature.to_string()),
        ["glossary", "path"] => config.glossary.path.clone(),
        _ => anyhow::bail!("Unknown config key: {}", key),
    };

    Ok(value)
}

fn show_path() -> Result<()> {
    match Config::config_path() {
        Some(path) => {
            println!("{}", path.display());
            if path.exists() {
                println!("{}", "(exists)".green());
            } else {
                println!("{}", "(not created)".yellow());
            }
        }
        None => {
            println!("{}", "Could not determine config path".red());
        }
    }
    Ok(())
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_roundtrip_keys() {
        let mut config = Config::default();
        set_value(&mut config, "backend.provider", "openai").unwrap();
        set_value(&mut config, "server.port", "9000").unwrap();
        set_value(&mut config, "glossary.path", "/data/terms.json").unwrap();

        assert_eq!(
            get_value(&config, "backend.provider").unwrap().as_deref(),
            Some("openai")
        );
        assert_eq!(
            get_value(&config, "server.port").unwrap().as_deref(),
            Some("9000")
        );

        set_value(&mut config, "glossary.path", "").unwrap();
        assert_eq!(get_value(&config, "glossary.path").unwrap(), None);
    }

    #[test]
    fn test_unknown_and_invalid_keys() {
        let mut config = Config::default();
        assert!(set_value(&mut config, "api.provider", "openai").is_err());
        assert!(set_value(&mut config, "server.port", "http").is_err());
        assert!(get_value(&config, "nope").is_err());
    }

    #[test]
    fn test_api_key_is_masked() {
        let mut config = Config::default();
        set_value(&mut config, "openai.api_key", "sk-1234567890abcd").unwrap();
        assert_eq!(
            get_value(&config, "openai.api_key").unwrap().as_deref(),
            Some("sk-1...abcd")
        );
        assert_eq!(mask_key("short"), "*****");
    }
}
