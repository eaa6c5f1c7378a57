//! `inkwell config` — Configuration management commands.

use inkwell_config::{AppConfig, KeyMode};

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Model:       {}", config.default_model);
            println!("   Key mode:    {:?}", config.key_mode);
            println!(
                "   Notes dir:   {}",
                config
                    .notes_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(none)".into())
            );
            println!(
                "   Limits:      input {} chars, sample {}×{} chars, references {} chars, {} exchanges",
                config.limits.max_input_chars,
                config.limits.sample_count,
                config.limits.sample_char_cap,
                config.limits.reference_char_cap,
                config.limits.max_exchanges
            );
            println!("   Lore auto:   {}", config.lore.auto_create);
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Problems that do not stop loading but will bite at request time.
fn warnings(config: &AppConfig) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if config.key_mode == KeyMode::Stored && !config.has_api_key() {
        warnings.push("key_mode is \"stored\" but no API key is set (set INKWELL_API_KEY)");
    }
    if config.limits.sample_count == 0 {
        warnings.push("sample_count is 0, so no project context will be sampled");
    }
    if let Some(dir) = &config.notes_dir
        && !dir.is_dir()
    {
        warnings.push("notes_dir does not exist");
    }
    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let config_path = dir.join("config.toml");
    if config_path.exists() {
        println!("   Config already exists at {}", config_path.display());
        return Ok(());
    }
    std::fs::create_dir_all(&dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("   ✅ Wrote {}", config_path.display());
    Ok(())
}
