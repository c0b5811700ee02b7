//! Command handlers.

use crate::config::CliConfig;
use console::style;
use ironlicensing::{
    HttpTransport, License, LicenseClient, LicenseResult, LicenseTransport, MachineIdStore,
};
use serde::Serialize;

type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Output mode shared by every handler.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

impl Output {
    fn print_json<T: Serialize>(&self, value: &T) -> CliResult {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn client(config: &CliConfig) -> CliResult<LicenseClient> {
    Ok(LicenseClient::new(config.license_options()?)?)
}

fn resolve_key(config: &CliConfig, key: Option<String>) -> CliResult<String> {
    key.or_else(|| config.license_key.clone())
        .ok_or_else(|| "No license key given and none remembered. Pass one explicitly.".into())
}

fn prompt_email(prompt: &str) -> CliResult<String> {
    use dialoguer::Input;

    let email: String = Input::new().with_prompt(prompt).interact_text()?;
    Ok(email)
}

fn print_license(license: &License) {
    println!("  Key:         {}", license.key);
    println!("  Status:      {}", style(license.status).bold());
    println!("  Type:        {}", license.license_type);
    if let Some(email) = &license.email {
        println!("  Email:       {}", email);
    }
    match license.expires_at {
        Some(at) => println!("  Expires:     {}", at.format("%Y-%m-%d")),
        None => println!("  Expires:     {}", style("never").dim()),
    }
    println!(
        "  Activations: {}/{}",
        license.current_activations, license.max_activations
    );
    if license.features.is_empty() {
        println!("  Features:    {}", style("(none)").dim());
    } else {
        println!("  Features:");
        for feature in &license.features {
            let mark = if feature.enabled {
                style("✓").green()
            } else {
                style("✗").red()
            };
            println!(
                "    {} {} {}",
                mark,
                feature.key,
                style(feature.name.as_deref().unwrap_or("")).dim()
            );
        }
    }
}

fn report(out: Output, verb: &str, result: &LicenseResult) -> CliResult {
    if out.json {
        return out.print_json(result);
    }
    match (&result.license, result.valid) {
        (Some(license), true) => {
            println!("{} License {}", style("✓").green(), verb);
            print_license(license);
        }
        (None, true) => println!("{} License {}", style("✓").green(), verb),
        _ => println!(
            "{} {}",
            style("✗").red(),
            result.error.as_deref().unwrap_or("License rejected")
        ),
    }
    Ok(())
}

/// Validate a key. Returns whether the key was accepted.
pub async fn validate(config: &CliConfig, out: Output, key: &str) -> CliResult<bool> {
    let result = client(config)?.validate(key).await;
    report(out, "valid", &result)?;
    Ok(result.valid)
}

/// Activate a key and remember it.
pub async fn activate(
    config: &CliConfig,
    out: Output,
    key: &str,
    machine_name: Option<&str>,
) -> CliResult<bool> {
    let result = client(config)?.activate(key, machine_name).await;
    if result.valid {
        remember_key(Some(key.to_string()))?;
    }
    report(out, "activated", &result)?;
    Ok(result.valid)
}

/// Deactivate a key and forget it.
pub async fn deactivate(config: &CliConfig, out: Output, key: Option<String>) -> CliResult<bool> {
    let key = resolve_key(config, key)?;
    // A fresh process holds no license, so go straight to the transport.
    let transport = HttpTransport::new(&config.license_options()?)?;
    let ok = transport.deactivate(&key).await;

    if ok && config.license_key.as_deref() == Some(key.as_str()) {
        remember_key(None)?;
    }

    if out.json {
        out.print_json(&serde_json::json!({ "success": ok }))?;
    } else if ok {
        println!("{} License deactivated", style("✓").green());
    } else {
        println!("{} Deactivation failed", style("✗").red());
    }
    Ok(ok)
}

/// Start a trial and remember the issued key.
pub async fn trial(config: &CliConfig, out: Output, email: Option<String>) -> CliResult<bool> {
    let email = match email {
        Some(email) => email,
        None => prompt_email("Email for the trial")?,
    };
    let result = client(config)?.start_trial(&email).await;
    if let Some(license) = result.accepted_license() {
        remember_key(Some(license.key.clone()))?;
    }
    report(out, "trial started", &result)?;
    Ok(result.valid)
}

/// Validate a key and print its status.
pub async fn status(config: &CliConfig, out: Output, key: Option<String>) -> CliResult {
    let key = resolve_key(config, key)?;
    let client = client(config)?;
    let result = client.validate(&key).await;

    if out.json {
        let license = client.license();
        let features: Vec<&str> = license
            .as_ref()
            .map(|l| l.enabled_features().collect())
            .unwrap_or_default();
        return out.print_json(&serde_json::json!({
            "status": client.status(),
            "licensed": client.is_licensed(),
            "trial": client.is_trial(),
            "features": features,
            "license": license,
            "error": result.error,
        }));
    }

    println!(
        "Status: {}  licensed: {}  trial: {}",
        style(client.status()).bold(),
        client.is_licensed(),
        client.is_trial()
    );
    match client.license() {
        Some(license) => print_license(&license),
        None => {
            if let Some(error) = &result.error {
                println!("  {}", style(error).dim());
            }
        }
    }
    Ok(())
}

/// Whether a feature is licensed under the given or remembered key.
pub async fn require(
    config: &CliConfig,
    out: Output,
    feature: &str,
    key: Option<String>,
) -> CliResult<bool> {
    let key = resolve_key(config, key)?;
    let client = client(config)?;
    client.validate(&key).await;
    let outcome = client.require_feature(feature);

    if out.json {
        out.print_json(&serde_json::json!({
            "feature": feature,
            "licensed": outcome.is_ok(),
        }))?;
    } else {
        match &outcome {
            Ok(()) => println!("{} Feature {} is licensed", style("✓").green(), feature),
            Err(e) => {
                println!("{} {}", style("✗").red(), e);
                if let Some(license) = client.license() {
                    let enabled: Vec<&str> = license.enabled_features().collect();
                    println!("  Licensed features: {}", enabled.join(", "));
                }
            }
        }
    }
    Ok(outcome.is_ok())
}

/// List tiers.
pub async fn tiers(config: &CliConfig, out: Output) -> CliResult {
    let tiers = client(config)?.tiers().await;
    if out.json {
        return out.print_json(&tiers);
    }
    if tiers.is_empty() {
        println!("{} No tiers available", style("i").blue());
        return Ok(());
    }
    for tier in &tiers {
        println!(
            "{} {} {}  {}",
            style(&tier.name).bold(),
            style(format!("({})", tier.id)).dim(),
            tier.display_price(),
            tier.billing_period.as_deref().unwrap_or("")
        );
        for feature in tier.features.iter().filter(|f| f.enabled) {
            println!("    - {}", feature.name.as_deref().unwrap_or(&feature.key));
        }
    }
    Ok(())
}

/// Start a checkout session.
pub async fn checkout(
    config: &CliConfig,
    out: Output,
    tier_id: &str,
    email: Option<String>,
) -> CliResult<bool> {
    let email = match email {
        Some(email) => email,
        None => prompt_email("Billing email")?,
    };
    let result = client(config)?.start_purchase(tier_id, &email).await;
    if out.json {
        out.print_json(&result)?;
    } else if result.success {
        println!("{} Checkout session created", style("✓").green());
        if let Some(url) = &result.checkout_url {
            println!("  Open: {}", style(url).underlined());
        }
    } else {
        println!(
            "{} {}",
            style("✗").red(),
            result.error.as_deref().unwrap_or("Checkout failed")
        );
    }
    Ok(result.success)
}

/// Print the machine identifier.
pub fn machine_id(out: Output) -> CliResult {
    let store = MachineIdStore::user_default();
    let id = store.load_or_create();
    if out.json {
        return out.print_json(&serde_json::json!({
            "machineId": id,
            "path": store.path().map(|p| p.display().to_string()),
        }));
    }
    println!("{}", id);
    Ok(())
}

/// Show configuration.
pub fn show_config(config: &CliConfig, out: Output) -> CliResult {
    if out.json {
        return out.print_json(config);
    }
    println!("Current configuration:");
    println!("  api_url: {}", config.api_url);
    println!(
        "  public_key: {}",
        config.public_key.as_deref().unwrap_or("(not set)")
    );
    println!(
        "  product_slug: {}",
        config.product_slug.as_deref().unwrap_or("(not set)")
    );
    println!("  debug: {}", config.debug);
    match config.http_timeout_secs {
        Some(secs) => println!("  http_timeout_secs: {}", secs),
        None => println!("  http_timeout_secs: (default)"),
    }
    if let Some(path) = &config.machine_id_path {
        println!("  machine_id_path: {}", path.display());
    }
    println!(
        "  license_key: {}",
        if config.license_key.is_some() {
            "***"
        } else {
            "(not set)"
        }
    );

    if let Ok(path) = CliConfig::config_path() {
        println!("\nConfig file: {}", path.display());
    }

    Ok(())
}

/// Set configuration.
pub fn set_config(key: &str, value: &str) -> CliResult {
    let mut config = CliConfig::load().unwrap_or_default();
    config.set(key, value)?;
    config.save()?;

    println!("{} Set {} = {}", style("✓").green(), key, value);
    Ok(())
}

fn remember_key(key: Option<String>) -> CliResult {
    let mut config = CliConfig::load().unwrap_or_default();
    config.license_key = key;
    config.save()
}
