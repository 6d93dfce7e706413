use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::info;

const CONFIG_TEMPLATE: &str = r#"# mailharvest configuration
# Secrets are loaded from .env (or .env.<ENV> with --env <ENV>)

[database]
host = "${PGHOST}"
database = "${PGDATABASE}"
user = "${PGUSER}"
pass = "${PGPASSWORD}"
# port = 5432
# sslmode = "prefer"   # disable | prefer | require
# table = "messages"

# [archive]
# base_url = "http://mbox.dr-chuck.net/sakai.devel/"
# timeout_secs = 30
# accept_invalid_certs = true

# [harvest]
# commit_every = 50
# pause_every = 100
# pause_ms = 1000
# max_consecutive_failures = 5
"#;

const ENV_EXAMPLE_TEMPLATE: &str = r#"# mailharvest environment variables
# Copy this file to .env and fill in your values

PGHOST=localhost
PGDATABASE=
PGUSER=
PGPASSWORD=
"#;

/// Write the config and env templates into `dir`, leaving existing files alone.
pub fn cmd_init(dir: &Path) -> Result<()> {
    println!("Initializing mailharvest in {}...\n", dir.display());

    write_if_absent(&dir.join(".env.example"), ENV_EXAMPLE_TEMPLATE)?;
    write_if_absent(&dir.join("mailharvest.toml"), CONFIG_TEMPLATE)?;

    println!("\n{}", "mailharvest initialized!".green());
    println!("\nNext steps:");
    println!("  1. Copy .env.example to .env and fill in your database credentials");
    println!("  2. Run: mailharvest setup");
    println!("  3. Run: mailharvest run\n");

    Ok(())
}

fn write_if_absent(path: &Path, content: &str) -> Result<bool> {
    let name = path.file_name().map_or_else(
        || path.display().to_string(),
        |n| n.to_string_lossy().into_owned(),
    );

    if path.exists() {
        println!("{} already exists, skipping", name);
        return Ok(false);
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Created file");
    println!("Created {}", name);
    Ok(true)
}
