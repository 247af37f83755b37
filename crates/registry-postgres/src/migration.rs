use anyhow::{bail, Result};
use std::process::Command;
use tracing::debug;

/// Runs goose SQL migrations by shelling out to the goose binary.
pub struct MigrationRunner {
    goose_binary_path: String,
    migrations_dir: String,
    dsn: String,
}

impl MigrationRunner {
    pub fn new(goose_binary_path: String, migrations_dir: String, dsn: String) -> Self {
        Self {
            goose_binary_path,
            migrations_dir,
            dsn,
        }
    }

    /// Runs all pending migrations (`goose -dir {migrations_dir} postgres {dsn} up`).
    pub async fn run_migrations(&self) -> Result<()> {
        debug!("running migrations from directory: {}", self.migrations_dir);

        let output = Command::new(&self.goose_binary_path)
            .arg("-dir")
            .arg(&self.migrations_dir)
            .arg("postgres")
            .arg(&self.dsn)
            .arg("up")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("goose migration failed: {}", stderr);
        }

        debug!("migrations up to date");
        Ok(())
    }
}
