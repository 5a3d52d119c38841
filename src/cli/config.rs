//! Config subcommand implementation.
//!
//! Handles the `hunt config` command for inspecting and writing settings.

use super::load_settings;
use crate::config::{Paths, ScanSettings};
use crate::error::CliResult;
use crate::output;
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

/// Show or initialize the settings file.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Settings actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings as JSON
    Show,

    /// Print the settings file location
    Path,

    /// Write the default settings to disk
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl ConfigCommand {
    /// Execute the config command.
    ///
    /// `file` is the explicit `--config` path, if any. Only `show` reads the
    /// settings, so a broken file can still be located and overwritten.
    pub fn execute(&self, file: Option<&Path>, quiet: bool) -> CliResult<()> {
        match &self.action {
            ConfigAction::Show => {
                let settings = load_settings(file)?;
                let json = serde_json::to_string_pretty(&settings)
                    .map_err(crate::error::ConfigError::from)?;
                println!("{}", json);
                Ok(())
            }
            ConfigAction::Path => {
                println!("{}", settings_path(file)?.display());
                Ok(())
            }
            ConfigAction::Init { force } => self.init(file, *force, quiet),
        }
    }

    fn init(&self, file: Option<&Path>, force: bool, quiet: bool) -> CliResult<()> {
        let path = settings_path(file)?;

        if path.exists() && !force {
            output::print_warning(&format!(
                "{} already exists, use --force to overwrite",
                path.display()
            ));
            return Ok(());
        }

        let defaults = ScanSettings::default();
        let written = match file {
            Some(path) => {
                defaults.save_to(path)?;
                path.to_path_buf()
            }
            None => defaults.save()?,
        };

        if !quiet {
            output::print_info(&format!(
                "Wrote default settings to {}",
                style(written.display()).bold()
            ));
        }
        Ok(())
    }
}

fn settings_path(file: Option<&Path>) -> CliResult<PathBuf> {
    match file {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(Paths::new()?.settings_file()),
    }
}
