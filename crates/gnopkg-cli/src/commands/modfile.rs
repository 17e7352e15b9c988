//! `gnopkg mod`: module file utilities.

use std::path::Path;

use gnopkg_mod::{ModuleDiscovery, to_toml_string};

use crate::cli::{ModArgs, ModCommand};
use crate::commands::utils::resolve_path;
use crate::error::{Result, ResultExt};
use crate::ui;

pub async fn execute(args: ModArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("Unable to determine the working directory")?;
    match args.command {
        ModCommand::Migrate { dir } => migrate(&resolve_path(&dir, &cwd)),
        ModCommand::Show { dir } => show(&resolve_path(&dir, &cwd)),
    }
}

fn migrate(dir: &Path) -> Result<()> {
    std::fs::metadata(dir).with_path(dir)?;
    let target = gnopkg_mod::migrate_dir(dir)
        .with_hint("The directory needs a gno.mod file, or already has a gnomod.toml")?;
    ui::success(&format!("Wrote {}", target.display()));
    Ok(())
}

fn show(dir: &Path) -> Result<()> {
    std::fs::metadata(dir).with_path(dir)?;
    let module = ModuleDiscovery::new(dir).load()?;
    print!("{}", to_toml_string(&module)?);
    Ok(())
}
