//! `gnopkg resolve`: look import paths up through the resolver stack.

use std::path::Path;

use crate::cli::ResolveArgs;
use crate::commands::utils::Session;
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(args: ResolveArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(&args.load, config_path, None)?;
    let resolver = &session.setup.resolver;

    let mut failed = 0;
    for path in &args.paths {
        match resolver.resolve(path) {
            Ok(pkg) => {
                let location = if pkg.dir.as_os_str().is_empty() {
                    format!("{:?}", pkg.kind)
                } else {
                    pkg.dir.display().to_string()
                };
                println!("{}\t{}", pkg.import_path, location);
            }
            Err(err) if err.is_skip() => ui::info(&err.to_string()),
            Err(err) => {
                ui::error(&err.to_string());
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::Custom(format!(
            "{} of {} import paths could not be resolved",
            failed,
            args.paths.len()
        )));
    }
    Ok(())
}
