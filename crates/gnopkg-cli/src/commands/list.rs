//! `gnopkg list`: expand patterns and print the matched packages.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use gnopkg_graph::{FileKind, LoadResult, Loader, Package, View};
use serde::Serialize;

use crate::cli::ListArgs;
use crate::commands::utils::Session;
use crate::error::Result;
use crate::ui;

/// JSON shape of one listed package.
#[derive(Debug, Serialize)]
struct ListedPackage<'a> {
    import_path: &'a str,
    name: &'a str,
    dir: &'a Path,
    draft: bool,
    ignore: bool,
    imports: &'a [String],
    errors: Vec<String>,
}

impl<'a> From<&'a Arc<Package>> for ListedPackage<'a> {
    fn from(pkg: &'a Arc<Package>) -> Self {
        Self {
            import_path: &pkg.import_path,
            name: &pkg.name,
            dir: &pkg.dir,
            draft: pkg.draft,
            ignore: pkg.ignore,
            imports: pkg.imports_of(FileKind::PackageSource),
            errors: pkg.errors.iter().map(ToString::to_string).collect(),
        }
    }
}

pub async fn execute(args: ListArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(&args.load, config_path, None)?;
    let view = if args.test { View::ExternalTests } else { View::Build };
    let options = session.config.load_options(args.deps, view, args.load.allow_empty);
    let loader = Loader::new(session.setup.resolver.clone(), options);

    let started = Instant::now();
    let result = loader.load(&session.cwd, &args.patterns)?;
    report(&result, args.json, started)
}

fn report(result: &LoadResult, json: bool, started: Instant) -> Result<()> {
    for warning in &result.warnings {
        ui::warning(warning);
    }

    if json {
        let listed: Vec<ListedPackage<'_>> = result.packages.iter().map(Into::into).collect();
        println!("{}", serde_json::to_string_pretty(&listed)?);
    } else {
        for pkg in &result.packages {
            println!("{}", pkg.import_path);
        }
    }

    for pkg in result.packages.iter().filter(|p| p.has_errors()) {
        for err in &pkg.errors {
            ui::error(&format!("{}: {}", pkg.import_path, err));
        }
    }

    let skipped = result.sorted.as_ref().map_or(0, |s| s.skipped().len());
    ui::print_load_summary(result.packages.len(), skipped, started.elapsed());
    Ok(())
}
