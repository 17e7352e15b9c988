//! `gnopkg graph`: print the dependency-ordered import graph.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use gnopkg_graph::{Loader, Package, SortedPackages, View};
use owo_colors::OwoColorize;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::cli::GraphArgs;
use crate::commands::utils::Session;
use crate::error::{CliError, Result};
use crate::ui;

#[derive(Debug, Serialize)]
struct GraphNode<'a> {
    import_path: &'a str,
    imports: &'a [String],
}

#[derive(Debug, Serialize)]
struct GraphReport<'a> {
    view: String,
    packages: Vec<GraphNode<'a>>,
    skipped: BTreeMap<&'a str, String>,
}

pub async fn execute(args: GraphArgs, config_path: Option<&Path>) -> Result<()> {
    let session = Session::open(&args.load, config_path, None)?;
    let view = View::from(args.view);
    let options = session.config.load_options(true, view, args.load.allow_empty);
    let loader = Loader::new(session.setup.resolver.clone(), options);

    let started = Instant::now();
    let result = loader.load(&session.cwd, &args.patterns)?;
    for warning in &result.warnings {
        ui::warning(warning);
    }
    let sorted = result
        .sorted
        .ok_or_else(|| CliError::Custom("graph was not built".to_string()))?;

    let packages = select(&sorted, args.non_draft, args.non_ignored);
    if args.json {
        print_json(&sorted, &packages)?;
    } else {
        print_tree(&sorted, &packages);
    }

    ui::print_load_summary(packages.len(), sorted.skipped().len(), started.elapsed());
    Ok(())
}

/// Sorted packages that survive the requested filters, in build order.
fn select(sorted: &SortedPackages, non_draft: bool, non_ignored: bool) -> Vec<Arc<Package>> {
    let keep = |filtered: Vec<Arc<Package>>| -> FxHashSet<String> {
        filtered.into_iter().map(|p| p.import_path.clone()).collect()
    };
    let drafts = non_draft.then(|| keep(sorted.non_draft()));
    let ignored = non_ignored.then(|| keep(sorted.non_ignored()));

    sorted
        .iter()
        .filter(|p| drafts.as_ref().is_none_or(|k| k.contains(&p.import_path)))
        .filter(|p| ignored.as_ref().is_none_or(|k| k.contains(&p.import_path)))
        .cloned()
        .collect()
}

fn print_tree(sorted: &SortedPackages, packages: &[Arc<Package>]) {
    let colors = ui::colors_enabled();
    for pkg in packages {
        if colors {
            println!("{}", pkg.import_path.bold());
        } else {
            println!("{}", pkg.import_path);
        }
        for dep in sorted.view_edges(&pkg.import_path) {
            match sorted.skipped().get(dep) {
                Some(reason) => println!("  -> {} ({})", dep, reason),
                None => println!("  -> {}", dep),
            }
        }
    }
}

fn print_json(sorted: &SortedPackages, packages: &[Arc<Package>]) -> Result<()> {
    let report = GraphReport {
        view: sorted.view().to_string(),
        packages: packages
            .iter()
            .map(|p| GraphNode {
                import_path: &p.import_path,
                imports: sorted.view_edges(&p.import_path),
            })
            .collect(),
        skipped: sorted
            .skipped()
            .iter()
            .map(|(path, reason)| (path.as_str(), reason.to_string()))
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
