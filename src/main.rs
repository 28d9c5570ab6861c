use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bts_deps::{base_entries, release_bts_path, Bts, DependencySet, InsertOutcome};
use clap::Parser;

/// Insert the shared AIVoice dependencies into an example project's
/// Release.bts, then append the example-specific overridden settings.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the example project directory
    #[arg(long)]
    project_dir: PathBuf,

    /// Path to the XML file containing example-specific overridden settings
    #[arg(long)]
    deps_xml: PathBuf,

    /// Link the resource-less library set (binary resources are loaded at
    /// runtime instead of built into the speech libraries)
    #[arg(long)]
    no_resource: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let set = if cli.no_resource {
        DependencySet::ResourceLess
    } else {
        DependencySet::Full
    };
    let bts_path = release_bts_path(&cli.project_dir);

    let mut bts = Bts::from_file(&bts_path)
        .with_context(|| format!("Reading {}", bts_path.display()))?;
    for entry in base_entries(set) {
        match bts.insert_list_entry(&entry)? {
            InsertOutcome::Inserted => {}
            InsertOutcome::ContainerNotFound => println!(
                "Target <{}> with <key>{}</key> not found. Skipping...",
                entry.container_path, entry.key
            ),
            InsertOutcome::ValueNotFound => println!(
                "<value> element not found inside for key '{}'. Skipping...",
                entry.key
            ),
        }
    }
    bts.save(&bts_path)
        .with_context(|| format!("Writing {}", bts_path.display()))?;
    println!("Insert Base Settings successfully.");

    // The merge re-reads the file that was just written; no in-memory state
    // is shared between the two operations.
    let mut bts = Bts::from_file(&bts_path)
        .with_context(|| format!("Reading {}", bts_path.display()))?;
    let fragment = fs::read_to_string(&cli.deps_xml)
        .with_context(|| format!("Reading {}", cli.deps_xml.display()))?;
    bts.append_override(&fragment)?;
    bts.save(&bts_path)
        .with_context(|| format!("Writing {}", bts_path.display()))?;
    println!("Add Overridden Settings successfully.");

    Ok(())
}
