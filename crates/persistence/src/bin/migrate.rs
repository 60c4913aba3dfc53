#![deny(warnings)]

//! Rewrite save files at the current schema.
//!
//! Usage: `migrate [--dir <saves>] [file.json ...]`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use fund_core::SNAPSHOT_SCHEMA_VERSION;
use persistence::{list_saves, migrate_file, save_path};

fn main() -> Result<()> {
    let mut targets: Vec<PathBuf> = Vec::new();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--dir" => {
                let dir = PathBuf::from(it.next().context("--dir needs a path")?);
                for name in list_saves(&dir)? {
                    targets.push(save_path(&dir, &name));
                }
            }
            _ => targets.push(PathBuf::from(arg)),
        }
    }
    if targets.is_empty() {
        bail!("nothing to migrate; pass save files or --dir <saves>");
    }

    for path in &targets {
        let from = migrate_file(path).with_context(|| format!("migrating {}", path.display()))?;
        println!(
            "{}: schema {} -> {}",
            path.display(),
            from,
            SNAPSHOT_SCHEMA_VERSION
        );
    }
    Ok(())
}
