//! Rewrite cells of a target grid wherever a mask grid holds one of the ids of a mask table.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use ndarray::Zip;

use crate::{
    errors::HydroGridErr,
    grid::{append_dataset, open_dataset, Grid, GridLayout},
    mask_table::{truncate_key, MaskTable},
};

/// Everything needed for one rewrite, built once from the command line.
#[derive(Clone, Debug)]
pub struct RewriteConfig {
    /// Dataset holding the mask variable.
    pub source: PathBuf,
    /// Dataset to modify. Copied from `source` if it does not exist yet.
    pub target: PathBuf,
    /// The mask table file.
    pub table: PathBuf,
    /// Name of the mask variable in `source`.
    pub mask_var: String,
    /// Name of the variable to change in `target`.
    pub target_var: String,
}

/// Counts from a finished rewrite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Cells visited.
    pub scanned: usize,
    /// Cells whose mask value matched a key.
    pub matched: usize,
    /// Matched cells whose value actually changed.
    pub changed: usize,
}

/// Result of a complete rewrite operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewriteSummary {
    /// True if the target dataset was created by copying the source during this run.
    pub copied: bool,
    /// Cell counts.
    pub stats: RewriteStats,
}

/// Make sure the target dataset exists, copying the source byte for byte if it does not.
///
/// Returns `true` if a copy was made. An existing target is left alone so repeated runs
/// accumulate their changes in the same file.
pub fn stage_target(source: &Path, target: &Path) -> Result<bool, HydroGridErr> {
    if target.is_file() {
        tracing::info!("Writing to output file: {}", target.display());
        return Ok(false);
    }

    if !source.is_file() {
        return Err(HydroGridErr::ResourceUnavailable {
            path: PathBuf::from(source),
            reason: "input file not available".to_owned(),
        });
    }

    tracing::info!("Copying {} to {}", source.display(), target.display());
    std::fs::copy(source, target).map_err(|err| HydroGridErr::ResourceUnavailable {
        path: PathBuf::from(target),
        reason: err.to_string(),
    })?;

    Ok(true)
}

/// Overwrite every target cell whose co-located mask cell matches a table key.
///
/// The grids must be conformant. Every table value is checked against the element kind of the
/// target before any cell is written, so a failure leaves `target` untouched.
pub fn apply(
    mask: &Grid,
    target: &mut Grid,
    table: &MaskTable,
) -> Result<RewriteStats, HydroGridErr> {
    mask.ensure_conformant(target)?;

    let kind = target.kind();
    let mut lookup = HashMap::with_capacity(table.len());
    for (key, value) in table.lookup() {
        let stored = value
            .to_f64()
            .and_then(|val| kind.coerce(val))
            .ok_or_else(|| HydroGridErr::ValueOutOfRange {
                value: value.to_string(),
                kind,
            })?;
        lookup.insert(key, stored);
    }

    let mut stats = RewriteStats::default();

    Zip::from(target.data_mut())
        .and(mask.data())
        .for_each(|cell, &mask_val| {
            stats.scanned += 1;

            let new_val = match truncate_key(mask_val).and_then(|key| lookup.get(&key)) {
                Some(&new_val) => new_val,
                None => return,
            };

            stats.matched += 1;
            if cell.to_bits() != new_val.to_bits() {
                stats.changed += 1;
                *cell = new_val;
            }
        });

    Ok(stats)
}

/// Run a whole rewrite: load the table, stage the target, check the grids, rewrite, write back.
pub fn run(config: &RewriteConfig) -> Result<RewriteSummary, HydroGridErr> {
    // The table loads before anything is copied.
    let table = MaskTable::load(&config.table)?;
    if table.is_empty() {
        tracing::warn!("mask table has no entries, nothing will change");
    }

    let copied = stage_target(&config.source, &config.target)?;

    let source = open_dataset(&config.source)?;
    let mut target = append_dataset(&config.target)?;

    let mask_layout = GridLayout::read(&source, &config.source, &config.mask_var)?;
    let target_layout = GridLayout::read(&target, &config.target, &config.target_var)?;
    mask_layout.ensure_conformant(&target_layout)?;

    let mask = Grid::read(&source, &config.source, &config.mask_var)?;
    let mut grid = Grid::read(&target, &config.target, &config.target_var)?;
    drop(source);

    let stats = apply(&mask, &mut grid, &table)?;
    tracing::info!(
        "{} of {} cells matched, {} changed",
        stats.matched,
        stats.scanned,
        stats.changed
    );

    grid.write_back(&mut target, &config.target)?;
    // Dropping the handle flushes and closes the dataset.
    drop(target);

    Ok(RewriteSummary { copied, stats })
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
