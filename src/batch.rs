//! Parallel parsing of independent source units using Rayon.
//!
//! Every unit is lexed and parsed on its own with no shared state, so the
//! work is embarrassingly parallel. Reports come back in input order.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::config::{LanguageProfile, ParseOptions};
use crate::parser::{self, ParseOutput};

/// A source unit to parse.
#[derive(Debug, Clone)]
pub struct Unit {
    pub path: PathBuf,
    pub source: String,
    pub options: ParseOptions,
}

impl Unit {
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>, options: ParseOptions) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            options,
        }
    }

    /// Read `path`, picking the profile from its extension unless `profile`
    /// overrides it.
    pub fn read(
        path: &Path,
        profile: Option<LanguageProfile>,
        base: ParseOptions,
    ) -> std::io::Result<Self> {
        let source = fs::read_to_string(path)?;
        let options = ParseOptions {
            profile: profile.unwrap_or_else(|| LanguageProfile::from_path(path)),
            ..base
        };
        Ok(Self::new(path, source, options))
    }
}

/// Result of parsing one unit.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub path: PathBuf,
    pub output: ParseOutput,
}

impl UnitReport {
    pub fn has_errors(&self) -> bool {
        self.output.has_errors()
    }
}

/// Parse every unit, in parallel when there is more than one.
pub fn parse_units(units: &[Unit]) -> Vec<UnitReport> {
    tracing::info!(units = units.len(), "parsing batch");
    let reports: Vec<UnitReport> = if units.len() <= 1 {
        units.iter().map(parse_unit).collect()
    } else {
        units.par_iter().map(parse_unit).collect()
    };
    let failed = reports.iter().filter(|r| r.has_errors()).count();
    tracing::info!(units = reports.len(), failed, "batch complete");
    reports
}

fn parse_unit(unit: &Unit) -> UnitReport {
    let output = parser::parse(&unit.source, &unit.options);
    tracing::debug!(
        path = %unit.path.display(),
        items = output.program.items.len(),
        diagnostics = output.diagnostics.len(),
        "parsed unit"
    );
    UnitReport {
        path: unit.path.clone(),
        output,
    }
}
