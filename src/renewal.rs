//! Batch-renewal generation: names in, `(token id, duration)` rows out.
//!
//! The pipeline is `read -> exclude -> token_id -> dedupe -> write`, with
//! exclusion and deduplication independently switchable.

use std::collections::HashSet;
use std::path::Path;

use alloy::primitives::U256;
use tracing::{debug, info};

use crate::error::Result;
use crate::hash::token_id;
use crate::input::{read_name_lines, Handle};
use crate::interrupt::Interrupt;

pub const DAYS_PER_YEAR: f64 = 365.25;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a number of years into whole seconds using 365.25-day years.
/// Fractions of a second are truncated; negative input yields zero.
pub fn duration_seconds(years: f64) -> u64 {
    (DAYS_PER_YEAR * years * SECONDS_PER_DAY) as u64
}

/// One output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalEntry {
    pub id: U256,
    pub duration: u64,
}

/// Case-insensitive set of names to leave out of a batch.
#[derive(Debug, Default, Clone)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    /// Load one name per line; blank lines are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let set: Self = read_name_lines(path)?
            .into_iter()
            .map(|handle| handle.text)
            .collect();
        info!(
            "Loaded {} excluded names from {}",
            set.len(),
            path.display()
        );
        Ok(set)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.names.contains(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter
                .into_iter()
                .map(|name| name.as_ref().to_lowercase())
                .collect(),
        }
    }
}

/// Keeps the first occurrence of every token id and remembers the rest.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<U256>,
    duplicates: Vec<Handle>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `id` is new. Otherwise records `handle` as a
    /// duplicate and returns `false`.
    pub fn admit(&mut self, id: U256, handle: &Handle) -> bool {
        if self.seen.insert(id) {
            true
        } else {
            debug!("Duplicate at line {}: {}", handle.line, handle.text);
            self.duplicates.push(handle.clone());
            false
        }
    }

    pub fn duplicates(&self) -> &[Handle] {
        &self.duplicates
    }

    pub fn into_duplicates(self) -> Vec<Handle> {
        self.duplicates
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct RenewalReport {
    /// Non-empty names read from the input.
    pub total: usize,
    pub entries: Vec<RenewalEntry>,
    pub duplicates: Vec<Handle>,
    pub excluded: Vec<Handle>,
}

/// Configurable renewal pipeline.
#[derive(Debug, Clone)]
pub struct RenewalBatch {
    duration: u64,
    dedupe: bool,
    exclusions: Option<ExclusionSet>,
    interrupt: Interrupt,
}

impl RenewalBatch {
    /// Pipeline with deduplication on and no exclusion list.
    pub fn new(duration: u64) -> Self {
        Self {
            duration,
            dedupe: true,
            exclusions: None,
            interrupt: Interrupt::default(),
        }
    }

    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = Some(exclusions);
        self
    }

    /// Stop with [`crate::Error::Interrupted`] once `interrupt` fires.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Run the pipeline over handles already in input order.
    pub fn process<I>(&self, handles: I) -> Result<RenewalReport>
    where
        I: IntoIterator<Item = Handle>,
    {
        let mut report = RenewalReport::default();
        let mut dedupe = Deduplicator::new();

        for handle in handles {
            self.interrupt.check()?;
            report.total += 1;

            if let Some(exclusions) = &self.exclusions {
                if exclusions.is_excluded(&handle.text) {
                    debug!("Excluded at line {}: {}", handle.line, handle.text);
                    report.excluded.push(handle);
                    continue;
                }
            }

            let id = token_id(&handle.text);
            if self.dedupe && !dedupe.admit(id, &handle) {
                continue;
            }
            report.entries.push(RenewalEntry {
                id,
                duration: self.duration,
            });
        }

        report.duplicates = dedupe.into_duplicates();
        Ok(report)
    }

    /// Read `path` as one name per line and run the pipeline over it.
    pub fn run(&self, path: &Path) -> Result<RenewalReport> {
        let handles = read_name_lines(path)?;
        info!("Read {} names from {}", handles.len(), path.display());
        self.process(handles)
    }
}
