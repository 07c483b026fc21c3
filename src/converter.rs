//! Handle-to-namehash conversion with optional registry validation.

use alloy::primitives::B256;
use tracing::info;

use crate::error::Result;
use crate::hash::{full_name, namehash, DEFAULT_SUFFIX};
use crate::input::Handle;
use crate::interrupt::Interrupt;
use crate::registry::{LookupFailurePolicy, OwnerLookup, Ownership, RegistryFilter};

const PROGRESS_INTERVAL: usize = 1_000;

/// A handle that was not written, or was written without confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flagged {
    pub handle: Handle,
    pub full_name: String,
}

/// Outcome of a conversion run.
#[derive(Debug, Default)]
pub struct ConversionReport {
    /// Nodes to write, in input order.
    pub nodes: Vec<B256>,
    /// Owner is the zero address; left out of `nodes`.
    pub unregistered: Vec<Flagged>,
    /// Lookup failed; kept or dropped depending on the policy.
    pub unverified: Vec<Flagged>,
    pub validated: bool,
    pub policy: LookupFailurePolicy,
}

impl ConversionReport {
    /// Lookup failures that were dropped from the output.
    pub fn unverified_dropped(&self) -> usize {
        match self.policy {
            LookupFailurePolicy::Exclude => self.unverified.len(),
            _ => 0,
        }
    }
}

/// Appends the suffix to each handle and computes its namehash.
#[derive(Debug, Clone)]
pub struct Converter {
    suffix: String,
    interrupt: Interrupt,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}

impl Converter {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            interrupt: Interrupt::default(),
        }
    }

    /// Stop with [`crate::Error::Interrupted`] once `interrupt` fires.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Full name and namehash for one handle, used exactly as given.
    pub fn node_for(&self, handle: &str) -> (String, B256) {
        let name = full_name(handle, &self.suffix);
        let node = namehash(&name);
        (name, node)
    }

    /// Convert every handle without consulting the registry.
    pub fn convert(&self, handles: &[Handle]) -> Result<ConversionReport> {
        info!("Converting {} handles to namehashes...", handles.len());

        let mut report = ConversionReport::default();
        for (i, handle) in handles.iter().enumerate() {
            self.interrupt.check()?;
            let (_, node) = self.node_for(&handle.text);
            report.nodes.push(node);

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!(
                    "Converted {}/{} names... ({} generated)",
                    i + 1,
                    handles.len(),
                    report.nodes.len()
                );
            }
        }
        Ok(report)
    }

    /// Convert every handle and drop those the registry reports as unowned.
    ///
    /// Lookups run one at a time in input order. Fails when the filter's
    /// policy is [`LookupFailurePolicy::Abort`] or the run is interrupted.
    pub async fn convert_validated<L: OwnerLookup>(
        &self,
        handles: &[Handle],
        filter: &mut RegistryFilter<L>,
    ) -> Result<ConversionReport> {
        info!(
            "Converting {} handles to namehashes with registry validation...",
            handles.len()
        );

        let mut report = ConversionReport {
            validated: true,
            policy: filter.policy(),
            ..Default::default()
        };

        for (i, handle) in handles.iter().enumerate() {
            self.interrupt.check()?;
            let (name, node) = self.node_for(&handle.text);

            match filter.check(node).await? {
                Ownership::Registered(_) => report.nodes.push(node),
                Ownership::Unregistered => {
                    info!(
                        "UNREGISTERED - Line {}: '{}' -> {}",
                        handle.line, handle.text, name
                    );
                    report.unregistered.push(Flagged {
                        handle: handle.clone(),
                        full_name: name,
                    });
                }
                Ownership::Unverified(_) => {
                    if report.policy == LookupFailurePolicy::Retain {
                        report.nodes.push(node);
                    }
                    report.unverified.push(Flagged {
                        handle: handle.clone(),
                        full_name: name,
                    });
                }
            }

            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!(
                    "Converted {}/{} names... (Found {} unregistered, {} valid)",
                    i + 1,
                    handles.len(),
                    report.unregistered.len(),
                    report.nodes.len()
                );
            }
        }

        Ok(report)
    }
}
