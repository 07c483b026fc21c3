//! Ownership checks against the on-chain name registry.
//!
//! A node whose owner is the zero address is unregistered. Lookups go
//! through the [`OwnerLookup`] trait so the converter can run against the
//! live contract or an in-memory [`mock::MockRegistry`].

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use alloy::{
    json_abi::{Function, JsonAbi},
    primitives::{Address, B256},
    providers::{DynProvider, Provider, ProviderBuilder},
    sol,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{Error, Result};

sol! {
    #[sol(rpc)]
    interface IRegistry {
        function owner(bytes32 node) external view returns (address);
    }
}

/// Number of lookup failures logged in full before the rest are suppressed.
pub const VERBOSE_ERRORS: usize = 3;

/// Contract build output as written by `forge build`, or a bare ABI array.
#[derive(Deserialize)]
#[serde(untagged)]
enum Artifact {
    Forge { abi: JsonAbi },
    Bare(JsonAbi),
}

/// The registry's interface description, loaded from a build artifact.
#[derive(Debug, Clone)]
pub struct ContractInterface {
    abi: JsonAbi,
}

impl ContractInterface {
    /// Load a Foundry artifact (`{"abi": [...], ...}`) or a bare ABI file.
    pub fn from_artifact(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Error::Interface(format!(
                "cannot read {}: {}. Run 'forge build' from the project root",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let abi = match serde_json::from_str::<Artifact>(json)? {
            Artifact::Forge { abi } | Artifact::Bare(abi) => abi,
        };
        let interface = Self { abi };
        interface.owner_function()?;
        Ok(interface)
    }

    /// The `owner(bytes32) returns (address)` function, if declared.
    pub fn owner_function(&self) -> Result<&Function> {
        self.abi
            .function("owner")
            .into_iter()
            .flatten()
            .find(|f| {
                f.signature() == "owner(bytes32)"
                    && f.outputs.len() == 1
                    && f.outputs[0].ty == "address"
            })
            .ok_or_else(|| {
                Error::Interface("ABI does not declare owner(bytes32) returns (address)".into())
            })
    }
}

/// Source of node owners.
pub trait OwnerLookup: Send + Sync {
    /// Current owner of `node`; the zero address if nobody holds it.
    fn owner_of(&self, node: B256) -> impl Future<Output = Result<Address>> + Send;
}

/// Live registry contract reached over JSON-RPC.
pub struct RegistryClient {
    contract: IRegistry::IRegistryInstance<DynProvider>,
    timeout: Duration,
}

impl RegistryClient {
    /// Connect and probe the endpoint once with `eth_chainId`.
    ///
    /// Fails if the interface lacks `owner` or the endpoint does not answer
    /// within the configured timeout.
    pub async fn connect(config: &RegistryConfig, interface: &ContractInterface) -> Result<Self> {
        let owner = interface.owner_function()?;
        debug!("Registry interface: {}", owner.full_signature());

        let provider = ProviderBuilder::new()
            .connect_http(config.rpc_url.clone())
            .erased();

        let chain_id = tokio::time::timeout(config.lookup_timeout, provider.get_chain_id())
            .await
            .map_err(|_| {
                Error::Connection(format!(
                    "no answer from {} within {:?}",
                    config.rpc_url, config.lookup_timeout
                ))
            })?
            .map_err(|e| Error::Connection(e.to_string()))?;

        info!("Connected to chain {} via {}", chain_id, config.rpc_url);
        info!("Using Registry contract: {}", config.registry);

        Ok(Self {
            contract: IRegistry::new(config.registry, provider),
            timeout: config.lookup_timeout,
        })
    }

    pub fn address(&self) -> Address {
        *self.contract.address()
    }
}

impl OwnerLookup for RegistryClient {
    fn owner_of(&self, node: B256) -> impl Future<Output = Result<Address>> + Send {
        async move {
            let call = self.contract.owner(node);
            match tokio::time::timeout(self.timeout, call.call()).await {
                Ok(Ok(owner)) => Ok(owner),
                Ok(Err(e)) => Err(Error::Lookup(e.to_string())),
                Err(_) => Err(Error::Timeout(self.timeout)),
            }
        }
    }
}

/// What to do with a node whose owner lookup failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LookupFailurePolicy {
    /// Keep the node and flag it as unverified in the report.
    #[default]
    Retain,
    /// Treat the node as unregistered and drop it.
    Exclude,
    /// Stop the run; no output is written.
    Abort,
}

/// Result of checking one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership {
    Registered(Address),
    Unregistered,
    /// The lookup failed and the policy allowed the run to continue.
    Unverified(String),
}

/// Counts lookup failures and decides how loudly to log them.
#[derive(Debug)]
pub struct ErrorBudget {
    verbose: usize,
    count: usize,
}

impl ErrorBudget {
    pub fn new(verbose: usize) -> Self {
        Self { verbose, count: 0 }
    }

    pub fn record(&mut self, err: &Error) {
        self.count += 1;
        if self.count <= self.verbose {
            warn!("Registry error (will suppress further errors): {}", err);
        } else if self.count == self.verbose + 1 {
            warn!("... (suppressing additional registry errors)");
        } else {
            debug!("Registry error: {}", err);
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_suppressing(&self) -> bool {
        self.count > self.verbose
    }
}

impl Default for ErrorBudget {
    fn default() -> Self {
        Self::new(VERBOSE_ERRORS)
    }
}

/// Applies the zero-owner rule and the failure policy on top of a lookup.
pub struct RegistryFilter<L> {
    lookup: L,
    policy: LookupFailurePolicy,
    errors: ErrorBudget,
}

impl<L: OwnerLookup> RegistryFilter<L> {
    pub fn new(lookup: L, policy: LookupFailurePolicy) -> Self {
        Self {
            lookup,
            policy,
            errors: ErrorBudget::default(),
        }
    }

    /// Check one node. Returns `Err` only under [`LookupFailurePolicy::Abort`].
    pub async fn check(&mut self, node: B256) -> Result<Ownership> {
        match self.lookup.owner_of(node).await {
            Ok(owner) if owner == Address::ZERO => Ok(Ownership::Unregistered),
            Ok(owner) => Ok(Ownership::Registered(owner)),
            Err(e) => {
                self.errors.record(&e);
                match self.policy {
                    LookupFailurePolicy::Abort => Err(e),
                    _ => Ok(Ownership::Unverified(e.to_string())),
                }
            }
        }
    }

    pub fn policy(&self) -> LookupFailurePolicy {
        self.policy
    }

    pub fn errors(&self) -> &ErrorBudget {
        &self.errors
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}


/// In-memory registry for tests and dry runs.
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};

    /// Nodes default to the zero owner unless configured otherwise.
    #[derive(Clone, Default)]
    pub struct MockRegistry {
        owners: Arc<Mutex<HashMap<B256, Address>>>,
        failing: Arc<Mutex<HashSet<B256>>>,
        calls: Arc<Mutex<Vec<B256>>>,
    }

    impl MockRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        /// Record `owner` as the holder of `node`.
        pub fn with_owner(self, node: B256, owner: Address) -> Self {
            self.owners.lock().unwrap().insert(node, owner);
            self
        }

        /// Make every lookup of `node` fail.
        pub fn with_failure(self, node: B256) -> Self {
            self.failing.lock().unwrap().insert(node);
            self
        }

        /// Nodes looked up so far, in call order.
        pub fn calls(&self) -> Vec<B256> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl OwnerLookup for MockRegistry {
        fn owner_of(&self, node: B256) -> impl Future<Output = Result<Address>> + Send {
            let owners = self.owners.clone();
            let failing = self.failing.clone();
            let calls = self.calls.clone();

            async move {
                calls.lock().unwrap().push(node);
                if failing.lock().unwrap().contains(&node) {
                    return Err(Error::Lookup(format!("execution reverted for {}", node)));
                }
                Ok(owners
                    .lock()
                    .unwrap()
                    .get(&node)
                    .copied()
                    .unwrap_or(Address::ZERO))
            }
        }
    }

    #[tokio::test]
    async fn test_mock_defaults_to_zero_owner() {
        let mock = MockRegistry::new();
        let owner = mock.owner_of(B256::repeat_byte(1)).await.unwrap();
        assert_eq!(owner, Address::ZERO);
        assert_eq!(mock.calls(), vec![B256::repeat_byte(1)]);
    }

    #[tokio::test]
    async fn test_filter_classifies_owners() {
        let registered = B256::repeat_byte(1);
        let unregistered = B256::repeat_byte(2);
        let broken = B256::repeat_byte(3);
        let holder = Address::repeat_byte(0xaa);

        let mock = MockRegistry::new()
            .with_owner(registered, holder)
            .with_failure(broken);
        let mut filter = RegistryFilter::new(mock, LookupFailurePolicy::Retain);

        assert_eq!(
            filter.check(registered).await.unwrap(),
            Ownership::Registered(holder)
        );
        assert_eq!(filter.check(unregistered).await.unwrap(), Ownership::Unregistered);
        assert!(matches!(
            filter.check(broken).await.unwrap(),
            Ownership::Unverified(_)
        ));
        assert_eq!(filter.errors().count(), 1);
    }

    #[tokio::test]
    async fn test_filter_abort_policy_propagates() {
        let broken = B256::repeat_byte(3);
        let mock = MockRegistry::new().with_failure(broken);
        let mut filter = RegistryFilter::new(mock, LookupFailurePolicy::Abort);

        assert!(matches!(filter.check(broken).await, Err(Error::Lookup(_))));
        assert_eq!(filter.errors().count(), 1);
    }
}
