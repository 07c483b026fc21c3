//! Registry configuration, read once at startup.
//!
//! Values come from the process environment (after `.env` has been loaded
//! by the binary). Nothing here is consulted unless registry validation
//! was requested.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use url::Url;

use crate::error::{Error, Result};

pub const RPC_URL_VAR: &str = "BASE_RPC_URL";
pub const REGISTRY_ADDR_VAR: &str = "REGISTRY_ADDR";
pub const ABI_PATH_VAR: &str = "REGISTRY_ABI_PATH";
pub const LOOKUP_TIMEOUT_VAR: &str = "REGISTRY_LOOKUP_TIMEOUT_SECS";

/// Foundry build output holding the Registry ABI.
pub const DEFAULT_ABI_PATH: &str = "out/Registry.sol/Registry.json";

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to reach the registry contract.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub rpc_url: Url,
    pub registry: Address,
    pub abi_path: PathBuf,
    /// Upper bound on each `owner` call and on the startup probe.
    pub lookup_timeout: Duration,
}

impl RegistryConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|value| !value.trim().is_empty());

        let rpc_url = get(RPC_URL_VAR).ok_or_else(|| {
            Error::Config(format!(
                "{} not set. Add {}=<your_rpc_url> to your .env file",
                RPC_URL_VAR, RPC_URL_VAR
            ))
        })?;
        let rpc_url = Url::parse(rpc_url.trim())
            .map_err(|e| Error::Config(format!("invalid {}: {}", RPC_URL_VAR, e)))?;

        let registry = get(REGISTRY_ADDR_VAR).ok_or_else(|| {
            Error::Config(format!(
                "{} not set. Add {}=<contract_address> to your .env file",
                REGISTRY_ADDR_VAR, REGISTRY_ADDR_VAR
            ))
        })?;
        let registry = registry
            .trim()
            .parse::<Address>()
            .map_err(|e| Error::Config(format!("invalid {}: {}", REGISTRY_ADDR_VAR, e)))?;

        let abi_path = get(ABI_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ABI_PATH));

        let lookup_timeout = match get(LOOKUP_TIMEOUT_VAR) {
            Some(secs) => match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::Config(format!(
                        "{} must be a positive number of seconds, got '{}'",
                        LOOKUP_TIMEOUT_VAR, secs
                    )))
                }
            },
            None => DEFAULT_LOOKUP_TIMEOUT,
        };

        Ok(Self {
            rpc_url,
            registry,
            abi_path,
            lookup_timeout,
        })
    }
}
