//! Common test utilities: environment capture and input fixtures
#![allow(dead_code)]

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Test environment manager that captures and restores env vars
pub struct TestEnv {
    original_vars: HashMap<String, Option<String>>,
    keys_to_track: Vec<String>,
}

impl TestEnv {
    /// Create a new test environment manager
    pub fn new() -> Self {
        Self {
            original_vars: HashMap::new(),
            keys_to_track: Vec::new(),
        }
    }

    fn track(&mut self, key: &str) {
        if !self.keys_to_track.iter().any(|k| k == key) {
            self.original_vars.insert(key.to_string(), env::var(key).ok());
            self.keys_to_track.push(key.to_string());
        }
    }

    /// Set an environment variable and track it for cleanup
    ///
    /// # Safety
    /// This modifies environment variables which is inherently unsafe in multi-threaded
    /// contexts. Only use from a single test per binary.
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.track(key);
        // SAFETY: only one test in the binary touches the environment
        unsafe { env::set_var(key, value) };
        self
    }

    /// Remove an environment variable and track it for cleanup
    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.track(key);
        // SAFETY: only one test in the binary touches the environment
        unsafe { env::remove_var(key) };
        self
    }

    /// Restore all tracked environment variables to their original state
    pub fn restore(&self) {
        for key in &self.keys_to_track {
            if let Some(original) = self.original_vars.get(key) {
                // SAFETY: Called during test cleanup
                unsafe {
                    match original {
                        Some(value) => env::set_var(key, value),
                        None => env::remove_var(key),
                    }
                }
            }
        }
    }
}

impl Drop for TestEnv {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Scratch directory holding input files for one test
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path inside the fixture; the file is not created
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write raw bytes to `name` and return its path
    pub fn write(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, content).expect("write fixture");
        path
    }

    /// Write one name per line
    pub fn write_lines(&self, name: &str, lines: &[&str]) -> PathBuf {
        let mut content = lines.join("\n");
        content.push('\n');
        self.write(name, content)
    }
}

/// Read a CSV file into rows of fields, header included
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .expect("read csv")
        .lines()
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

