//! Shell variable table consulted and updated by expansion.

use std::collections::HashMap;

use serde::Serialize;

/// Lookup and assignment of shell variables. `set` is only reached through
/// `${name=value}` / `${name:=value}`.
pub trait Variables {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: String);
}

impl Variables for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }

    fn set(&mut self, name: &str, value: String) {
        self.insert(name.to_string(), value);
    }
}

/// The session's variables, separate from the process environment once
/// seeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShellVars {
    vars: HashMap<String, String>,
}

impl ShellVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the process environment. Entries that are not valid
    /// UTF-8 are skipped.
    pub fn from_env() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Builder-style assignment, handy for tests and `-c` runs.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value.to_string());
        self
    }

    pub fn unset(&mut self, name: &str) -> Option<String> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Variables for ShellVars {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: String) {
        self.vars.insert(name.to_string(), value);
    }
}
