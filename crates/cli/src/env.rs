use crate::error::CliError;
use std::{collections::HashMap, path::Path};
use tracing::debug;

/// Snapshot of the process environment, optionally filled in from a `.env`
/// file. Variables already set in the process win over the file.
#[derive(Debug, Clone, Default)]
pub struct EnvManager {
    vars: HashMap<String, String>,
}

impl EnvManager {
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Loads `path`, or `./.env` (searching parent directories) when no path
    /// is given. A missing default file is not an error.
    pub fn load_dotenv(&mut self, path: Option<&Path>) -> Result<(), CliError> {
        let iter = match path {
            Some(path) => dotenvy::from_path_iter(path)?,
            None => match dotenvy::dotenv_iter() {
                Ok(iter) => iter,
                Err(err) if err.not_found() => return Ok(()),
                Err(err) => return Err(err.into()),
            },
        };

        let mut loaded = 0;
        for item in iter {
            let (key, value) = item?;
            if !self.vars.contains_key(&key) {
                self.vars.insert(key, value);
                loaded += 1;
            }
        }
        debug!(loaded, "Loaded variables from env file");
        Ok(())
    }

    /// Value of `key`; blank values count as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}
