use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Read access to environment variables.
///
/// The loader never touches `std::env` directly; it goes through this trait so
/// tests can pass a fixed map instead of the process environment.
pub trait EnvLookup {
    fn var(&self, name: &str) -> Option<String>;

    /// The user's home directory. Defaults to `$HOME`.
    fn home_dir(&self) -> Option<String> {
        self.var("HOME")
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    /// `$HOME`, falling back to the platform's notion of the home directory.
    fn home_dir(&self) -> Option<String> {
        self.var("HOME").or_else(|| {
            let dirs = directories::BaseDirs::new()?;
            Some(dirs.home_dir().display().to_string())
        })
    }
}

/// A fixed set of variables.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl FromIterator<(String, String)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl EnvLookup for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

// Bare names are ASCII word characters only, so `$HOMEé` is `$HOME` then `é`.
static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z0-9_]+|\{[^}]*\})").expect("var reference pattern is valid")
});

/// Substitute `$NAME` and `${NAME}` references with values from `env`.
///
/// References to unset variables are left in place as literal text. Values
/// substituted in are not expanded again.
pub fn expand_vars(value: &str, env: &dyn EnvLookup) -> String {
    if !value.contains('$') {
        return value.to_string();
    }
    VAR_REF
        .replace_all(value, |caps: &Captures<'_>| {
            let reference = &caps[1];
            let name = reference
                .strip_prefix('{')
                .and_then(|r| r.strip_suffix('}'))
                .unwrap_or(reference);
            env.var(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
