//! Environment channel shared between the orchestrator and a step.

use std::collections::HashMap;

/// Snapshot of the variables a step was launched with.
///
/// Lookups are exact and case-sensitive; a missing key reads as the empty
/// string. Writes never touch the real process environment: they produce an
/// updated `Environment` that the caller keeps using.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the variables of the current process.
    ///
    /// Variables whose name is not valid UTF-8 cannot be looked up and are
    /// skipped; non-UTF-8 values are converted lossily.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| {
                let key = key.into_string().ok()?;
                Some((key, value.to_string_lossy().into_owned()))
            })
            .collect()
    }

    /// Get a variable, or `""` if it is not set.
    pub fn get(&self, key: &str) -> &str {
        self.vars.get(key).map(String::as_str).unwrap_or("")
    }

    /// Whether a variable is set at all (even to the empty string).
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Return the environment with `key` set to `value`.
    pub fn with_var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Return the environment with `entry` prepended to the list in `key`.
    ///
    /// The separator is always appended after `entry`, even when the list
    /// was empty.
    pub fn with_path_prefix(self, key: &str, entry: &str, separator: &str) -> Self {
        let updated = format!("{}{}{}", entry, separator, self.get(key));
        self.with_var(key, updated)
    }

    /// Iterate over all variables in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether no variable is set.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl From<HashMap<String, String>> for Environment {
    fn from(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl From<Environment> for HashMap<String, String> {
    fn from(env: Environment) -> Self {
        env.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_reads_empty() {
        let env = Environment::new();
        assert_eq!(env.get("NOPE"), "");
        assert!(!env.contains("NOPE"));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let env: Environment = [("Token", "abc")].into_iter().collect();
        assert_eq!(env.get("Token"), "abc");
        assert_eq!(env.get("TOKEN"), "");
    }

    #[test]
    fn test_with_var_overrides() {
        let env = Environment::new()
            .with_var("GREETING", "hello")
            .with_var("GREETING", "hi");

        assert_eq!(env.get("GREETING"), "hi");
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_path_prefix() {
        let env: Environment = [("PATH", "/usr/bin")].into_iter().collect();
        let env = env.with_path_prefix("PATH", "/opt/tool", ":");
        assert_eq!(env.get("PATH"), "/opt/tool:/usr/bin");

        let env = Environment::new().with_path_prefix("PATH", "/opt/tool", ":");
        assert_eq!(env.get("PATH"), "/opt/tool:");
    }

    #[test]
    fn test_from_process_sees_process_vars() {
        std::env::set_var("STEP_COMMANDS_TEST_VAR", "present");
        let env = Environment::from_process();
        std::env::remove_var("STEP_COMMANDS_TEST_VAR");

        assert_eq!(env.get("STEP_COMMANDS_TEST_VAR"), "present");
    }

    #[cfg(unix)]
    #[test]
    fn test_from_process_tolerates_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        std::env::set_var("STEP_COMMANDS_BAD_VALUE", OsStr::from_bytes(b"ok\xff\xfe"));
        std::env::set_var(OsStr::from_bytes(b"STEP_COMMANDS_BAD_\xff"), "x");
        let env = Environment::from_process();
        std::env::remove_var("STEP_COMMANDS_BAD_VALUE");
        std::env::remove_var(OsStr::from_bytes(b"STEP_COMMANDS_BAD_\xff"));

        assert_eq!(env.get("STEP_COMMANDS_BAD_VALUE"), "ok\u{FFFD}\u{FFFD}");
        assert!(env.iter().all(|(k, _)| !k.starts_with("STEP_COMMANDS_BAD_\u{FFFD}")));
    }
}
