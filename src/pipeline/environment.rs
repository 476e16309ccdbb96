//! Build environment variables and placeholder expansion.
//!
//! Caller-supplied paths, templates and extra build parameters may reference
//! variables as `${NAME}` or `$NAME`. Unknown variables are left untouched so
//! that tokens such as `$APP_NAME` survive expansion and reach the artifact
//! namer.

use regex::{Captures, Regex};
use std::{collections::BTreeMap, sync::LazyLock};

static VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_.]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("variable pattern is valid")
});

/// Resolved environment for one pipeline run.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BuildEnvironment {
    vars: BTreeMap<String, String>,
}

// Values may hold credentials; only names are shown.
impl std::fmt::Debug for BuildEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.vars.keys()).finish()
    }
}

impl BuildEnvironment {
    /// Captures the current process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Builds an environment from explicit pairs.
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

    /// Sets or replaces a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Looks up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// All variables, in name order. Passed verbatim to spawned tools.
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Replaces `${NAME}` and `$NAME` references with their values.
    ///
    /// A single pass: values are not re-expanded.
    pub fn expand(&self, input: &str) -> String {
        VARIABLE
            .replace_all(input, |caps: &Captures<'_>| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                match self.vars.get(name) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> BuildEnvironment {
        BuildEnvironment::from_vars([("BUILD_NUMBER", "42"), ("JOB_NAME", "ios-app")])
    }

    #[test]
    fn expands_braced_and_bare_references() {
        assert_eq!(env().expand("${JOB_NAME}-$BUILD_NUMBER"), "ios-app-42");
    }

    #[test]
    fn leaves_unknown_variables_intact() {
        assert_eq!(
            env().expand("out/$APP_NAME-${BUILD_NUMBER}"),
            "out/$APP_NAME-42"
        );
        assert_eq!(env().expand("${MISSING}"), "${MISSING}");
    }

    #[test]
    fn does_not_reexpand_values() {
        let env = BuildEnvironment::from_vars([("A", "$B"), ("B", "x")]);
        assert_eq!(env.expand("$A"), "$B");
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(env().expand("GCC_TREAT_WARNINGS=NO"), "GCC_TREAT_WARNINGS=NO");
    }
}
