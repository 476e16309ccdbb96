//! Output file naming for build products.
//!
//! A naming template carries the `$APP_NAME` placeholder, which is replaced
//! with the base name of a discovered product (`MyApp` for `MyApp.app`).
//! Replacement is literal text; no escaping is applied to either side.

use regex::Regex;
use std::sync::LazyLock;

/// Placeholder substituted with the product's base name.
pub const APP_NAME_PLACEHOLDER: &str = "$APP_NAME";

/// Suffix of product bundles in the build directory.
pub const APP_SUFFIX: &str = ".app";

/// Suffix of debug-symbol bundles in the build directory.
pub const DSYM_SUFFIX: &str = ".app.dSYM";

/// Strips the product bundle extension.
pub static APP_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.app$").expect("app extension pattern is valid"));

/// Strips the debug-symbol bundle extension.
pub static DSYM_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.app\.dSYM$").expect("dSYM extension pattern is valid"));

/// A user-supplied output name template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamingTemplate(String);

impl NamingTemplate {
    /// Wraps a template string.
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Raw template text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replaces every placeholder with `base_name`.
    pub fn render(&self, base_name: &str) -> String {
        self.0.replace(APP_NAME_PLACEHOLDER, base_name)
    }
}

impl From<&str> for NamingTemplate {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

/// `entry` with every match of `extension` removed.
pub fn base_name(entry: &str, extension: &Regex) -> String {
    extension.replace_all(entry, "").into_owned()
}

/// The rendered template for `entry`, without any extension.
///
/// `MyApp.app` with `$APP_NAME-v1` gives `MyApp-v1`.
pub fn templated_base_name(entry: &str, template: &NamingTemplate, extension: &Regex) -> String {
    template.render(&base_name(entry, extension))
}

/// `entry` with the first occurrence of its base name replaced by the
/// rendered template.
///
/// `MyApp.app` with `$APP_NAME-v1` gives `MyApp-v1.app`. Only the first
/// occurrence is replaced, even if the base name appears again later.
pub fn templated_file_name(entry: &str, template: &NamingTemplate, extension: &Regex) -> String {
    let base = base_name(entry, extension);
    let renamed = template.render(&base);
    entry.replacen(&base, &renamed, 1)
}
