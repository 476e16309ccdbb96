//! External tool command lines.
//!
//! Every invocation the pipeline makes is assembled here. The builders are
//! pure: they never touch the filesystem or spawn anything.

use super::error::{Error, Result};
use std::{fmt, path::Path};

/// Placeholder shown instead of secret arguments.
const REDACTED: &str = "******";

/// One external tool invocation. Element 0 is the program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildCommand {
    args: Vec<String>,
    secret: Vec<usize>,
}

impl BuildCommand {
    /// Starts a command line for `program`.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            args: vec![program.as_ref().to_string_lossy().into_owned()],
            secret: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends an argument that must never be logged.
    pub fn secret_arg(mut self, arg: impl Into<String>) -> Self {
        self.secret.push(self.args.len());
        self.args.push(arg.into());
        self
    }

    /// Appends `flag value` only when `value` is present and not blank.
    pub fn flag_opt(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) if !value.trim().is_empty() => self.arg(flag).arg(value),
            _ => self,
        }
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program to execute.
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    /// Arguments after the program.
    pub fn arguments(&self) -> &[String] {
        &self.args[1..]
    }

    /// Full argument vector including the program.
    pub fn as_slice(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if self.secret.contains(&i) {
                f.write_str(REDACTED)?;
            } else if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, "'{arg}'")?;
            } else {
                f.write_str(arg)?;
            }
        }
        Ok(())
    }
}

/// Inputs to an `xcodebuild` invocation.
///
/// `sdk` is always passed; every other field is omitted when absent or blank.
#[derive(Clone, Debug, Default)]
pub struct XcodebuildParams {
    /// `.xcworkspace` path.
    pub workspace: Option<String>,
    /// `.xcodeproj` path.
    pub project: Option<String>,
    /// Target name.
    pub target: Option<String>,
    /// Scheme name.
    pub scheme: Option<String>,
    /// Build configuration, e.g. `Release`.
    pub configuration: Option<String>,
    /// SDK identifier, e.g. `iphoneos`.
    pub sdk: String,
    /// Raw extra parameters, split with shell quoting rules.
    pub additional_parameters: Option<String>,
    /// Whether signing settings should be passed to the build.
    pub code_sign: bool,
}

/// Signing material active for the build, if any.
#[derive(Clone, Copy, Debug, Default)]
pub struct SigningArgs<'a> {
    /// UUID of the installed provisioning profile.
    pub profile_uuid: Option<&'a str>,
    /// Common name of the imported identity and the keychain holding it.
    pub identity: Option<(&'a str, &'a str)>,
}

/// Assembles the `xcodebuild` command line.
///
/// Argument order is fixed: project selection, target, scheme,
/// configuration, sdk, build directory, extra parameters, signing settings.
pub fn xcodebuild(
    tool: &Path,
    params: &XcodebuildParams,
    build_dir: &Path,
    signing: SigningArgs<'_>,
) -> Result<BuildCommand> {
    let mut command = BuildCommand::new(tool)
        .flag_opt("-workspace", params.workspace.as_deref())
        .flag_opt("-project", params.project.as_deref())
        .flag_opt("-target", params.target.as_deref())
        .flag_opt("-scheme", params.scheme.as_deref())
        .flag_opt("-configuration", params.configuration.as_deref())
        .arg("-sdk")
        .arg(params.sdk.as_str())
        .arg(format!("CONFIGURATION_BUILD_DIR={}", build_dir.display()));

    if let Some(extra) = params.additional_parameters.as_deref() {
        command = command.args(tokenize(extra)?);
    }

    if params.code_sign {
        if let Some(uuid) = signing.profile_uuid {
            command = command.arg(format!("PROVISIONING_PROFILE={uuid}"));
        }
        if let Some((common_name, keychain)) = signing.identity {
            command = command
                .arg(format!("CODE_SIGN_IDENTITY={common_name}"))
                .arg(format!("OTHER_CODE_SIGN_FLAGS=--keychain {keychain}"));
        }
    }

    Ok(command)
}

/// `pod update` when a lockfile exists, `pod install` otherwise.
pub fn pod(tool: &Path, lockfile_present: bool) -> BuildCommand {
    let action = if lockfile_present { "update" } else { "install" };
    BuildCommand::new(tool).arg(action).arg("--no-color")
}

/// `xcrun PackageApplication` for one product bundle.
pub fn package_application(tool: &Path, sdk: &str, app_name: &str, output: &Path) -> BuildCommand {
    BuildCommand::new(tool)
        .args(["-sdk", sdk, "PackageApplication", app_name, "-o"])
        .arg(output.to_string_lossy())
}

/// `security` subcommands used to manage an ephemeral keychain.
pub mod security {
    use super::BuildCommand;
    use std::path::Path;

    /// Creates a keychain protected by `password`.
    pub fn create_keychain(tool: &Path, keychain: &str, password: &str) -> BuildCommand {
        BuildCommand::new(tool)
            .args(["create-keychain", "-p"])
            .secret_arg(password)
            .arg(keychain)
    }

    /// Imports a PKCS#12 file, granting access to all applications.
    pub fn import(tool: &Path, identity_file: &Path, keychain: &str, password: &str) -> BuildCommand {
        BuildCommand::new(tool)
            .arg("import")
            .arg(identity_file.to_string_lossy())
            .args(["-k", keychain, "-P"])
            .secret_arg(password)
            .arg("-A")
    }

    /// Unlocks the keychain.
    pub fn unlock_keychain(tool: &Path, keychain: &str, password: &str) -> BuildCommand {
        BuildCommand::new(tool)
            .args(["unlock-keychain", "-p"])
            .secret_arg(password)
            .arg(keychain)
    }

    /// Resets keychain settings without `-t`, so it never locks on idle.
    pub fn disable_auto_lock(tool: &Path, keychain: &str) -> BuildCommand {
        BuildCommand::new(tool).args(["set-keychain-settings", "-u", keychain])
    }

    /// Deletes the keychain.
    pub fn delete_keychain(tool: &Path, keychain: &str) -> BuildCommand {
        BuildCommand::new(tool).args(["delete-keychain", keychain])
    }
}

/// Splits `input` into arguments the way a POSIX shell would.
///
/// Single quotes are literal, double quotes allow `\"` and `\\`, a backslash
/// outside quotes escapes the next character. Adjacent quoted and unquoted
/// pieces join into one argument.
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    #[derive(PartialEq)]
    enum State {
        Plain,
        Single,
        Double,
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut state = State::Plain;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match state {
            State::Plain => match c {
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                '\'' => {
                    state = State::Single;
                    in_token = true;
                }
                '"' => {
                    state = State::Double;
                    in_token = true;
                }
                '\\' => {
                    let escaped = chars.next().ok_or_else(|| Error::Tokenize {
                        input: input.to_string(),
                        reason: "trailing backslash",
                    })?;
                    current.push(escaped);
                    in_token = true;
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
            State::Single => match c {
                '\'' => state = State::Plain,
                c => current.push(c),
            },
            State::Double => match c {
                '"' => state = State::Plain,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\' | '$' | '`')) => current.push(next),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => break,
                },
                c => current.push(c),
            },
        }
    }

    if state != State::Plain {
        return Err(Error::Tokenize {
            input: input.to_string(),
            reason: "unterminated quote",
        });
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            tokenize("  ONLY_ACTIVE_ARCH=NO\tVALID_ARCHS=arm64 ").unwrap(),
            vec!["ONLY_ACTIVE_ARCH=NO", "VALID_ARCHS=arm64"]
        );
    }

    #[test]
    fn keeps_quoted_spaces() {
        assert_eq!(
            tokenize(r#"-derivedDataPath "build/Derived Data" GCC='-O2 -g'"#).unwrap(),
            vec!["-derivedDataPath", "build/Derived Data", "GCC=-O2 -g"]
        );
    }

    #[test]
    fn handles_escapes() {
        assert_eq!(
            tokenize(r#"a\ b "say \"hi\"" 'lit\n'"#).unwrap(),
            vec!["a b", "say \"hi\"", "lit\\n"]
        );
    }

    #[test]
    fn empty_quotes_yield_empty_argument() {
        assert_eq!(tokenize(r#"X="" ''"#).unwrap(), vec!["X=", ""]);
    }

    #[test]
    fn rejects_unterminated_quote() {
        assert!(matches!(
            tokenize("OTHER_FLAGS=\"-v"),
            Err(Error::Tokenize { reason: "unterminated quote", .. })
        ));
    }

    #[test]
    fn display_masks_secrets() {
        let cmd = security::create_keychain(Path::new("security"), "kc.keychain", "hunter2");
        assert_eq!(cmd.to_string(), "security create-keychain -p ****** kc.keychain");
        assert!(cmd.as_slice().contains(&"hunter2".to_string()));
    }
}
