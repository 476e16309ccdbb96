//! Shared fixtures for integration tests.
#![allow(dead_code)]

use kodegen_bundler_ios::pipeline::{
    BuildCommand, BuildContext, BuildEnvironment, Certificate, CredentialArchive, Error,
    HomeProfileRegistry, Pipeline, ProcessRunner, ProvisioningProfile, Result, SigningIdentity,
    ToolPaths,
};
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tempfile::TempDir;

type Responder = Box<dyn Fn(&[String]) -> io::Result<i32> + Send + Sync>;

/// One recorded invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Call {
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.args.get(1).map(String::as_str)
    }
}

/// Records every command and answers with a scripted exit code.
pub struct RecordingRunner {
    calls: Mutex<Vec<Call>>,
    imports: Mutex<Vec<(PathBuf, bool)>>,
    respond: Responder,
}

impl RecordingRunner {
    /// Every command succeeds.
    pub fn succeeding() -> Self {
        Self::responding(|_| Ok(0))
    }

    pub fn responding<F>(respond: F) -> Self
    where
        F: Fn(&[String]) -> io::Result<i32> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            imports: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose program is `program`.
    pub fn calls_to(&self, program: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.program() == program)
            .collect()
    }

    /// Identity files passed to `security import`, and whether each existed
    /// at that moment.
    pub fn imports(&self) -> Vec<(PathBuf, bool)> {
        self.imports.lock().unwrap().clone()
    }
}

impl ProcessRunner for RecordingRunner {
    async fn run(
        &self,
        command: &BuildCommand,
        working_dir: Option<&Path>,
        _env: &BTreeMap<String, String>,
    ) -> Result<i32> {
        let args = command.as_slice().to_vec();
        if args.get(1).map(String::as_str) == Some("import") {
            let file = PathBuf::from(&args[2]);
            let existed = file.exists();
            self.imports.lock().unwrap().push((file, existed));
        }
        self.calls.lock().unwrap().push(Call {
            args: args.clone(),
            cwd: working_dir.map(Path::to_path_buf),
        });
        (self.respond)(&args).map_err(|error| Error::Launch {
            program: args[0].clone(),
            error,
        })
    }
}

/// Archive holding fixed identities.
#[derive(Default)]
pub struct FakeArchive {
    pub identities: Vec<SigningIdentity>,
    pub fail_export: bool,
}

impl FakeArchive {
    pub fn with(identity: SigningIdentity) -> Self {
        Self {
            identities: vec![identity],
            fail_export: false,
        }
    }
}

impl CredentialArchive for FakeArchive {
    fn choose_identity(&self, candidates: &[Certificate]) -> Result<Option<SigningIdentity>> {
        Ok(self.identities.iter().find(|i| i.matches(candidates)).cloned())
    }

    fn export(&self, identity: &SigningIdentity, password: &str) -> Result<Vec<u8>> {
        if self.fail_export {
            return Err(Error::Signing("export refused".to_string()));
        }
        Ok(format!("pkcs12:{}:{}", identity.common_name(), password).into_bytes())
    }
}

pub fn dev_certificate() -> Certificate {
    Certificate::from_der(vec![0x30, 0x82, 0x01, 0x0a, 0xde, 0xad])
}

pub fn other_certificate() -> Certificate {
    Certificate::from_der(vec![0x30, 0x82, 0x02, 0x0b, 0xbe, 0xef])
}

pub fn dev_identity() -> SigningIdentity {
    SigningIdentity::new("Dev Cert", dev_certificate(), vec![1, 2, 3, 4])
}

pub fn profile_with(certificates: Vec<Certificate>) -> ProvisioningProfile {
    ProvisioningProfile::new("ABC-123", b"<plist>profile</plist>".to_vec(), certificates)
}

/// Workspace and home directories for one test.
pub struct Fixture {
    pub workspace: TempDir,
    pub home: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            workspace: TempDir::new().unwrap(),
            home: TempDir::new().unwrap(),
        }
    }

    pub fn ws(&self) -> &Path {
        self.workspace.path()
    }

    pub fn build_dir(&self) -> PathBuf {
        self.ws().join("build")
    }

    pub fn env(&self) -> BuildEnvironment {
        BuildEnvironment::from_vars([
            ("HOME", self.home.path().to_string_lossy().into_owned()),
            ("BUILD_NUMBER", "7".to_string()),
            ("SCHEME", String::new()),
        ])
    }

    pub fn pipeline(&self, runner: RecordingRunner) -> Pipeline<RecordingRunner, HomeProfileRegistry> {
        let context = BuildContext::new(self.ws(), self.env(), ToolPaths::default(), "build").unwrap();
        Pipeline::new(context, runner).unwrap()
    }

    pub fn installed_profile(&self, uuid: &str) -> PathBuf {
        self.home
            .path()
            .join("Library/MobileDevice/Provisioning Profiles")
            .join(format!("{uuid}.mobileprovision"))
    }

    /// Exported identity files left in the workspace.
    pub fn leftover_identity_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.ws())
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                let name = p.file_name().unwrap().to_string_lossy();
                name.starts_with("identity") && name.ends_with(".p12")
            })
            .collect()
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.ws().join(relative);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    pub fn touch(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.ws().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
