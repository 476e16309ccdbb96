//! Pipeline orchestration.
//!
//! [`Pipeline`] exposes one operation per stage. Stages report an integer
//! status (0 = success) instead of failing, so the caller decides whether to
//! go on; [`Pipeline::run`] is the standard caller. Only setup problems
//! (unreadable workspace, dependency tool that cannot be launched) are
//! returned as errors.

use super::{
    archive::zip_directory,
    checksum::calculate_sha256,
    command::{self, SigningArgs, XcodebuildParams},
    context::BuildContext,
    error::{Error, ErrorExt, Result},
    naming::{self, APP_EXTENSION, APP_SUFFIX, DSYM_EXTENSION, DSYM_SUFFIX, NamingTemplate},
    process::{ProcessRunner, TokioProcessRunner},
    report::{ArtifactRecord, RunReport, Stage},
    settings::PipelineSettings,
    signing::{
        CredentialArchive, ExportedIdentity, HomeProfileRegistry, ProfileRegistry,
        ProvisioningProfile, SigningIdentity, TempKeychain, one_time_password,
    },
};
use crate::bail;
use std::path::{Path, PathBuf};

/// Stage succeeded.
pub const SUCCESS: i32 = 0;

/// Stage failed without a more specific exit code.
pub const FAILURE: i32 = 1;

/// CocoaPods lockfile; its presence selects `pod update` over `pod install`.
pub const PODFILE_LOCK: &str = "Podfile.lock";

/// SDK passed to `xcrun` when packaging.
pub const PACKAGE_SDK: &str = "iphoneos";

/// Signing inputs for [`Pipeline::run`].
#[derive(Clone, Copy)]
pub struct SigningMaterial<'a> {
    /// Archive to pick the identity from.
    pub archive: &'a dyn CredentialArchive,
    /// Profile to match against and install.
    pub profile: &'a ProvisioningProfile,
}

/// Sequences the build stages for one run.
///
/// Owns the [`BuildContext`] and the signing state created along the way.
/// Every keychain created by [`Pipeline::install_identity`] is held until
/// [`Pipeline::cleanup`] deletes it.
pub struct Pipeline<R = TokioProcessRunner, P = HomeProfileRegistry> {
    context: BuildContext,
    runner: R,
    registry: P,
    identity: Option<SigningIdentity>,
    profile: Option<ProvisioningProfile>,
    keychains: Vec<TempKeychain>,
    artifacts: Vec<PathBuf>,
}

impl<R, P> std::fmt::Debug for Pipeline<R, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("context", &self.context)
            .field("identity", &self.identity)
            .field("profile", &self.profile)
            .field("keychains", &self.keychains)
            .field("artifacts", &self.artifacts)
            .finish_non_exhaustive()
    }
}

impl<R: ProcessRunner> Pipeline<R, HomeProfileRegistry> {
    /// Creates a pipeline installing profiles under the build user's home.
    pub fn new(context: BuildContext, runner: R) -> Result<Self> {
        let registry = HomeProfileRegistry::from_env(context.env())?;
        Ok(Self::with_registry(context, runner, registry))
    }
}

impl<R: ProcessRunner, P: ProfileRegistry> Pipeline<R, P> {
    /// Creates a pipeline with an explicit profile registry.
    pub fn with_registry(context: BuildContext, runner: R, registry: P) -> Self {
        Self {
            context,
            runner,
            registry,
            identity: None,
            profile: None,
            keychains: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    /// Build context of this run.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Process runner used for every tool.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Identity imported into the active keychain, if any.
    pub fn identity(&self) -> Option<&SigningIdentity> {
        self.identity.as_ref()
    }

    /// Installed provisioning profile, if any.
    pub fn profile(&self) -> Option<&ProvisioningProfile> {
        self.profile.as_ref()
    }

    /// Name of the keychain holding the active identity.
    pub fn keychain_name(&self) -> Option<&str> {
        self.identity.as_ref()?;
        self.keychains.last().map(TempKeychain::name)
    }

    /// Keychains awaiting deletion.
    pub fn pending_keychains(&self) -> usize {
        self.keychains.len()
    }

    /// Files produced by the packaging stages so far.
    pub fn artifacts(&self) -> &[PathBuf] {
        &self.artifacts
    }

    /// Installs CocoaPods dependencies for the project at `project_root`.
    ///
    /// Runs `pod update` when `Podfile.lock` exists and `pod install`
    /// otherwise, and returns the tool's exit code.
    ///
    /// # Errors
    ///
    /// Fails when the project root is inaccessible or `pod` cannot be
    /// launched. Both halt the pipeline.
    pub async fn install_dependencies(&self, project_root: &str) -> Result<i32> {
        let root = self.context.workspace_path(project_root);
        let metadata = tokio::fs::metadata(&root)
            .await
            .fs_context("accessing project root", &root)?;
        if !metadata.is_dir() {
            bail!("project root {} is not a directory", root.display());
        }

        let lockfile = root.join(PODFILE_LOCK);
        let lockfile_present = tokio::fs::try_exists(&lockfile)
            .await
            .fs_context("checking for lockfile", &lockfile)?;

        let command = command::pod(&self.context.tools().pod, lockfile_present);
        log::info!("Installing dependencies in {}: {}", root.display(), command);

        self.runner
            .run(&command, Some(&root), self.context.env().vars())
            .await
    }

    /// Prepares signing for the build.
    ///
    /// Picks the identity in `archive` matching one of the profile's
    /// certificates and imports it into a fresh keychain, then installs the
    /// profile. No matching identity is not an error: the profile is still
    /// installed and the build proceeds unsigned.
    ///
    /// Returns [`SUCCESS`] or [`FAILURE`]; errors are logged, never returned.
    /// Run [`Pipeline::cleanup`] afterwards whatever the outcome.
    pub async fn install_identity<A>(&mut self, archive: &A, profile: &ProvisioningProfile) -> i32
    where
        A: CredentialArchive + ?Sized,
    {
        match self.provision_signing(archive, profile).await {
            Ok(()) => SUCCESS,
            Err(e) => {
                log::error!("Signing setup failed: {}", e);
                FAILURE
            }
        }
    }

    async fn provision_signing<A>(&mut self, archive: &A, profile: &ProvisioningProfile) -> Result<()>
    where
        A: CredentialArchive + ?Sized,
    {
        self.identity = None;
        self.profile = None;

        match archive.choose_identity(profile.certificates())? {
            Some(identity) => {
                log::info!(
                    "Using signing identity \"{}\" for profile {}",
                    identity.common_name(),
                    profile.uuid()
                );
                self.import_identity(archive, &identity).await?;
                self.identity = Some(identity);
            }
            None => log::info!(
                "No identity matches provisioning profile {}; building unsigned",
                profile.uuid()
            ),
        }

        self.registry.install(profile).await?;
        self.profile = Some(profile.clone());
        Ok(())
    }

    /// Exports `identity` to a temporary file and imports it into a new
    /// keychain. The file is gone when this returns.
    async fn import_identity<A>(&mut self, archive: &A, identity: &SigningIdentity) -> Result<()>
    where
        A: CredentialArchive + ?Sized,
    {
        let export_password = one_time_password();
        let pkcs12 = archive.export(identity, &export_password)?;
        let exported = ExportedIdentity::write_in(self.context.workspace(), &pkcs12)?;

        let imported = self.populate_keychain(exported.path(), &export_password).await;

        match (imported, exported.remove()) {
            (Ok(()), removed) => removed,
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(removal)) => {
                log::error!("{}", removal);
                Err(e)
            }
        }
    }

    async fn populate_keychain(&mut self, identity_file: &Path, identity_password: &str) -> Result<()> {
        let keychain = TempKeychain::new(&self.context.tools().security);
        let password = one_time_password();
        let runner = &self.runner;
        let env = self.context.env();

        let result = async {
            keychain.create(runner, env, &password).await?;
            keychain
                .import_identity(runner, env, &password, identity_file, identity_password)
                .await
        }
        .await;

        // Recorded even on failure: create-keychain may have left a file behind.
        self.keychains.push(keychain);
        result
    }

    /// Runs `xcodebuild` in the workspace and returns its exit code.
    ///
    /// String parameters are expanded against the build environment. Signing
    /// settings are appended only when `params.code_sign` is set and signing
    /// material is active. A command that cannot be assembled or launched
    /// yields [`FAILURE`].
    pub async fn compile(&self, params: &XcodebuildParams) -> i32 {
        let env = self.context.env();
        let expand = |value: &Option<String>| value.as_deref().map(|v| env.expand(v));
        let params = XcodebuildParams {
            workspace: expand(&params.workspace),
            project: expand(&params.project),
            target: expand(&params.target),
            scheme: expand(&params.scheme),
            configuration: expand(&params.configuration),
            sdk: env.expand(&params.sdk),
            additional_parameters: expand(&params.additional_parameters),
            code_sign: params.code_sign,
        };

        let signing = SigningArgs {
            profile_uuid: self.profile.as_ref().map(ProvisioningProfile::uuid),
            identity: self
                .identity
                .as_ref()
                .zip(self.keychains.last())
                .map(|(identity, keychain)| (identity.common_name(), keychain.name())),
        };

        let command = match command::xcodebuild(
            &self.context.tools().xcodebuild,
            &params,
            self.context.build_dir(),
            signing,
        ) {
            Ok(command) => command,
            Err(e) => {
                log::error!("Cannot assemble build command: {}", e);
                return FAILURE;
            }
        };

        log::info!("Building: {}", command);
        match self
            .runner
            .run(&command, Some(self.context.workspace()), env.vars())
            .await
        {
            Ok(code) => code,
            Err(e) => {
                log::error!("Build failed to start: {}", e);
                FAILURE
            }
        }
    }

    /// Packages every `*.app` directory in the build directory as an `.ipa`.
    ///
    /// Output goes to `<workspace>/<name>.ipa`, where `<name>` is the entry
    /// name with its base name replaced by the rendered template
    /// (`MyApp.app` with `$APP_NAME-v1` gives `MyApp-v1.app.ipa`). A failure
    /// on one bundle does not stop the others; the result is [`FAILURE`] if
    /// any failed.
    pub async fn package_artifact(&mut self, template: &NamingTemplate) -> i32 {
        let template = NamingTemplate::new(self.context.env().expand(template.as_str()));
        let entries = match self.scan_build_dir(APP_SUFFIX).await {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Cannot list build products: {}", e);
                return FAILURE;
            }
        };

        let mut status = SUCCESS;
        for entry in entries {
            match self.package_one(&entry, &template).await {
                Ok(path) => {
                    log::info!("✓ Packaged {} into {}", entry, path.display());
                    self.artifacts.push(path);
                }
                Err(e) => {
                    log::error!("Packaging {} failed: {}", entry, e);
                    status = FAILURE;
                }
            }
        }
        status
    }

    async fn package_one(&self, entry: &str, template: &NamingTemplate) -> Result<PathBuf> {
        let file_name = format!(
            "{}.ipa",
            naming::templated_file_name(entry, template, &APP_EXTENSION)
        );
        let output = self.output_path(&file_name).await?;

        let command =
            command::package_application(&self.context.tools().xcrun, PACKAGE_SDK, entry, &output);
        let code = self
            .runner
            .run(&command, Some(self.context.build_dir()), self.context.env().vars())
            .await?;
        if code != 0 {
            return Err(Error::ToolFailed {
                command: command.to_string(),
                code,
            });
        }
        Ok(output)
    }

    /// Zips every `*.app.dSYM` directory in the build directory.
    ///
    /// Output goes to `<workspace>/<name>.zip` (`MyApp.app.dSYM` with
    /// `$APP_NAME-v1` gives `MyApp-v1.app.dSYM.zip`). Same partial-failure
    /// policy as [`Pipeline::package_artifact`].
    pub async fn archive_debug_symbols(&mut self, template: &NamingTemplate) -> i32 {
        let template = NamingTemplate::new(self.context.env().expand(template.as_str()));
        let entries = match self.scan_build_dir(DSYM_SUFFIX).await {
            Ok(entries) => entries,
            Err(e) => {
                log::error!("Cannot list debug symbols: {}", e);
                return FAILURE;
            }
        };

        let mut status = SUCCESS;
        for entry in entries {
            match self.archive_one(&entry, &template).await {
                Ok(path) => {
                    log::info!("✓ Archived {} into {}", entry, path.display());
                    self.artifacts.push(path);
                }
                Err(e) => {
                    log::error!("Archiving {} failed: {}", entry, e);
                    status = FAILURE;
                }
            }
        }
        status
    }

    async fn archive_one(&self, entry: &str, template: &NamingTemplate) -> Result<PathBuf> {
        let file_name = format!(
            "{}.zip",
            naming::templated_file_name(entry, template, &DSYM_EXTENSION)
        );
        let output = self.output_path(&file_name).await?;
        zip_directory(&self.context.build_dir().join(entry), &output).await?;
        Ok(output)
    }

    /// `<workspace>/<file_name>` with its parent directory created.
    async fn output_path(&self, file_name: &str) -> Result<PathBuf> {
        let output = self.context.workspace().join(file_name);
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating output directory", parent)?;
        }
        Ok(output)
    }

    /// Names of top-level directories in the build directory ending with
    /// `suffix`, sorted. Files and other directories are skipped.
    async fn scan_build_dir(&self, suffix: &str) -> Result<Vec<String>> {
        let build_dir = self.context.build_dir();
        let mut dir = tokio::fs::read_dir(build_dir)
            .await
            .fs_context("reading build directory", build_dir)?;

        let mut matches = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .fs_context("reading build directory", build_dir)?
        {
            let Ok(name) = entry.file_name().into_string() else {
                log::warn!("Skipping non UTF-8 entry {}", entry.path().display());
                continue;
            };
            if !name.ends_with(suffix) {
                continue;
            }
            // Follows symlinks, so a linked bundle counts as a directory.
            match tokio::fs::metadata(entry.path()).await {
                Ok(metadata) if metadata.is_dir() => matches.push(name),
                Ok(_) => log::debug!("Skipping {}: not a directory", name),
                Err(e) => log::warn!("Skipping {}: {}", name, e),
            }
        }

        matches.sort();
        Ok(matches)
    }

    /// Deletes every keychain created by this pipeline.
    ///
    /// Each keychain is deleted once; calling this again does nothing.
    /// Failures are logged and never change the run's outcome.
    pub async fn cleanup(&mut self) {
        self.identity = None;
        let env = self.context.env();
        for keychain in std::mem::take(&mut self.keychains) {
            keychain.delete(&self.runner, env).await;
        }
    }

    /// Runs all configured stages in order.
    ///
    /// 1. Dependencies, when `pods.enabled`. A nonzero status stops the run.
    /// 2. Signing, when `build.code_sign` is set and `signing` is supplied. A
    ///    failure stops the run after cleanup.
    /// 3. Compile. A nonzero status skips packaging.
    /// 4. Package, when an IPA template is configured.
    /// 5. Debug symbols, when a dSYM template is configured.
    /// 6. Cleanup, whenever signing ran.
    ///
    /// # Errors
    ///
    /// Only setup failures from the dependency stage are returned.
    pub async fn run(
        &mut self,
        settings: &PipelineSettings,
        signing: Option<SigningMaterial<'_>>,
    ) -> Result<RunReport> {
        let mut report = RunReport::start();

        if settings.pods.enabled {
            let status = self.install_dependencies(&settings.pods.project_root).await?;
            report.record(Stage::Dependencies, status);
            if status != SUCCESS {
                return Ok(report.finish());
            }
        }

        let signing_ran = match (settings.build.code_sign, signing) {
            (true, Some(material)) => {
                let status = self.install_identity(material.archive, material.profile).await;
                report.record(Stage::Signing, status);
                true
            }
            (true, None) => {
                log::warn!("Code signing enabled but no signing material supplied; building unsigned");
                false
            }
            (false, _) => false,
        };

        if report.status() == SUCCESS {
            self.build_and_package(settings, &mut report).await;
        }

        if signing_ran {
            self.cleanup().await;
            report.record(Stage::Cleanup, SUCCESS);
        }

        for path in &self.artifacts {
            match calculate_sha256(path).await {
                Ok(sha256) => report.artifacts.push(ArtifactRecord {
                    path: path.clone(),
                    sha256,
                }),
                Err(e) => log::warn!("Cannot checksum {}: {}", path.display(), e),
            }
        }

        Ok(report.finish())
    }

    async fn build_and_package(&mut self, settings: &PipelineSettings, report: &mut RunReport) {
        let status = self.compile(&settings.build.to_params()).await;
        report.record(Stage::Compile, status);
        if status != SUCCESS {
            return;
        }

        if let Some(template) = settings.artifacts.ipa_template() {
            let status = self.package_artifact(&template).await;
            report.record(Stage::Package, status);
        }

        if let Some(template) = settings.artifacts.dsym_template() {
            let status = self.archive_debug_symbols(&template).await;
            report.record(Stage::DebugSymbols, status);
        }
    }
}
