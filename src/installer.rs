use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::Config;
use crate::docker;
use crate::error::{InstallError, Stage};
use crate::machine::{Machine, OperatorInput};
use crate::qemu_img;
use crate::tools::Tools;

pub const IMAGE_FILENAME: &str = "base.qcow2";
pub const WORKDIR_PREFIX: &str = "docker-context";

/// Runs one installation, from an empty disk to a pushed container image.
///
/// The working directory is created here and removed when [`install`]
/// returns, whatever the outcome.
///
/// [`install`]: Installer::install
pub struct Installer {
    config: Config,
    tools: Tools,
    operator: OperatorInput,
    workdir: TempDir,
    image_path: PathBuf,
}

impl Installer {
    pub fn new(config: Config) -> Result<Self, InstallError> {
        Self::with_tools(config, Tools::default())
    }

    pub fn with_tools(config: Config, tools: Tools) -> Result<Self, InstallError> {
        let workdir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir()
            .map_err(InstallError::WorkingDirectory)?;
        let image_path = workdir.path().join(IMAGE_FILENAME);
        Ok(Self {
            config,
            tools,
            operator: Box::new(BufReader::new(io::stdin())),
            workdir,
            image_path,
        })
    }

    /// Read the end-of-installation acknowledgement from `input` instead of
    /// stdin.
    pub fn operator_input(mut self, input: impl BufRead + Send + 'static) -> Self {
        self.operator = Box::new(input);
        self
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    pub fn install(self) -> Result<(), InstallError> {
        let Installer {
            config,
            tools,
            operator,
            workdir,
            image_path,
        } = self;
        log::info!("Context dir: {}", workdir.path().display());

        let result = run_stages(&config, &tools, operator, workdir.path(), &image_path);

        let path = workdir.path().to_path_buf();
        if let Err(e) = workdir.close() {
            log::warn!("Unable to remove {}: {}", path.display(), e);
        }
        result
    }
}

fn run_stages(
    config: &Config,
    tools: &Tools,
    operator: OperatorInput,
    workdir: &Path,
    image: &Path,
) -> Result<(), InstallError> {
    stage(Stage::CreateImage, || {
        qemu_img::create(&tools.qemu_img, image, config.size())
    })?;

    let machine = Machine::new(&tools.emulator, config.iso(), image, config.kvm());
    stage(Stage::RunMachine, || machine.run(operator))?;

    if config.compress() {
        stage(Stage::CompressImage, || {
            qemu_img::compress(&tools.qemu_img, image)
        })?;
    }

    stage(Stage::BuildImage, || {
        docker::build(&tools.docker, config.image(), workdir, image)
    })?;

    stage(Stage::PushImage, || {
        docker::push(&tools.docker, config.image())
    })?;

    Ok(())
}

fn stage<F>(stage: Stage, f: F) -> Result<(), InstallError>
where
    F: FnOnce() -> Result<String, InstallError>,
{
    log::info!("{}", stage.progress());
    match f() {
        Ok(output) => {
            if !output.is_empty() {
                log::debug!("{}", output.trim_end());
            }
            Ok(())
        }
        Err(err) => {
            if let Some(output) = err.output().filter(|o| !o.is_empty()) {
                log::error!("{}", output.trim_end());
            }
            Err(err)
        }
    }
}
