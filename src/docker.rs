use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{InstallError, Stage};
use crate::process::run_captured;

pub const DOCKERFILE: &str = "Dockerfile";

pub fn dockerfile_contents(image_filename: &str) -> String {
    format!("FROM busybox\nCOPY {} /base_image/", image_filename)
}

/// Write the build descriptor next to `image`, copying it by file name.
pub fn write_dockerfile(context_dir: &Path, image: &Path) -> Result<PathBuf, InstallError> {
    let filename = image
        .file_name()
        .ok_or_else(|| {
            InstallError::io(
                Stage::BuildImage,
                format!("{:?} has no file name", image),
                std::io::ErrorKind::InvalidInput.into(),
            )
        })?
        .to_string_lossy();
    let dest = context_dir.join(DOCKERFILE);
    std::fs::write(&dest, dockerfile_contents(&filename)).map_err(|e| {
        InstallError::io(Stage::BuildImage, format!("unable to write {:?}", dest), e)
    })?;
    Ok(dest)
}

pub fn build_command(docker: &Path, tag: &str, context_dir: &Path) -> Command {
    let mut cmd = Command::new(docker);
    cmd.arg("build").arg("-t").arg(tag).arg(context_dir);
    cmd
}

pub fn push_command(docker: &Path, tag: &str) -> Command {
    let mut cmd = Command::new(docker);
    cmd.arg("push").arg(tag);
    cmd
}

pub fn build(
    docker: &Path,
    tag: &str,
    context_dir: &Path,
    image: &Path,
) -> Result<String, InstallError> {
    write_dockerfile(context_dir, image)?;
    let mut cmd = build_command(docker, tag, context_dir);
    run_captured(Stage::BuildImage, &mut cmd)
}

pub fn push(docker: &Path, tag: &str) -> Result<String, InstallError> {
    let mut cmd = push_command(docker, tag);
    run_captured(Stage::PushImage, &mut cmd)
}
