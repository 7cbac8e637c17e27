use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{InstallError, Stage};
use crate::process::run_captured;

pub const FORMAT: &str = "qcow2";

pub fn create_command(qemu_img: &Path, image: &Path, size: &str) -> Command {
    let mut cmd = Command::new(qemu_img);
    cmd.arg("create").arg("-f").arg(FORMAT);
    cmd.arg(image).arg(size);
    cmd
}

pub fn compress_command(qemu_img: &Path, image: &Path, dest: &Path) -> Command {
    let mut cmd = Command::new(qemu_img);
    cmd.arg("convert").arg("-O").arg(FORMAT).arg("-c");
    cmd.arg(image).arg(dest);
    cmd
}

/// Create an empty qcow2 disk of `size` (a qemu size string such as `50G`).
pub fn create(qemu_img: &Path, image: &Path, size: &str) -> Result<String, InstallError> {
    let mut cmd = create_command(qemu_img, image, size);
    run_captured(Stage::CreateImage, &mut cmd)
}

/// Sibling path the compressed image is written to before it replaces the
/// original.
pub fn staging_path(image: &Path) -> PathBuf {
    let mut name = OsString::from(image.as_os_str());
    name.push(".temp");
    PathBuf::from(name)
}

/// Recompress `image` in place. The converted copy only replaces the
/// original once `qemu-img` succeeds.
pub fn compress(qemu_img: &Path, image: &Path) -> Result<String, InstallError> {
    let staged = staging_path(image);
    let output = run_captured(
        Stage::CompressImage,
        &mut compress_command(qemu_img, image, &staged),
    )?;
    std::fs::rename(&staged, image).map_err(|e| {
        InstallError::io(
            Stage::CompressImage,
            format!("unable to replace {:?} with {:?}", image, staged),
            e,
        )
    })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn create_arguments() {
        let cmd = create_command(
            Path::new("qemu-img"),
            Path::new("/tmp/ctx/base.qcow2"),
            "20G",
        );
        assert_eq!(cmd.get_program(), "qemu-img");
        assert_eq!(
            args(&cmd),
            ["create", "-f", "qcow2", "/tmp/ctx/base.qcow2", "20G"]
        );
    }

    #[test]
    fn compress_arguments() {
        let image = Path::new("/tmp/ctx/base.qcow2");
        let cmd = compress_command(Path::new("qemu-img"), image, &staging_path(image));
        assert_eq!(
            args(&cmd),
            [
                "convert",
                "-O",
                "qcow2",
                "-c",
                "/tmp/ctx/base.qcow2",
                "/tmp/ctx/base.qcow2.temp"
            ]
        );
    }

    #[test]
    fn staging_path_is_sibling() {
        let staged = staging_path(Path::new("/work/base.qcow2"));
        assert_eq!(staged, Path::new("/work/base.qcow2.temp"));
    }
}
