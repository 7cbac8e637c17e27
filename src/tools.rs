use std::path::PathBuf;

pub const QEMU_IMG: &str = "qemu-img";
pub const QEMU_SYSTEM: &str = "qemu-system-x86_64";
pub const DOCKER: &str = "docker";

/// Every program the pipeline spawns.
pub const REQUIRED_TOOLS: &[&str] = &[DOCKER, QEMU_SYSTEM, QEMU_IMG];

/// Where the external programs live. Bare names are looked up on `PATH`.
#[derive(Debug, Clone)]
pub struct Tools {
    pub qemu_img: PathBuf,
    pub emulator: PathBuf,
    pub docker: PathBuf,
}

impl Default for Tools {
    fn default() -> Self {
        Tools {
            qemu_img: PathBuf::from(QEMU_IMG),
            emulator: PathBuf::from(QEMU_SYSTEM),
            docker: PathBuf::from(DOCKER),
        }
    }
}
