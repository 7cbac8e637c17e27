pub mod config;
pub mod docker;
pub mod error;
pub mod installer;
pub mod machine;
pub mod preflight;
pub mod process;
pub mod qemu_img;
pub mod tools;

pub use config::{Args, Config, ConfigError};
pub use error::{InstallError, Stage};
pub use installer::Installer;
pub use tools::Tools;
