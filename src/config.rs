use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::builder::{BoolishValueParser, NonEmptyStringValueParser};
use clap::{ArgAction, Parser};
use oci_spec::distribution::Reference;

pub const DEFAULT_SIZE: &str = "50G";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("-{0} is required")]
    Missing(&'static str),
    #[error("invalid image name {image:?}: {reason}")]
    InvalidImage { image: String, reason: String },
}

/// Install an operating system from an ISO into a qcow2 disk and publish it
/// as a container image.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// path to operating system iso file
    #[arg(
        long,
        allow_hyphen_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    iso: String,

    /// size of the virtual machine image
    #[arg(
        long,
        default_value = DEFAULT_SIZE,
        allow_hyphen_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    size: String,

    /// name of the Docker image
    #[arg(long, allow_hyphen_values = true, value_parser = parse_image)]
    image: String,

    /// enable KVM full virtualization support
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    kvm: bool,

    /// compress virtual machine image after installation
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    compress: bool,
}

impl Args {
    /// Parse the command line, accepting `-iso` as well as `--iso`.
    pub fn parse_flags<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::parse_from(normalize_flags(args))
    }
}

/// Flags followed by a value unless it is given inline with `=`.
const VALUE_FLAGS: &[&str] = &["iso", "size", "image"];
const SWITCH_FLAGS: &[&str] = &["kvm", "compress", "help", "version"];

struct Flag<'a> {
    name: &'a str,
    single_dash: bool,
    inline_value: bool,
}

fn parse_flag(arg: &str) -> Option<Flag<'_>> {
    let (rest, single_dash) = match arg.strip_prefix("--") {
        Some(rest) => (rest, false),
        None => (arg.strip_prefix('-')?, true),
    };
    let (name, inline_value) = match rest.split_once('=') {
        Some((name, _)) => (name, true),
        None => (rest, false),
    };
    if VALUE_FLAGS.contains(&name) || SWITCH_FLAGS.contains(&name) {
        Some(Flag {
            name,
            single_dash,
            inline_value,
        })
    } else {
        None
    }
}

/// Rewrite single-dash long flags (`-iso`, `-size=20G`) to their double-dash
/// form. The token after a value flag is its value and is never rewritten.
/// Everything after a bare `--` is left alone.
pub fn normalize_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut args = args.into_iter().map(Into::into);
    let mut normalized: Vec<OsString> = args.next().into_iter().collect();
    let mut value_next = false;
    while let Some(arg) = args.next() {
        if value_next {
            value_next = false;
            normalized.push(arg);
            continue;
        }
        if arg.as_os_str() == "--" {
            normalized.push(arg);
            normalized.extend(args.by_ref());
            break;
        }
        let rewritten = match arg.to_str().and_then(parse_flag) {
            Some(flag) => {
                value_next = VALUE_FLAGS.contains(&flag.name) && !flag.inline_value;
                if flag.single_dash {
                    let mut long = OsString::from("-");
                    long.push(&arg);
                    long
                } else {
                    arg
                }
            }
            None => arg,
        };
        normalized.push(rewritten);
    }
    normalized
}

/// `docker build -t` takes `name[:tag]`, so digest references are refused
/// along with malformed ones.
fn parse_image(value: &str) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing("image"));
    }
    let invalid = |reason: String| ConfigError::InvalidImage {
        image: value.to_string(),
        reason,
    };
    let reference = Reference::try_from(value)
        .map_err(|e| invalid(e.to_string()))?;
    if reference.digest().is_some() {
        return Err(invalid("a digest cannot be used as a build tag".to_string()));
    }
    Ok(value.to_string())
}

/// Validated run parameters. Immutable once built.
#[derive(Debug, Clone)]
pub struct Config {
    iso: PathBuf,
    size: String,
    image: String,
    kvm: bool,
    compress: bool,
}

impl Config {
    pub fn builder(iso: impl Into<PathBuf>, image: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            iso: iso.into(),
            size: DEFAULT_SIZE.to_string(),
            image: image.into(),
            kvm: false,
            compress: false,
        }
    }

    pub fn iso(&self) -> &Path {
        &self.iso
    }

    pub fn size(&self) -> &str {
        &self.size
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn kvm(&self) -> bool {
        self.kvm
    }

    pub fn compress(&self) -> bool {
        self.compress
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        Config::builder(args.iso, args.image)
            .size(args.size)
            .kvm(args.kvm)
            .compress(args.compress)
            .build()
    }
}

pub struct ConfigBuilder {
    iso: PathBuf,
    size: String,
    image: String,
    kvm: bool,
    compress: bool,
}

impl ConfigBuilder {
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    pub fn kvm(mut self, kvm: bool) -> Self {
        self.kvm = kvm;
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if self.iso.as_os_str().is_empty() {
            return Err(ConfigError::Missing("iso"));
        }
        if self.size.is_empty() {
            return Err(ConfigError::Missing("size"));
        }
        let image = parse_image(&self.image)?;
        Ok(Config {
            iso: self.iso,
            size: self.size,
            image,
            kvm: self.kvm,
            compress: self.compress,
        })
    }
}
