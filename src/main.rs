use std::process::ExitCode;

use isobake::tools::REQUIRED_TOOLS;
use isobake::{preflight, Args, Config, InstallError, Installer};

fn main() -> ExitCode {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(env).init();

    match run() {
        Ok(()) => {
            log::info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    preflight::check(REQUIRED_TOOLS)?;

    let args = Args::parse_flags(std::env::args_os());
    let config = Config::try_from(args)?;

    let installer = Installer::new(config)?;
    installer.install().map_err(abort)
}

fn abort(err: InstallError) -> anyhow::Error {
    let context = if err.is_fatal() {
        "Emulator could not be stopped"
    } else {
        "Installation aborted"
    };
    anyhow::Error::new(err).context(context)
}
