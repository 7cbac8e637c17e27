use std::io::{self, BufRead, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use crate::error::{InstallError, Stage};

pub const MEMORY: &str = "size=1024";
pub const CPUS: &str = "cpus=1";
pub const VNC_DISPLAY: &str = "0.0.0.0:0";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Operator input the machine stage blocks on.
pub type OperatorInput = Box<dyn BufRead + Send>;

/// An emulator booted from the install ISO with the fresh disk attached.
pub struct Machine {
    emulator: PathBuf,
    iso: PathBuf,
    disk: PathBuf,
    kvm: bool,
}

impl Machine {
    pub fn new(emulator: &Path, iso: &Path, disk: &Path, kvm: bool) -> Self {
        Self {
            emulator: emulator.to_path_buf(),
            iso: iso.to_path_buf(),
            disk: disk.to_path_buf(),
            kvm,
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.emulator);
        if self.kvm {
            cmd.arg("-enable-kvm");
        }
        cmd.arg("-m").arg(MEMORY);
        cmd.arg("-smp").arg(CPUS);
        cmd.arg("-cdrom").arg(&self.iso);
        cmd.arg("-vnc").arg(VNC_DISPLAY);
        let mut drive = std::ffi::OsString::from("file=");
        drive.push(&self.disk);
        cmd.arg("-drive").arg(drive);
        cmd
    }

    /// Boot the machine and keep it running until the operator confirms the
    /// installation finished, or until it exits on its own.
    ///
    /// Once a line (or end of input) arrives, the emulator gets SIGINT and
    /// is waited on. If it exits first the reader thread is left blocked on
    /// `input` until the process ends.
    pub fn run(&self, input: OperatorInput) -> Result<String, InstallError> {
        let mut capture = tempfile::tempfile().map_err(io_err(CAPTURE))?;
        let mut cmd = self.command();
        cmd.stdin(Stdio::null());
        cmd.stdout(capture.try_clone().map_err(io_err(CAPTURE))?);
        cmd.stderr(capture.try_clone().map_err(io_err(CAPTURE))?);

        log::debug!("Running {:?}", cmd);
        let mut child = cmd.spawn().map_err(|source| InstallError::Spawn {
            stage: Stage::RunMachine,
            program: self.emulator.clone(),
            source,
        })?;

        let status = wait_for_operator(&mut child, input)?;

        let mut output = String::new();
        capture.seek(SeekFrom::Start(0)).map_err(io_err(READ))?;
        capture.read_to_string(&mut output).map_err(io_err(READ))?;

        if status.success() {
            Ok(output)
        } else {
            Err(InstallError::Stage {
                stage: Stage::RunMachine,
                program: self.emulator.clone(),
                status,
                output,
            })
        }
    }
}

const CAPTURE: &str = "unable to capture emulator output";
const READ: &str = "unable to read emulator output";
const WAIT: &str = "unable to wait for emulator";

fn io_err(context: &'static str) -> impl FnOnce(io::Error) -> InstallError {
    move |e| InstallError::io(Stage::RunMachine, context, e)
}

fn wait_for_operator(
    child: &mut Child,
    mut input: OperatorInput,
) -> Result<ExitStatus, InstallError> {
    let (ack_tx, ack_rx) = mpsc::channel();
    thread::Builder::new()
        .name("operator-input".into())
        .spawn(move || {
            log::info!("Press [enter] when installation is complete.");
            let mut line = String::new();
            let _ = input.read_line(&mut line);
            let _ = ack_tx.send(());
        })
        .map_err(io_err("unable to wait for operator input"))?;

    loop {
        if let Some(status) = child.try_wait().map_err(io_err(WAIT))? {
            return Ok(status);
        }
        match ack_rx.recv_timeout(POLL_INTERVAL) {
            Ok(()) => {
                interrupt(child)?;
                return child.wait().map_err(io_err(WAIT));
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return child.wait().map_err(io_err(WAIT)),
        }
    }
}

// The child has not been reaped yet, so its pid cannot have been reused.
fn interrupt(child: &Child) -> Result<(), InstallError> {
    let pid = child.id();
    log::debug!("Sending SIGINT to emulator (pid {})", pid);
    kill(Pid::from_raw(pid as i32), Signal::SIGINT)
        .map_err(|source| InstallError::Interrupt { pid, source })
}
