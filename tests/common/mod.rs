#![allow(dead_code)]

use std::fs;
use std::io::{BufReader, Read};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use isobake::Tools;
use tempfile::TempDir;

/// Which stand-in tools should fail.
#[derive(Default, Clone, Copy)]
pub struct Failures {
    pub create: bool,
    pub run: bool,
    pub compress: bool,
    pub build: bool,
    pub push: bool,
}

/// Shell script stand-ins for qemu-img, qemu-system-x86_64 and docker.
/// Every invocation is appended to a log, and docker build snapshots its
/// context directory so tests can inspect it after the working directory
/// is gone.
pub struct FakeTools {
    dir: TempDir,
}

const FAIL: &str = "echo \"simulated failure: $*\"; exit 1";
const PASS: &str = ":";

impl FakeTools {
    pub fn new(failures: Failures) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();
        fs::create_dir(dir.path().join("seen")).unwrap();
        let fake = FakeTools { dir };
        let log = fake.log_path();
        let seen = fake.seen_dir();
        let on = |fail: bool| if fail { FAIL } else { PASS };

        fake.script(
            "qemu-img",
            &format!(
                r#"echo "qemu-img $*" >> '{log}'
case "$1" in
create)
  {create}
  printf 'fresh disk' > "$4"
  ;;
convert)
  printf 'partial' > "$6"
  {compress}
  printf 'compressed disk' > "$6"
  ;;
esac
"#,
                log = log.display(),
                create = on(failures.create),
                compress = on(failures.compress),
            ),
        );

        fake.script(
            "qemu-system-x86_64",
            &format!(
                r#"trap 'echo "qemu-system interrupted" >> "{log}"; exit {status}' INT
echo "qemu-system $*" >> '{log}'
for arg; do
  case "$arg" in
  file=*) printf ' installed' >> "${{arg#file=}}" ;;
  esac
done
while :; do sleep 0.1; done
"#,
                log = log.display(),
                status = if failures.run { 1 } else { 0 },
            ),
        );

        fake.script(
            "docker",
            &format!(
                r#"echo "docker $*" >> '{log}'
case "$1" in
build)
  cp "$4/Dockerfile" '{seen}/Dockerfile'
  cp "$4/base.qcow2" '{seen}/base.qcow2'
  LC_ALL=C ls "$4" > '{seen}/context'
  {build}
  ;;
push)
  {push}
  ;;
esac
"#,
                log = log.display(),
                seen = seen.display(),
                build = on(failures.build),
                push = on(failures.push),
            ),
        );

        fake
    }

    fn script(&self, name: &str, body: &str) {
        let path = self.bin_dir().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("invocations.log")
    }

    pub fn seen_dir(&self) -> PathBuf {
        self.dir.path().join("seen")
    }

    pub fn tools(&self) -> Tools {
        Tools {
            qemu_img: self.bin_dir().join("qemu-img"),
            emulator: self.bin_dir().join("qemu-system-x86_64"),
            docker: self.bin_dir().join("docker"),
        }
    }

    pub fn invocations(&self) -> Vec<String> {
        match fs::read_to_string(self.log_path()) {
            Ok(log) => log.lines().map(str::to_owned).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn invoked(&self, prefix: &str) -> bool {
        self.invocations()
            .iter()
            .any(|line| line.starts_with(prefix))
    }

    pub fn seen(&self, name: &str) -> String {
        fs::read_to_string(self.seen_dir().join(name)).unwrap()
    }
}

/// An operator who presses enter once, after giving the emulator time to
/// start.
pub struct Operator {
    delay: Duration,
    answered: bool,
}

impl Read for Operator {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.answered || buf.is_empty() {
            return Ok(0);
        }
        std::thread::sleep(self.delay);
        self.answered = true;
        buf[0] = b'\n';
        Ok(1)
    }
}

pub fn operator() -> BufReader<Operator> {
    BufReader::new(Operator {
        delay: Duration::from_millis(300),
        answered: false,
    })
}

pub fn read(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}
