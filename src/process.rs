use std::process::{Command, Output};

use crate::error::{InstallError, Stage};

/// Run `cmd` to completion with stdin detached, returning its stdout.
/// A nonzero exit becomes [`InstallError::Stage`] carrying everything the
/// program printed.
pub fn run_captured(stage: Stage, cmd: &mut Command) -> Result<String, InstallError> {
    log::debug!("Running {:?}", cmd);
    let output = cmd.output().map_err(|source| InstallError::Spawn {
        stage,
        program: cmd.get_program().into(),
        source,
    })?;
    let text = combined(&output);
    if output.status.success() {
        Ok(text)
    } else {
        Err(InstallError::Stage {
            stage,
            program: cmd.get_program().into(),
            status: output.status,
            output: text,
        })
    }
}

fn combined(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
