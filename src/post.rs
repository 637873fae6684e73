//! Post-processing of rendered files.
//!
//! Each rule pairs a glob, matched against the file basename, with a shell
//! command. Commands are tokenized with POSIX quoting rules; `{}` tokens are
//! replaced with the file path, and when no token contains `{}` the path is
//! appended as the final argument.

use globset::Glob;
use std::path::Path;
use std::process::Command;

use crate::engine::RenderEnv;
use crate::error::{Error, Result};

/// Runs every matching post-processing rule against `file`, in rule order.
/// A non-zero exit status aborts with the captured combined output.
pub(crate) fn post_file(env: &RenderEnv, file: &Path) -> Result<()> {
    let basename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    for rule in &env.post {
        let glob = Glob::new(&rule.pattern)
            .map_err(|e| Error::Input(format!("invalid post pattern {}: {}", rule.pattern, e)))?
            .compile_matcher();

        if !glob.is_match(&basename) {
            continue;
        }

        let (cmd, args) = build_command(&rule.command, file)?;

        if let Some(log) = &env.logger {
            log.debug(&format!(
                "Post processing using: {} {}",
                cmd,
                args.join(" ")
            ));
        }

        let output = Command::new(&cmd).args(&args).output().map_err(|e| {
            Error::PostProcess {
                file: file.display().to_string(),
                error: e.to_string(),
                output: String::new(),
            }
        })?;

        if !output.status.success() {
            let mut combined = output.stdout;
            combined.extend_from_slice(&output.stderr);

            return Err(Error::PostProcess {
                file: file.display().to_string(),
                error: output.status.to_string(),
                output: String::from_utf8_lossy(&combined).into_owned(),
            });
        }
    }

    Ok(())
}

/// Tokenizes a post-processing command and substitutes the file path. The
/// first token is the program, the rest are its arguments.
fn build_command(command: &str, file: &Path) -> Result<(String, Vec<String>)> {
    let parts = shell_words::split(command)
        .map_err(|e| Error::Input(format!("invalid post command {:?}: {}", command, e)))?;

    let Some((cmd, rest)) = parts.split_first() else {
        return Err(Error::Input(format!("empty post command {:?}", command)));
    };

    let path = file.display().to_string();
    let mut has_placeholder = false;
    let mut args = Vec::with_capacity(rest.len() + 1);

    for part in rest {
        if part.contains("{}") {
            args.push(part.replace("{}", &path));
            has_placeholder = true;
        } else {
            args.push(part.clone());
        }
    }

    if !has_placeholder {
        args.push(path);
    }

    Ok((cmd.clone(), args))
}
