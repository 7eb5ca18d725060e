use std::{env, process::Command};

const COMMIT_ENV: &str = "CURVEADJ_GIT_COMMIT";

/// Embeds the release tag or short commit hash as `GIT_COMMIT`.
/// Packagers building from a tarball can set `CURVEADJ_GIT_COMMIT` instead.
fn main() {
    println!("cargo:rerun-if-env-changed={COMMIT_ENV}");

    let commit = match env::var(COMMIT_ENV) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_owned(),
        _ => describe_head().unwrap_or_else(|| "unknown".to_owned()),
    };
    println!("cargo:rustc-env=GIT_COMMIT={commit}");
}

fn describe_head() -> Option<String> {
    let release_tag = git(&["tag", "--points-at", "HEAD"]).and_then(|tags| {
        tags.lines()
            .find(|tag| tag.starts_with('v'))
            .map(str::to_owned)
    });
    release_tag.or_else(|| git(&["rev-parse", "--short", "HEAD"]))
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_owned()).filter(|text| !text.is_empty())
}
