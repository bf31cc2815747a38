//! Shared test helpers for merge-index integration tests.
//!
//! All tests use temp directories and leave the real repo untouched.
//! Each test gets its own conflicted git repo via `setup_conflicted_repo()`,
//! and a merge program script that logs its argv via `recording_tool()`.

#![allow(dead_code)]

use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Run git with a fixed identity and no user config. Panics on spawn failure.
pub fn git(dir: &Path, args: &[&str]) -> Output {
    Command::new("git")
        .args(["-c", "user.email=test@test.com", "-c", "user.name=Test User"])
        .args(["-c", "init.defaultBranch=main", "-c", "commit.gpgsign=false"])
        .args(args)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env_remove("GIT_DIR")
        .current_dir(dir)
        .output()
        .expect("failed to run git")
}

/// Run git and assert it succeeds. Returns stdout.
pub fn git_ok(dir: &Path, args: &[&str]) -> String {
    let out = git(dir, args);
    assert!(
        out.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

/// Create a repo on `main` with one committed file, `clean.txt`.
pub fn init_repo() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    let root = dir.path();
    git_ok(root, &["init", "-q"]);
    std::fs::write(root.join("clean.txt"), "clean\n").unwrap();
    git_ok(root, &["add", "."]);
    git_ok(root, &["commit", "-q", "-m", "init"]);
    dir
}

/// Create a repo with `conflicted` files unmerged at stages 1-3 and a
/// resolved `clean.txt`.
pub fn setup_conflicted_repo(conflicted: &[&str]) -> TempDir {
    let dir = init_repo();
    make_conflicts(dir.path(), conflicted);
    dir
}

/// Leave `conflicted` unmerged at stages 1-3 in the repo at `root`, by
/// merging a `side` branch that edits them differently.
pub fn make_conflicts<P: AsRef<Path>>(root: &Path, conflicted: &[P]) {
    assert!(!conflicted.is_empty());
    for name in conflicted {
        std::fs::write(root.join(name), "base\n").unwrap();
    }
    git_ok(root, &["add", "."]);
    git_ok(root, &["commit", "-q", "-m", "base"]);

    git_ok(root, &["checkout", "-q", "-b", "side"]);
    for name in conflicted {
        std::fs::write(root.join(name), "theirs\n").unwrap();
    }
    git_ok(root, &["commit", "-q", "-am", "theirs"]);

    git_ok(root, &["checkout", "-q", "main"]);
    for name in conflicted {
        std::fs::write(root.join(name), "ours\n").unwrap();
    }
    git_ok(root, &["commit", "-q", "-am", "ours"]);

    let out = git(root, &["merge", "side"]);
    assert!(!out.status.success(), "merge was expected to conflict");
}

/// Create a repo whose sparse index keeps `dir/` collapsed into one
/// stage-0 entry while `conflict.txt` is unmerged. `dir/` holds
/// `inside.txt` and `sub/deep.txt`.
pub fn setup_sparse_conflicted_repo() -> TempDir {
    let dir = init_repo();
    let root = dir.path();
    std::fs::create_dir_all(root.join("dir/sub")).unwrap();
    std::fs::write(root.join("dir/inside.txt"), "inside\n").unwrap();
    std::fs::write(root.join("dir/sub/deep.txt"), "deep\n").unwrap();
    git_ok(root, &["add", "dir"]);
    git_ok(root, &["commit", "-q", "-m", "add dir"]);
    git_ok(root, &["sparse-checkout", "init", "--cone", "--sparse-index"]);

    make_conflicts(root, &["conflict.txt"]);

    let listing = git_ok(root, &["ls-files", "--sparse", "--stage"]);
    assert!(
        listing.lines().any(|l| l.starts_with("040000 ") && l.ends_with("\tdir/")),
        "dir/ should be a sparse directory entry:\n{listing}"
    );
    dir
}

/// `(mode, oid)` per stage 1..=3 for `path`, from `git ls-files --stage`.
pub fn stages_of(repo: &Path, path: &str) -> Vec<(String, String)> {
    git_ok(repo, &["ls-files", "--stage", "--", path])
        .lines()
        .map(|line| {
            let mut fields = line.split_whitespace();
            let mode = fields.next().unwrap().to_owned();
            let oid = fields.next().unwrap().to_owned();
            (mode, oid)
        })
        .collect()
}

/// A merge program that appends its arguments (joined by `|`) as one line
/// to `log`, then exits with `status`.
pub struct RecordingTool {
    _dir: TempDir,
    pub script: PathBuf,
    pub log: PathBuf,
}

impl RecordingTool {
    /// The raw log, for arguments that are not valid UTF-8.
    pub fn raw_log(&self) -> Vec<u8> {
        std::fs::read(&self.log).unwrap_or_default()
    }

    /// Logged invocations, one `Vec` of arguments per call.
    pub fn calls(&self) -> Vec<Vec<String>> {
        let Ok(text) = std::fs::read_to_string(&self.log) else {
            return Vec::new();
        };
        text.lines()
            .map(|line| line.split('|').map(str::to_owned).collect())
            .collect()
    }

    pub fn script_str(&self) -> &str {
        self.script.to_str().unwrap()
    }
}

pub fn recording_tool(status: i32) -> RecordingTool {
    let dir = TempDir::new().expect("failed to create temp dir");
    let script = dir.path().join("merge-tool.sh");
    let log = dir.path().join("calls.log");
    let body = format!(
        "#!/bin/sh\n\
         first=1\n\
         for arg in \"$@\"; do\n\
         \x20 if [ $first -eq 1 ]; then first=0; else printf '|' >> '{log}'; fi\n\
         \x20 printf '%s' \"$arg\" >> '{log}'\n\
         done\n\
         echo >> '{log}'\n\
         exit {status}\n",
        log = log.display(),
    );
    std::fs::write(&script, body).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    RecordingTool {
        _dir: dir,
        script,
        log,
    }
}

/// Run the merge-index binary in `dir`.
pub fn merge_index_in<S: AsRef<OsStr>>(dir: &Path, args: &[S]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_merge-index"))
        .args(args)
        .env_remove("GIT_DIR")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .env_remove("RUST_LOG")
        .current_dir(dir)
        .output()
        .expect("failed to execute merge-index")
}

/// Exit status of an [`Output`], panicking if killed by a signal.
pub fn status_code(out: &Output) -> i32 {
    out.status.code().expect("merge-index was killed by a signal")
}

pub fn stderr_of(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}
