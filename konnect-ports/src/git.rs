//! Git working-copy driver.
//!
//! A [`WorkingCopy`] lives in its own scratch directory, created by
//! [`Git::clone_repo`] and deleted by [`WorkingCopy::close`] or, on every other
//! exit path, when the handle is dropped.
//!
//! [`CliGit`] drives the `git` executable. Each invocation is polled so a
//! cancelled [`CancelToken`] kills the child and yields [`GitError::Cancelled`].

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use konnect_core::layout;
use konnect_core::{CancelToken, GitAuthor};

use crate::error::{git_io, GitError};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Resolved credentials for one remote.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    None,
    /// PEM/OpenSSH private key contents.
    SshKey { private_key: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::SshKey { .. } => f.write_str("SshKey(..)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    /// Branch to check out instead of the remote's default.
    pub branch: Option<String>,
    /// Shallow-clone depth.
    pub depth: Option<u32>,
}

impl CloneOptions {
    /// Single-commit clone of `branch`.
    pub fn shallow(branch: impl Into<String>) -> Self {
        Self {
            branch: Some(branch.into()),
            depth: Some(1),
        }
    }
}

pub trait Git: Send + Sync {
    /// Clone `remote` into a fresh scratch directory.
    fn clone_repo(
        &self,
        remote: &str,
        credentials: &Credentials,
        options: &CloneOptions,
        cx: &CancelToken,
    ) -> Result<Box<dyn WorkingCopy>, GitError>;
}

pub trait WorkingCopy: Send {
    /// Root of the checked-out tree.
    fn root(&self) -> &Path;

    fn remote(&self) -> &str;

    /// Currently checked-out branch.
    fn branch(&self) -> &str;

    /// Switch to `branch`, creating it if absent (tracking the remote branch
    /// when one exists). Uncommitted changes are carried over.
    fn checkout(&mut self, branch: &str, cx: &CancelToken) -> Result<(), GitError>;

    /// No tracked changes and no untracked files.
    fn is_clean(&self, cx: &CancelToken) -> Result<bool, GitError>;

    fn add(&mut self, pathspec: &str, cx: &CancelToken) -> Result<(), GitError>;

    fn commit(&mut self, message: &str, author: &GitAuthor, cx: &CancelToken)
        -> Result<(), GitError>;

    /// Push the current branch to `origin` with the clone's credentials.
    fn push(&mut self, cx: &CancelToken) -> Result<(), GitError>;

    /// Delete the scratch directory.
    fn close(self: Box<Self>) -> Result<(), GitError>;

    /// Bytes of `path`, relative to the tree root. Absolute paths and `..`
    /// components are rejected.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, GitError> {
        if !layout::is_contained(path) {
            return Err(GitError::UnsafePath {
                remote: self.remote().to_string(),
                path: path.to_string(),
            });
        }
        let full = self.root().join(path);
        std::fs::read(&full).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                GitError::MissingFile {
                    remote: self.remote().to_string(),
                    branch: self.branch().to_string(),
                    path: path.to_string(),
                }
            } else {
                git_io(full, source)
            }
        })
    }
}

// ---------------------------------------------------------------------------
// CLI implementation
// ---------------------------------------------------------------------------

/// [`Git`] over the `git` executable.
#[derive(Debug, Clone)]
pub struct CliGit {
    program: PathBuf,
}

impl Default for CliGit {
    fn default() -> Self {
        Self::new("git")
    }
}

impl CliGit {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Git for CliGit {
    fn clone_repo(
        &self,
        remote: &str,
        credentials: &Credentials,
        options: &CloneOptions,
        cx: &CancelToken,
    ) -> Result<Box<dyn WorkingCopy>, GitError> {
        cx.check()?;
        let dir = tempfile::Builder::new()
            .prefix("konnect-orchestrator-")
            .tempdir()
            .map_err(|e| git_io(std::env::temp_dir(), e))?;
        let ssh = SshIdentity::prepare(credentials)?;
        let runner = Runner {
            program: &self.program,
            ssh: ssh.as_ref(),
        };

        let depth = options.depth.map(|d| d.to_string());
        let mut args = vec!["clone", "--quiet"];
        if let Some(depth) = depth.as_deref() {
            args.extend(["--depth", depth]);
        }
        if let Some(branch) = options.branch.as_deref() {
            args.extend(["--branch", branch]);
        }
        args.extend(["--", remote, "repo"]);
        runner.run(dir.path(), &args, cx)?;

        let root = dir.path().join("repo");
        let branch = runner
            .run(&root, &["rev-parse", "--abbrev-ref", "HEAD"], cx)?
            .trim()
            .to_string();
        tracing::debug!(remote, %branch, path = %root.display(), "cloned");

        Ok(Box::new(CliWorkingCopy {
            program: self.program.clone(),
            root,
            remote: remote.to_string(),
            branch,
            ssh,
            dir,
        }))
    }
}

struct CliWorkingCopy {
    program: PathBuf,
    root: PathBuf,
    remote: String,
    branch: String,
    ssh: Option<SshIdentity>,
    // Last field: dropped after the key directory.
    dir: TempDir,
}

impl CliWorkingCopy {
    fn runner(&self) -> Runner<'_> {
        Runner {
            program: &self.program,
            ssh: self.ssh.as_ref(),
        }
    }

    fn has_ref(&self, reference: &str, cx: &CancelToken) -> Result<bool, GitError> {
        self.runner().succeeds(
            &self.root,
            &["rev-parse", "--verify", "--quiet", reference],
            cx,
        )
    }
}

impl WorkingCopy for CliWorkingCopy {
    fn root(&self) -> &Path {
        &self.root
    }

    fn remote(&self) -> &str {
        &self.remote
    }

    fn branch(&self) -> &str {
        &self.branch
    }

    fn checkout(&mut self, branch: &str, cx: &CancelToken) -> Result<(), GitError> {
        if self.branch == branch {
            return Ok(());
        }
        let local = format!("refs/heads/{branch}");
        let tracking = format!("refs/remotes/origin/{branch}");
        let upstream = format!("origin/{branch}");
        let args: Vec<&str> = if self.has_ref(&local, cx)? {
            vec!["checkout", "--quiet", branch]
        } else if self.has_ref(&tracking, cx)? {
            vec!["checkout", "--quiet", "-b", branch, "--track", upstream.as_str()]
        } else {
            vec!["checkout", "--quiet", "-b", branch]
        };
        self.runner().run(&self.root, &args, cx)?;
        self.branch = branch.to_string();
        Ok(())
    }

    fn is_clean(&self, cx: &CancelToken) -> Result<bool, GitError> {
        let status = self.runner().run(
            &self.root,
            &["status", "--porcelain", "--untracked-files=all"],
            cx,
        )?;
        Ok(status.trim().is_empty())
    }

    fn add(&mut self, pathspec: &str, cx: &CancelToken) -> Result<(), GitError> {
        self.runner()
            .run(&self.root, &["add", "--all", "--", pathspec], cx)
            .map(|_| ())
    }

    fn commit(
        &mut self,
        message: &str,
        author: &GitAuthor,
        cx: &CancelToken,
    ) -> Result<(), GitError> {
        let name = format!("user.name={}", author.name);
        let email = format!("user.email={}", author.email);
        let author_arg = format!("{} <{}>", author.name, author.email);
        self.runner()
            .run(
                &self.root,
                &[
                    "-c",
                    name.as_str(),
                    "-c",
                    email.as_str(),
                    "-c",
                    "commit.gpgsign=false",
                    "commit",
                    "--quiet",
                    "--author",
                    author_arg.as_str(),
                    "-m",
                    message,
                ],
                cx,
            )
            .map(|_| ())
    }

    fn push(&mut self, cx: &CancelToken) -> Result<(), GitError> {
        let refspec = format!("HEAD:refs/heads/{}", self.branch);
        self.runner()
            .run(
                &self.root,
                &["push", "--quiet", "--set-upstream", "origin", refspec.as_str()],
                cx,
            )
            .map(|_| ())
    }

    fn close(self: Box<Self>) -> Result<(), GitError> {
        let CliWorkingCopy { dir, ssh, .. } = *self;
        drop(ssh);
        let path = dir.path().to_path_buf();
        dir.close().map_err(|e| git_io(path, e))
    }
}

// ---------------------------------------------------------------------------
// SSH identity
// ---------------------------------------------------------------------------

/// A private key written to its own 0600 file for `GIT_SSH_COMMAND`.
struct SshIdentity {
    key: PathBuf,
    _dir: TempDir,
}

impl SshIdentity {
    fn prepare(credentials: &Credentials) -> Result<Option<Self>, GitError> {
        let Credentials::SshKey { private_key } = credentials else {
            return Ok(None);
        };
        let dir = tempfile::Builder::new()
            .prefix("konnect-orchestrator-ssh-")
            .tempdir()
            .map_err(|e| git_io(std::env::temp_dir(), e))?;
        let key = dir.path().join("id");

        let mut contents = private_key.clone();
        if !contents.ends_with('\n') {
            contents.push('\n');
        }
        write_private(&key, contents.as_bytes())?;
        Ok(Some(Self { key, _dir: dir }))
    }

    fn command(&self) -> String {
        format!(
            "ssh -i '{}' -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
            self.key.display()
        )
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), GitError> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| git_io(path, e))?;
    file.write_all(bytes).map_err(|e| git_io(path, e))
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> Result<(), GitError> {
    std::fs::write(path, bytes).map_err(|e| git_io(path, e))
}

// ---------------------------------------------------------------------------
// Process runner
// ---------------------------------------------------------------------------

struct Runner<'a> {
    program: &'a Path,
    ssh: Option<&'a SshIdentity>,
}

struct Finished {
    success: bool,
    status: String,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Runner<'_> {
    /// Run git and return stdout; non-zero exit is an error.
    fn run(&self, cwd: &Path, args: &[&str], cx: &CancelToken) -> Result<String, GitError> {
        let done = self.exec(cwd, args, cx)?;
        if !done.success {
            return Err(GitError::Command {
                args: args.join(" "),
                status: done.status,
                stderr: String::from_utf8_lossy(&done.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&done.stdout).into_owned())
    }

    /// Run git and report whether it exited successfully.
    fn succeeds(&self, cwd: &Path, args: &[&str], cx: &CancelToken) -> Result<bool, GitError> {
        self.exec(cwd, args, cx).map(|done| done.success)
    }

    fn exec(&self, cwd: &Path, args: &[&str], cx: &CancelToken) -> Result<Finished, GitError> {
        cx.check()?;
        let mut cmd = Command::new(self.program);
        cmd.args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ssh) = self.ssh {
            cmd.env("GIT_SSH_COMMAND", ssh.command());
        }

        let mut child = cmd.spawn().map_err(|source| GitError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = loop {
            if let Some(status) = child.try_wait().map_err(|e| git_io(cwd, e))? {
                break status;
            }
            if cx.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                tracing::warn!(args = %args.join(" "), "git cancelled");
                return Err(GitError::Cancelled);
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Finished {
            success: status.success(),
            status: status.to_string(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}
