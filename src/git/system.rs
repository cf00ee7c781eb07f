//! Graph access through the `git` executable
//!
//! Reference lists travel on stdin (`git log --stdin`, `git cat-file
//! --batch-check`), so the number of refs in a query is not bounded by the
//! OS argument length. Logs are streamed record by record; the child process
//! is reaped when the stream ends, fails, or is dropped early.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Split, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Output, Stdio};
use std::thread::{self, JoinHandle};

use tracing::{debug, trace};

use crate::domain::{tag, Commit, CommitFields, CommitRef, Tag};
use crate::error::{ChangelogError, Result};
use crate::git::{CommitStream, LogQuery};

/// `git log` format: one NUL-separated field per [`CommitFields`] member
const LOG_FORMAT: &str = "%H%x00%s%x00%an%x00%ae%x00%at%x00%cn%x00%ct%x00%b%x00%B";
const FIELD_COUNT: usize = 9;

/// Git backend driving the system `git` binary
pub struct SystemGitRepository {
    repo_path: PathBuf,
    work_tree: Option<PathBuf>,
}

impl SystemGitRepository {
    /// Open the repository containing `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut repo = SystemGitRepository {
            repo_path: path.as_ref().to_path_buf(),
            work_tree: None,
        };

        repo.run_checked(&["rev-parse", "--git-dir"], None)?;
        // Fails in bare repositories, which have no work tree
        let toplevel = repo.run(&["rev-parse", "--show-toplevel"], None)?;
        if toplevel.status.success() {
            let toplevel = String::from_utf8_lossy(&toplevel.stdout).trim().to_string();
            repo.work_tree = Some(PathBuf::from(toplevel));
        }

        Ok(repo)
    }

    /// Create a git command running inside the repository
    fn git_cmd(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.repo_path);
        cmd.arg("-c").arg("core.quotePath=false");
        cmd.arg("-c").arg("log.showSignature=false");
        cmd
    }

    fn run(&self, args: &[&str], input: Option<String>) -> Result<Output> {
        trace!("running git {}", args.join(" "));
        let mut child = self
            .git_cmd()
            .args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let writer = feed_stdin(&mut child, input);
        let output = child.wait_with_output()?;
        let written = join_writer(writer);
        // Write errors only matter when the command reports success
        if output.status.success() {
            written?;
        }
        Ok(output)
    }

    fn run_checked(&self, args: &[&str], input: Option<String>) -> Result<String> {
        let output = self.run(args, input)?;
        if !output.status.success() {
            return Err(ChangelogError::CommandFailed {
                command: command_line(args),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Peel every reference to a commit hash, `None` where it does not resolve
    fn batch_check(&self, references: &[&str]) -> Result<Vec<Option<String>>> {
        if references.is_empty() {
            return Ok(Vec::new());
        }

        let input: String = references
            .iter()
            .map(|r| format!("{}^{{commit}}\n", r))
            .collect();
        let stdout = self.run_checked(&["cat-file", "--batch-check"], Some(input))?;

        Ok(stdout
            .lines()
            .map(|line| {
                let mut parts = line.split(' ');
                match (parts.next(), parts.next()) {
                    (Some(sha1), Some("commit")) => Some(sha1.to_string()),
                    _ => None,
                }
            })
            .collect())
    }

    /// Read full metadata of known hashes in one `git log --no-walk` call
    fn read_commits(&self, sha1s: &[String]) -> Result<HashMap<String, Commit>> {
        if sha1s.is_empty() {
            return Ok(HashMap::new());
        }

        let input: String = sha1s.iter().map(|s| format!("{}\n", s)).collect();
        let format = format!("--pretty=format:{}", LOG_FORMAT);
        let stdout = self.run_checked(
            &[
                "log",
                "--stdin",
                "-z",
                "--no-walk=unsorted",
                "--encoding=UTF-8",
                &format,
                "--",
            ],
            Some(input),
        )?;

        let tokens: Vec<&str> = stdout.split('\0').collect();
        Ok(tokens
            .chunks_exact(FIELD_COUNT)
            .map(|record| parse_record(record.iter().map(|s| s.to_string()).collect()))
            .map(|commit| (commit.sha1.clone(), commit))
            .collect())
    }

    fn stream_log(&self, query: &LogQuery) -> Result<LogStream> {
        let format = format!("--pretty=format:{}", LOG_FORMAT);
        let mut args = vec![
            "log",
            "--stdin",
            "-z",
            "--topo-order",
            "--encoding=UTF-8",
            format.as_str(),
        ];
        if !query.include_merges {
            args.push("--no-merges");
        }
        args.push("--");

        let mut input = String::new();
        for include in &query.includes {
            input.push_str(include.identifier());
            input.push('\n');
        }
        for exclude in &query.excludes {
            input.push('^');
            input.push_str(exclude.identifier());
            input.push('\n');
        }

        let command = command_line(&args);
        debug!(
            "streaming {} ({} includes, {} excludes)",
            command,
            query.includes.len(),
            query.excludes.len()
        );

        let mut cmd = self.git_cmd();
        cmd.args(&args);
        LogStream::spawn(cmd, input, command)
    }

    /// Check references before handing them to `git log`, which would only
    /// report them as a generic failure mid-stream
    fn check_refs(&self, references: &[&CommitRef]) -> Result<()> {
        let names: Vec<&str> = references
            .iter()
            .filter(|r| r.as_resolved().is_none())
            .map(|r| r.identifier())
            .collect();

        for (name, sha1) in names.iter().zip(self.batch_check(&names)?) {
            if sha1.is_none() {
                return Err(ChangelogError::reference_not_found(*name));
            }
        }
        Ok(())
    }
}

fn feed_stdin(child: &mut Child, input: Option<String>) -> Option<JoinHandle<io::Result<()>>> {
    let text = input?;
    let mut stdin = child.stdin.take()?;
    Some(thread::spawn(move || stdin.write_all(text.as_bytes())))
}

/// Wait for the stdin writer; a panicked writer counts as a failed write
fn join_writer(writer: Option<JoinHandle<io::Result<()>>>) -> io::Result<()> {
    match writer {
        None => Ok(()),
        Some(handle) => handle
            .join()
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "stdin writer panicked"))),
    }
}

fn command_line(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

fn parse_record(mut fields: Vec<String>) -> Commit {
    fields.resize(FIELD_COUNT, String::new());
    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();

    Commit::from_fields(CommitFields {
        sha1: next(),
        subject: next(),
        author_name: next(),
        author_email: next(),
        author_timestamp: next().trim().parse().unwrap_or_default(),
        committer_name: next(),
        committer_timestamp: next().trim().parse().unwrap_or_default(),
        body: next(),
        raw_body: next(),
    })
}

/// Lazily parsed output of a running `git log`
struct LogStream {
    child: Child,
    tokens: Split<BufReader<ChildStdout>>,
    writer: Option<JoinHandle<io::Result<()>>>,
    stderr: Option<JoinHandle<Vec<u8>>>,
    command: String,
    finished: bool,
    reaped: bool,
}

impl LogStream {
    /// Start `cmd`, feed `input` to its stdin and stream its NUL-separated
    /// output
    fn spawn(mut cmd: Command, input: String, command: String) -> Result<Self> {
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let writer = feed_stdin(&mut child, Some(input));
        let stderr = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = io::Read::read_to_end(&mut stderr, &mut buf);
                buf
            })
        });
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "child stdout").into());
            }
        };

        Ok(LogStream {
            child,
            tokens: BufReader::new(stdout).split(b'\0'),
            writer,
            stderr,
            command,
            finished: false,
            reaped: false,
        })
    }

    /// Wait for the child and turn a non-zero exit into an error
    fn finish(&mut self) -> Result<()> {
        let written = join_writer(self.writer.take());
        let status = self.child.wait()?;
        self.reaped = true;

        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            // Exiting cleanly on a partial ref list still loses commits
            return written.map_err(ChangelogError::from);
        }
        Err(ChangelogError::CommandFailed {
            command: self.command.clone(),
            code: status.code(),
            stdout: String::new(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

impl Iterator for LogStream {
    type Item = Result<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut fields = Vec::with_capacity(FIELD_COUNT);
        while fields.len() < FIELD_COUNT {
            match self.tokens.next() {
                Some(Ok(token)) => fields.push(String::from_utf8_lossy(&token).into_owned()),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.finished = true;
                    return match self.finish() {
                        Err(e) => Some(Err(e)),
                        Ok(()) if fields.is_empty() => None,
                        Ok(()) => Some(Err(ChangelogError::Io(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("truncated record in output of '{}'", self.command),
                        )))),
                    };
                }
            }
        }

        Some(Ok(parse_record(fields)))
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl super::Repository for SystemGitRepository {
    fn resolve(&self, reference: &str) -> Result<Commit> {
        let mut commits = self.resolve_all(&[CommitRef::named(reference)])?;
        commits
            .pop()
            .ok_or_else(|| ChangelogError::reference_not_found(reference))
    }

    fn resolve_all(&self, references: &[CommitRef]) -> Result<Vec<Commit>> {
        let names: Vec<&str> = references.iter().map(CommitRef::identifier).collect();
        let sha1s = self
            .batch_check(&names)?
            .into_iter()
            .zip(&names)
            .map(|(sha1, name)| sha1.ok_or_else(|| ChangelogError::reference_not_found(*name)))
            .collect::<Result<Vec<_>>>()?;

        let commits = self.read_commits(&sha1s)?;
        sha1s
            .iter()
            .map(|sha1| {
                commits
                    .get(sha1)
                    .cloned()
                    .ok_or_else(|| ChangelogError::reference_not_found(sha1.as_str()))
            })
            .collect()
    }

    fn tags(&self, contains: Option<&Commit>) -> Result<Vec<Tag>> {
        let merged = contains.map(|c| format!("--merged={}", c.sha1));
        let mut args = vec!["for-each-ref", "--sort=refname", "--format=%(refname:strip=2)"];
        if let Some(merged) = &merged {
            args.push(merged.as_str());
        }
        args.push("refs/tags");

        let stdout = self.run_checked(&args, None)?;
        let names: Vec<&str> = stdout.lines().filter(|l| !l.is_empty()).collect();
        let refs: Vec<String> = names.iter().map(|n| format!("refs/tags/{}", n)).collect();
        let refs: Vec<&str> = refs.iter().map(String::as_str).collect();

        let targets: Vec<(&str, String)> = names
            .iter()
            .zip(self.batch_check(&refs)?)
            .filter_map(|(name, sha1)| match sha1 {
                Some(sha1) => Some((*name, sha1)),
                None => {
                    trace!("skipping tag '{}': not pointing at a commit", name);
                    None
                }
            })
            .collect();

        let sha1s: Vec<String> = targets.iter().map(|(_, sha1)| sha1.clone()).collect();
        let commits = self.read_commits(&sha1s)?;

        let mut tags = targets
            .into_iter()
            .map(|(name, sha1)| {
                commits
                    .get(&sha1)
                    .cloned()
                    .map(|commit| Tag::new(name, commit))
                    .ok_or_else(|| ChangelogError::reference_not_found(name))
            })
            .collect::<Result<Vec<_>>>()?;

        tag::sort_by_timestamp(&mut tags);
        debug!("listed {} tags", tags.len());
        Ok(tags)
    }

    fn log(&self, query: &LogQuery) -> Result<CommitStream<'_>> {
        let refs: Vec<&CommitRef> = query.includes.iter().chain(&query.excludes).collect();
        self.check_refs(&refs)?;
        Ok(Box::new(self.stream_log(query)?))
    }

    fn merge_base(&self, left: &Commit, right: &Commit) -> Result<Commit> {
        let output = self.run(&["merge-base", &left.sha1, &right.sha1], None)?;
        let base = String::from_utf8_lossy(&output.stdout).trim().to_string();

        match output.status.code() {
            Some(0) if !base.is_empty() => self.resolve(&base),
            Some(1) if base.is_empty() => Err(ChangelogError::unrelated(&left.sha1, &right.sha1)),
            code => Err(ChangelogError::CommandFailed {
                command: command_line(&["merge-base", &left.sha1, &right.sha1]),
                code,
                stdout: base,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
    }

    fn workdir(&self) -> Option<PathBuf> {
        self.work_tree.clone()
    }

    fn config_value(&self, key: &str) -> Result<Option<String>> {
        let output = self.run(&["config", "--get", key], None)?;
        match output.status.code() {
            Some(0) => Ok(Some(
                String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            )),
            Some(1) => Ok(None),
            code => Err(ChangelogError::CommandFailed {
                command: command_line(&["config", "--get", key]),
                code,
                stdout: String::new(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
    }
}
