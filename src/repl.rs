//! The interactive command loop: `vfs$ ` prompt over stdin, one command
//! per line, `ERROR(...)` on failure, EOF exits 0.
//!
//! No external line-editing crate is used; history is a plain
//! in-memory `Vec<String>`.

use std::io::{self, BufRead, Write};

use crate::error::{Error, InputError};
use crate::fs::VirtualFs;

const PROMPT: &str = "vfs$ ";

/// Renders a namespace `Error` as `cannot <verb> '<name>' - <reason>`.
/// Each command has its own verb and, for `get`/`cp`/`mv`, its own
/// choice of which operand the message names.
fn describe(verb: &str, name: &str, err: &Error) -> String {
    let reason = match err {
        Error::NotFound(_) => match verb {
            "cd into" | "remove directory" => "entry doesn't exist".to_string(),
            "cat" => "entry not found".to_string(),
            _ => "file not found".to_string(),
        },
        Error::AlreadyExists(_) => match verb {
            "get" => "destination file already exists".to_string(),
            "create directory" => "entry exists".to_string(),
            _ => "entry already exists".to_string(),
        },
        Error::TypeMismatch(_, expected) => format!("entry not a {expected}"),
        Error::NotEmpty(_) => "entry not empty".to_string(),
        Error::NameTooLong(_) => format!("name too long (MAX: {} characters)", crate::sys::dir_entry::MAX_NAME_LEN),
        Error::CapacityExhausted => match verb {
            "create directory" => "disk is full".to_string(),
            _ => "disk space is full".to_string(),
        },
        Error::NotARegularFile { .. } => "file is not a regular file".to_string(),
        Error::HostIo(e) => match verb {
            "get" => format!("input file not found ({e})"),
            "put" => format!("could not write host file ({e})"),
            _ => format!("host I/O error ({e})"),
        },
    };
    format!("cannot {verb} '{name}' - {reason}")
}

pub struct Repl<'a> {
    fs: &'a mut VirtualFs,
    history: Vec<String>,
}

impl<'a> Repl<'a> {
    pub fn new(fs: &'a mut VirtualFs) -> Repl<'a> {
        Repl {
            fs,
            history: Vec::new(),
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut out = stdout.lock();

        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let mut line = String::new();
            let bytes_read = stdin.lock().read_line(&mut line)?;
            if bytes_read == 0 {
                return Ok(());
            }
            let line = line.trim_end_matches(['\n', '\r']);
            if line.is_empty() {
                continue;
            }
            self.history.push(line.to_string());

            if let Err(report) = self.dispatch(line, &mut out) {
                writeln!(out, "ERROR({report})")?;
            }
            if self.should_exit(line) {
                return Ok(());
            }
        }
    }

    fn should_exit(&self, line: &str) -> bool {
        line.split_whitespace().next() == Some("exit")
    }

    fn dispatch(&mut self, line: &str, out: &mut impl Write) -> Result<(), String> {
        let mut tokens = line.split_whitespace();
        let command = tokens.next().unwrap_or("");
        let rest: Vec<&str> = tokens.collect();

        macro_rules! exact {
            ($n:expr) => {
                if rest.len() < $n {
                    return Err(format!(
                        "input: {}",
                        InputError::TooFewArguments {
                            command: command.to_string()
                        }
                    ));
                } else if rest.len() > $n {
                    return Err(format!(
                        "input: {}",
                        InputError::TooManyArguments {
                            command: command.to_string()
                        }
                    ));
                }
            };
        }

        match command {
            "ls" => {
                exact!(0);
                for line in self.fs.list() {
                    writeln!(out, "{line}").map_err(|e| format!("ls: {e}"))?;
                }
                Ok(())
            }
            "mkdir" => {
                exact!(1);
                self.fs
                    .make_dir(rest[0])
                    .map_err(|e| format!("mkdir: {}", describe("create directory", rest[0], &e)))
            }
            "cd" => {
                exact!(1);
                self.fs
                    .change_dir(rest[0])
                    .map_err(|e| format!("cd: {}", describe("cd into", rest[0], &e)))
            }
            "pwd" => {
                exact!(0);
                writeln!(out, "{}", self.fs.print_working_dir()).map_err(|e| format!("pwd: {e}"))
            }
            "rmdir" => {
                exact!(1);
                self.fs
                    .remove_dir(rest[0])
                    .map_err(|e| format!("rmdir: {}", describe("remove directory", rest[0], &e)))
            }
            "get" => {
                exact!(2);
                let (host, name) = (rest[0], rest[1]);
                self.fs.ingest(host.as_ref(), name).map_err(|e| {
                    let operand = match e {
                        Error::AlreadyExists(_) => name,
                        _ => host,
                    };
                    format!("get: {}", describe("get", operand, &e))
                })
            }
            "put" => {
                exact!(2);
                self.fs
                    .egress(rest[0], rest[1].as_ref())
                    .map_err(|e| format!("put: {}", describe("put", rest[0], &e)))
            }
            "cat" => {
                exact!(1);
                self.fs
                    .cat(rest[0], out)
                    .map_err(|e| format!("cat: {}", describe("cat", rest[0], &e)))
            }
            "cp" => {
                exact!(2);
                self.fs
                    .copy_file(rest[0], rest[1])
                    .map_err(|e| format!("cp: {}", describe("copy", rest[0], &e)))
            }
            "mv" => {
                exact!(2);
                self.fs
                    .move_file(rest[0], rest[1])
                    .map_err(|e| format!("mv: {}", describe("move", rest[0], &e)))
            }
            "rm" => {
                exact!(1);
                self.fs
                    .remove_file(rest[0])
                    .map_err(|e| format!("rm: {}", describe("remove", rest[0], &e)))
            }
            "exit" => {
                exact!(0);
                Ok(())
            }
            _ => Err(format!("input: {}", InputError::UnknownCommand)),
        }
    }
}
