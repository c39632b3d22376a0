use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Locates the expense log to process. `Ok(None)` means the user cancelled.
#[enum_dispatch]
pub trait LocateSource {
    fn locate(&self) -> Result<Option<PathBuf>>;
}

#[enum_dispatch(LocateSource)]
pub enum Source {
    ArgumentSource,
    PromptSource,
}

impl Source {
    pub fn from_argument(path: Option<PathBuf>) -> Source {
        match path {
            Some(path) => Source::ArgumentSource(ArgumentSource::new(path)),
            None => Source::PromptSource(PromptSource),
        }
    }
}

/// A path given on the command line.
pub struct ArgumentSource {
    path: PathBuf,
}

impl ArgumentSource {
    pub fn new(path: PathBuf) -> ArgumentSource {
        ArgumentSource { path }
    }
}

impl LocateSource for ArgumentSource {
    fn locate(&self) -> Result<Option<PathBuf>> {
        Ok(Some(self.path.clone()))
    }
}

/// Asks for a path on the terminal.
pub struct PromptSource;

impl PromptSource {
    /// An empty answer or end of input cancels.
    pub fn read_answer<R: BufRead>(reader: &mut R) -> Result<Option<PathBuf>> {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let answer = line.trim().trim_matches('"');
        if answer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(answer)))
        }
    }
}

impl LocateSource for PromptSource {
    fn locate(&self) -> Result<Option<PathBuf>> {
        eprint!("Expense log (.csv), empty to cancel: ");
        io::stderr().flush()?;

        PromptSource::read_answer(&mut io::stdin().lock())
    }
}
