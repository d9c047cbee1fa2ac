//! Interactive prompts
//!
//! Everything the installer says to or asks of the user goes through [`Console`], so the
//! prompting logic can be driven by scripted input in tests.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::{core::utils::is_game_dir, error::InstallerError, model::Channel};

pub trait Console {
    /// Print a line for the user
    fn say(&mut self, msg: &str);

    /// Show `prompt` and read one line of input
    ///
    /// Returns `None` once input is closed
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Show download progress. `total` is `None` when the size isn't known
    fn progress(&mut self, _downloaded: u64, _total: Option<u64>) {}

    /// The current download has ended
    fn progress_done(&mut self) {}
}

/// Console backed by the process' stdin and stdout
#[derive(Debug, Default)]
pub struct Stdio {
    bar: Option<ProgressBar>,
}

impl Stdio {
    fn new_bar(total: Option<u64>) -> ProgressBar {
        match total {
            Some(total) => ProgressBar::new(total).with_style(
                ProgressStyle::with_template("Progress: {percent:>3}% {wide_bar} {bytes}/{total_bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("->."),
            ),
            None => ProgressBar::new_spinner().with_style(
                ProgressStyle::with_template("{spinner} Downloaded {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            ),
        }
    }
}

impl Console for Stdio {
    fn say(&mut self, msg: &str) {
        match &self.bar {
            Some(bar) => bar.println(msg),
            None => println!("{msg}"),
        }
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut out = io::stdout().lock();
        write!(out, "{prompt}")?;
        out.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn progress(&mut self, downloaded: u64, total: Option<u64>) {
        let bar = self.bar.get_or_insert_with(|| Self::new_bar(total));
        bar.set_position(downloaded);
        if total.is_none() {
            bar.tick();
        }
    }

    fn progress_done(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

fn ask_or_cancel(console: &mut impl Console, prompt: &str) -> Result<String, InstallerError> {
    console.ask(prompt)?.ok_or(InstallerError::Cancelled)
}

/// Strips whitespace and one layer of surrounding quotes from a pasted path
pub fn clean_path_input(input: &str) -> &str {
    input.trim().trim_matches('"').trim_matches('\'')
}

/// Ask for the RimWorld directory until the user gives one that looks like a game install
///
/// # Errors
/// * `Cancelled` if input closes before a valid path is given
pub fn ask_game_dir(console: &mut impl Console) -> Result<PathBuf, InstallerError> {
    loop {
        let input = ask_or_cancel(
            console,
            "Please enter the path to your RimWorld installation: ",
        )?;
        let path = PathBuf::from(clean_path_input(&input));
        debug!("User entered game path {}", path.display());

        if !path.is_dir() {
            console.say("Directory not found. Please try again.");
        } else if is_game_dir(&path) {
            console.say(&format!(
                "RimWorld installation verified at: {}",
                path.display()
            ));
            return Ok(path);
        } else {
            console.say("This doesn't appear to be a valid RimWorld installation directory.");
        }
    }
}

/// Show the channel menu and ask until one of the listed choices is entered
///
/// # Errors
/// * `Cancelled` if input closes before a choice is made
pub fn ask_channel(console: &mut impl Console) -> Result<Channel, InstallerError> {
    console.say("\nWhich version of RimWorld Access do you want to install?");
    console.say("1. Stable - Latest stable release (recommended)");
    console.say("2. Beta - Latest beta/pre-release version");
    console.say("3. Dev - Development build (bleeding edge, may be unstable)");

    loop {
        let input = ask_or_cancel(console, "\nEnter your choice (1/2/3): ")?;
        match Channel::from_choice(&input) {
            Some(channel) => {
                console.say(match channel {
                    Channel::Stable => "Will download the latest stable release.",
                    Channel::Beta => "Will download the latest beta release.",
                    Channel::Dev => "Will download the development build.",
                });
                return Ok(channel);
            }
            None => console.say("Please enter 1, 2, or 3."),
        }
    }
}
