//! Shared test fixtures

use std::{
    cell::RefCell,
    collections::{HashMap, VecDeque},
    fs::File,
    io::{self, Cursor, Write},
    path::Path,
};

use zip::{write::SimpleFileOptions, ZipWriter};

use crate::{
    console::Console,
    core::{
        manage::{copy_with_progress, Downloader},
        utils::Interrupt,
    },
    error::InstallerError,
};

/// Console fed from a fixed list of answers, recording everything it was told
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    pub output: Vec<String>,
    pub asked: usize,
    pub progress: Vec<(u64, Option<u64>)>,
    pub downloads_finished: usize,
}

impl ScriptedConsole {
    pub fn new(answers: impl IntoIterator<Item = String>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn said(&self, needle: &str) -> bool {
        self.output.iter().any(|l| l.contains(needle))
    }
}

impl Console for ScriptedConsole {
    fn say(&mut self, msg: &str) {
        self.output.push(msg.to_string());
    }

    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.push(prompt.to_string());
        self.asked += 1;
        Ok(self.answers.pop_front().map(|a| format!("{a}\n")))
    }

    fn progress(&mut self, downloaded: u64, total: Option<u64>) {
        self.progress.push((downloaded, total));
    }

    fn progress_done(&mut self) {
        self.downloads_finished += 1;
    }
}

/// Builds an in-memory zip holding `files` (paths ending in `/` become directories)
pub fn zip_with(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(vec![]));
    let options = SimpleFileOptions::default();
    for (name, contents) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Serves canned archives instead of hitting the network
#[derive(Debug, Default)]
pub struct FixtureDownloader {
    files: HashMap<String, Vec<u8>>,
    pub requested: RefCell<Vec<String>>,
    unknown_length: bool,
    interrupt_mid_copy: bool,
}

impl FixtureDownloader {
    pub fn with(mut self, url: &str, data: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), data);
        self
    }

    /// Behave like a server that sends no content length
    pub fn unknown_length(mut self) -> Self {
        self.unknown_length = true;
        self
    }

    /// Request the interrupt as soon as the first chunk is written
    pub fn interrupt_mid_copy(mut self) -> Self {
        self.interrupt_mid_copy = true;
        self
    }
}

impl Downloader for FixtureDownloader {
    fn download(
        &self,
        url: &str,
        dest: &Path,
        interrupt: &Interrupt,
        progress: &mut dyn FnMut(u64, u64, Option<u64>),
    ) -> Result<u64, InstallerError> {
        self.requested.borrow_mut().push(url.to_string());
        let data = self
            .files
            .get(url)
            .ok_or_else(|| InstallerError::MiscError(format!("404 for {url}")))?;
        let mut file = File::create(dest)?;
        let total = (!self.unknown_length).then_some(data.len() as u64);
        copy_with_progress(
            &mut data.as_slice(),
            &mut file,
            total,
            interrupt,
            &mut |delta, done, total| {
                if self.interrupt_mid_copy {
                    interrupt.request();
                }
                progress(delta, done, total)
            },
        )
    }
}
