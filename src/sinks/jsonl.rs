//! JSON Lines file sink.
//!
//! Appends one event per line and rotates files by size or age, optionally
//! gzip-compressed.

use crate::core::config::{ConfigError, FileConfig};
use crate::core::traits::{EventSink, PublishError};
use chrono::Utc;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonlCompression {
    None,
    Gzip,
}

impl JsonlCompression {
    pub fn parse(value: Option<&str>) -> Result<Self, ConfigError> {
        let Some(value) = value else {
            return Ok(JsonlCompression::None);
        };
        let normalized = value.trim().to_lowercase();
        match normalized.as_str() {
            "" | "none" => Ok(JsonlCompression::None),
            "gzip" | "gz" => Ok(JsonlCompression::Gzip),
            _ => Err(ConfigError::InvalidCompression(value.to_string())),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            JsonlCompression::None => "jsonl",
            JsonlCompression::Gzip => "jsonl.gz",
        }
    }
}

/// Rotation and compression settings for `JsonlSink`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonlOptions {
    pub dir: PathBuf,
    pub target_size_bytes: u64,
    pub max_age: Option<Duration>,
    pub compression: JsonlCompression,
}

impl JsonlOptions {
    pub fn from_config(dir: impl Into<PathBuf>, files: &FileConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            dir: dir.into(),
            target_size_bytes: files.target_size_mb.max(1).saturating_mul(1024 * 1024),
            max_age: files
                .max_age_seconds
                .filter(|seconds| *seconds > 0)
                .map(Duration::from_secs),
            compression: JsonlCompression::parse(files.compression.as_deref())?,
        })
    }
}

enum LineWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl LineWriter {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self {
            LineWriter::Plain(writer) => writer.write_all(bytes),
            LineWriter::Gzip(writer) => writer.write_all(bytes),
        }
    }

    fn finish(self) -> io::Result<()> {
        match self {
            LineWriter::Plain(mut writer) => writer.flush(),
            LineWriter::Gzip(writer) => writer.finish()?.flush(),
        }
    }
}

struct OpenFile {
    name: String,
    writer: LineWriter,
    opened_at: Instant,
    size: u64,
    lines: u64,
}

/// Writes events to rotating `.jsonl` files in a directory.
pub struct JsonlSink {
    options: JsonlOptions,
    label: String,
    file_index: u64,
    current: Option<OpenFile>,
}

impl JsonlSink {
    /// Creates the output directory. Files are opened lazily on first publish.
    pub fn new(options: JsonlOptions) -> io::Result<Self> {
        fs::create_dir_all(&options.dir)?;
        let label = format!("file://{}", options.dir.display());
        Ok(Self {
            options,
            label,
            file_index: 0,
            current: None,
        })
    }

    fn needs_rotation(&self, incoming: u64) -> bool {
        let Some(file) = &self.current else {
            return false;
        };
        if file.size > 0 && file.size + incoming > self.options.target_size_bytes {
            return true;
        }
        matches!(self.options.max_age, Some(max_age) if file.opened_at.elapsed() >= max_age)
    }

    fn close_current(&mut self) -> io::Result<()> {
        match self.current.take() {
            Some(file) => file.writer.finish(),
            None => Ok(()),
        }
    }

    fn open_next(&mut self) -> io::Result<OpenFile> {
        self.file_index += 1;
        let (name, file) = open_file(
            &self.options.dir,
            self.file_index,
            self.options.compression,
        )?;
        let writer = match self.options.compression {
            JsonlCompression::None => LineWriter::Plain(BufWriter::new(file)),
            JsonlCompression::Gzip => LineWriter::Gzip(GzEncoder::new(
                BufWriter::new(file),
                Compression::default(),
            )),
        };
        Ok(OpenFile {
            name,
            writer,
            opened_at: Instant::now(),
            size: 0,
            lines: 0,
        })
    }
}

impl EventSink for JsonlSink {
    fn publish(&mut self, payload: &[u8]) -> Result<String, PublishError> {
        let incoming = payload.len() as u64 + 1;
        if self.needs_rotation(incoming) {
            self.close_current()?;
        }
        // A file whose write fails is dropped; the next publish opens a fresh one.
        let mut file = match self.current.take() {
            Some(file) => file,
            None => self.open_next()?,
        };

        file.writer.write_all(payload)?;
        file.writer.write_all(b"\n")?;
        file.size += incoming;
        file.lines += 1;
        let message_id = format!("{}:{}", file.name, file.lines);
        self.current = Some(file);
        Ok(message_id)
    }

    /// Finishes the current file; the next publish starts a new one.
    fn flush(&mut self) -> Result<(), PublishError> {
        self.close_current()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        let _ = self.close_current();
    }
}

fn open_file(dir: &Path, index: u64, compression: JsonlCompression) -> io::Result<(String, File)> {
    let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
    let name = format!("events-{stamp}-{index:06}.{}", compression.extension());
    let file = File::create(dir.join(&name))?;
    Ok((name, file))
}
