use std::{
    borrow::Cow,
    collections::HashMap,
    path::{Path, PathBuf},
};

use branchbuild_core::BuildError;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::hide;

/// A `key=value` properties file that keeps its original lines, so that setting a property
/// rewrites only that property's line.
///
/// Lines are kept as raw bytes with their own terminators: other lines are written back byte
/// for byte, whatever their line ending or encoding (UTF-8 or ISO-8859-1).
///
/// The checksum of the file as last read or written is kept; a write fails when the file on
/// disk no longer has that checksum.
#[derive(Debug, Clone)]
pub struct DotProperties {
    file: PathBuf,
    parent: Option<Box<DotProperties>>,
    valid: bool,
    properties: HashMap<String, String>,
    /// Raw lines including their terminators
    lines: Vec<Vec<u8>>,
    checksum: String,
}

pub fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Split a raw line into its content and its terminator (`\n`, `\r\n` or nothing)
fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    let content_len = line
        .strip_suffix(b"\r\n")
        .or_else(|| line.strip_suffix(b"\n"))
        .map_or(line.len(), <[u8]>::len);
    line.split_at(content_len)
}

/// UTF-8 when valid, otherwise ISO-8859-1
fn decode(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

fn parse_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
        return None;
    }
    let split = trimmed.find(['=', ':'])?;
    Some((trimmed[..split].trim(), trimmed[split + 1..].trim()))
}

impl DotProperties {
    /// Read `file`; a missing file gives an invalid, empty instance.
    ///
    /// # Errors
    /// Returns `PropertiesUnreadable` if the file exists but cannot be read.
    pub fn load(file: &Path) -> Result<Self, BuildError> {
        let mut props = Self {
            file: file.to_path_buf(),
            parent: None,
            valid: file.is_file(),
            properties: HashMap::new(),
            lines: Vec::new(),
            checksum: String::new(),
        };
        if props.valid {
            let bytes = std::fs::read(file).map_err(|source| BuildError::PropertiesUnreadable {
                file: file.to_path_buf(),
                source,
            })?;
            props.absorb(&bytes);
        }
        Ok(props)
    }

    /// Properties not found here are looked up in `parent`
    pub fn with_parent(mut self, parent: DotProperties) -> Self {
        self.parent = Some(Box::new(parent));
        self
    }

    fn absorb(&mut self, bytes: &[u8]) {
        self.checksum = checksum(bytes);
        self.lines = bytes
            .split_inclusive(|&b| b == b'\n')
            .map(<[u8]>::to_vec)
            .collect();
        self.properties = self
            .lines
            .iter()
            .filter_map(|line| {
                let text = decode(split_terminator(line).0);
                parse_line(&text).map(|(k, v)| (k.to_string(), v.to_string()))
            })
            .collect();
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let value = self
            .properties
            .get(name)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(name)));
        debug!(
            name,
            value = %value.as_deref().map(hide).unwrap_or_default(),
            file = %self.file.display(),
            "getProp"
        );
        value
    }

    pub fn get_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    /// Set `name` to `value` in the file. Only lines defining `name` change; a missing key is
    /// appended. A no-op on an invalid (absent) file.
    ///
    /// # Errors
    /// `PropertiesModified` when the file changed on disk since it was read,
    /// `PropertiesUnreadable` when it cannot be read or written.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), BuildError> {
        if !self.valid {
            info!(name, file = %self.file.display(), "property not written: no properties file");
            return Ok(());
        }
        let unreadable = |source| BuildError::PropertiesUnreadable {
            file: self.file.clone(),
            source,
        };
        let on_disk = std::fs::read(&self.file).map_err(unreadable)?;
        if checksum(&on_disk) != self.checksum {
            return Err(BuildError::PropertiesModified {
                file: self.file.clone(),
            });
        }

        let replacement = format!("{name}={value}");
        let mut found = false;
        for line in self.lines.iter_mut() {
            let (content, terminator) = split_terminator(line);
            if parse_line(&decode(content)).is_some_and(|(k, _)| k == name) {
                let mut replaced = replacement.as_bytes().to_vec();
                replaced.extend_from_slice(terminator);
                *line = replaced;
                found = true;
            }
        }
        if !found {
            let eol = self
                .lines
                .iter()
                .map(|line| split_terminator(line).1)
                .find(|terminator| !terminator.is_empty())
                .unwrap_or(&b"\n"[..])
                .to_vec();
            let mut appended = replacement.into_bytes();
            match self.lines.last_mut() {
                // keep the file's choice of ending with or without a terminator
                Some(last) if split_terminator(last.as_slice()).1.is_empty() => last.extend_from_slice(&eol),
                _ => appended.extend_from_slice(&eol),
            }
            self.lines.push(appended);
        }

        let content = self.lines.concat();
        std::fs::write(&self.file, &content).map_err(|source| {
            BuildError::PropertiesUnreadable {
                file: self.file.clone(),
                source,
            }
        })?;
        self.absorb(&content);
        Ok(())
    }
}
