/*
 * loader.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Loading of documents, metadata includes and template fragments.
//!
//! Sources are named by plain string identifiers taken verbatim from the
//! metadata. The loader decides what an identifier points to.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};

/// Trait for opening sources by identifier.
pub trait SourceLoader {
    /// Open a source as a forward-only byte stream.
    fn open(&self, id: &str) -> io::Result<Box<dyn BufRead + '_>>;

    /// Read a whole source as UTF-8 text.
    fn read_to_string(&self, id: &str) -> io::Result<String> {
        let mut text = String::new();
        self.open(id)?.read_to_string(&mut text)?;
        Ok(text)
    }

    /// A key that is equal for identifiers naming the same source.
    ///
    /// Used to detect include cycles.
    fn identity(&self, id: &str) -> String {
        id.to_string()
    }
}

/// Loader that reads files relative to the process working directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemLoader;

impl SourceLoader for FileSystemLoader {
    fn open(&self, id: &str) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(id)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn read_to_string(&self, id: &str) -> io::Result<String> {
        std::fs::read_to_string(id)
    }

    fn identity(&self, id: &str) -> String {
        std::fs::canonicalize(id).map_or_else(|_| id.to_string(), |p| p.display().to_string())
    }
}

/// Loader that serves sources from an in-memory map.
///
/// Useful for testing and for callers that bundle their sources.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: HashMap<String, String>,
}

impl MemoryLoader {
    /// Create a new empty memory loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source under the given identifier.
    pub fn add(&mut self, id: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.sources.insert(id.into(), content.into());
        self
    }

    /// Create a loader with the given sources.
    pub fn with_sources(
        sources: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut loader = Self::new();
        for (id, content) in sources {
            loader.add(id, content);
        }
        loader
    }

    fn get(&self, id: &str) -> io::Result<&str> {
        self.sources.get(id).map(String::as_str).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no source named '{id}'"))
        })
    }
}

impl SourceLoader for MemoryLoader {
    fn open(&self, id: &str) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.get(id)?.as_bytes())))
    }

    fn read_to_string(&self, id: &str) -> io::Result<String> {
        self.get(id).map(str::to_string)
    }
}
