/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A document resolved into merged metadata and a compiled template set.

use std::io::{BufRead, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::compiler::{CompileOptions, TemplateSet};
use crate::error::{HtemplError, Result};
use crate::header::split_header;
use crate::loader::{FileSystemLoader, SourceLoader};
use crate::metadata::MetadataResolver;
use crate::value::MetaMap;

/// A template combined with the variables of its leading metadata block.
#[derive(Debug)]
pub struct Htempl {
    vars: MetaMap,
    templates: TemplateSet,
}

impl Htempl {
    /// Load a document from the file system with the default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source_id = path.as_ref().to_string_lossy().into_owned();
        Self::load(&source_id, &FileSystemLoader, &CompileOptions::default())
    }

    /// Load a document through `loader`.
    pub fn load(
        source_id: &str,
        loader: &dyn SourceLoader,
        options: &CompileOptions,
    ) -> Result<Self> {
        let reader = loader
            .open(source_id)
            .map_err(|e| HtemplError::io(source_id, e))?;
        Self::from_reader(source_id, reader, loader, options)
    }

    /// Build a document from an open stream.
    ///
    /// `source_id` names the document in errors and is the name of its
    /// template. Includes and fragments are opened through `loader`.
    pub fn from_reader<R: BufRead>(
        source_id: &str,
        reader: R,
        loader: &dyn SourceLoader,
        options: &CompileOptions,
    ) -> Result<Self> {
        let split = split_header(source_id, reader)?;

        let segment = split
            .metadata
            .map(String::from_utf8)
            .transpose()
            .map_err(|e| HtemplError::decode(source_id, e.to_string()))?;
        let resolved = MetadataResolver::new(loader).resolve(source_id, segment.as_deref())?;
        debug!(
            document = %source_id,
            vars = resolved.vars.len(),
            fragments = resolved.templates.len(),
            "resolved metadata"
        );

        let mut body = String::new();
        let mut reader = split.body;
        reader
            .read_to_string(&mut body)
            .map_err(|e| HtemplError::io(source_id, e))?;

        let templates =
            TemplateSet::compile(source_id, body, &resolved.templates, loader, options)?;
        Ok(Self {
            vars: resolved.vars,
            templates,
        })
    }

    /// The merged metadata, without reserved keys.
    pub fn vars(&self) -> &MetaMap {
        &self.vars
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Render the document into `out`.
    ///
    /// After an error `out` may hold a truncated result.
    pub fn render_to<W: Write>(&self, out: W) -> Result<()> {
        self.templates.execute(&self.vars, out)
    }

    pub fn render_to_string(&self) -> Result<String> {
        let mut out = Vec::new();
        self.render_to(&mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
