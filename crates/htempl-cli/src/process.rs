/*
 * process.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Processing of source files into output files
 */

//! Mapping source documents to output files and rendering them.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use htempl::{CompileOptions, FileSystemLoader, Htempl};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Settings for a processing run
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Directory outputs are written below
    pub dest: PathBuf,
    /// Directory walked for source files
    pub src: Option<PathBuf>,
    /// Extension identifying source files
    pub src_suffix: String,
    /// Extension of generated files
    pub dest_suffix: String,
    pub options: CompileOptions,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            dest: PathBuf::from("."),
            src: None,
            src_suffix: "htempl".to_string(),
            dest_suffix: "html".to_string(),
            options: CompileOptions::default(),
        }
    }
}

pub struct Processor {
    config: ProcessConfig,
}

impl Processor {
    pub fn new(config: ProcessConfig) -> Self {
        Self { config }
    }

    /// Render every source file below the configured source directory.
    ///
    /// Stops at the first failing file.
    pub fn process_src_dir(&self) -> Result<()> {
        let Some(src) = &self.config.src else {
            return Ok(());
        };
        for entry in WalkDir::new(src).sort_by_file_name() {
            let entry = entry.with_context(|| format!("{}", src.display()))?;
            let path = entry.path();
            debug!("considering {}", path.display());
            if entry.file_type().is_file() && self.is_source(path) {
                self.process_file(path)?;
            }
        }
        Ok(())
    }

    fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext == self.config.src_suffix.as_str())
    }

    /// Render one source file to its destination.
    ///
    /// The destination is created before rendering, so a render error
    /// leaves a truncated file behind.
    pub fn process_file(&self, path: &Path) -> Result<PathBuf> {
        info!("working on {}", path.display());
        let source_id = path.to_string_lossy();
        let doc = Htempl::load(&source_id, &FileSystemLoader, &self.config.options)
            .with_context(|| format!("{}", path.display()))?;

        let dest = destination_path(
            path,
            self.config.src.as_deref(),
            &self.config.dest,
            &self.config.dest_suffix,
        );
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("{}: creating {}", path.display(), parent.display()))?;
        }
        let file = File::create(&dest)
            .with_context(|| format!("{}: creating {}", path.display(), dest.display()))?;
        let mut out = BufWriter::new(file);
        doc.render_to(&mut out)
            .with_context(|| format!("{}", path.display()))?;
        out.flush()
            .with_context(|| format!("{}: writing {}", path.display(), dest.display()))?;
        debug!("wrote {}", dest.display());
        Ok(dest)
    }
}

/// Compute where the output for `source` goes.
///
/// The `src` prefix is dropped when `source` lies below it, root and `.`
/// components are dropped, and the extension becomes `dest_suffix`.
pub fn destination_path(source: &Path, src: Option<&Path>, dest: &Path, dest_suffix: &str) -> PathBuf {
    let relative = src
        .and_then(|src| source.strip_prefix(src).ok())
        .unwrap_or(source);
    let relative: PathBuf = relative
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
        .collect();
    dest.join(relative).with_extension(dest_suffix)
}
