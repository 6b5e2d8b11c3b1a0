/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Templates combined with YAML metadata in one file.
//!
//! A document starts with an optional YAML block delimited by a `---` line
//! and a `...` line. The rest of the file is a template rendered with the
//! metadata as its context:
//!
//! ```text
//! ---
//! title: Hello
//! include: site.yaml
//! templates: [layout.html]
//! ...
//! {% extends "layout.html" %}
//! {% block content %}<h1>{{ title }}</h1>{% endblock %}
//! ```
//!
//! # Reserved keys
//!
//! The values of these keys are file names and are removed from the
//! rendering context:
//!
//! - `include`, `includes`: YAML files merged into the metadata. Their own
//!   reserved keys are honored too. When two files set the same key the
//!   later one wins, unless both values are sequences, which concatenate.
//! - `template`, `templates`: template fragments compiled into the same
//!   template set as the body, each named by its file name.
//!
//! # Helpers
//!
//! See [`helpers`] for the functions callable from templates (`map`,
//! `withDefault`, `md2html`, `safehtml` and friends).
//!
//! # Example
//!
//! ```ignore
//! use htempl::Htempl;
//!
//! let doc = Htempl::open("index.htempl")?;
//! let mut out = std::fs::File::create("index.html")?;
//! doc.render_to(&mut out)?;
//! ```

pub mod compiler;
pub mod document;
pub mod error;
pub mod header;
pub mod helpers;
pub mod loader;
pub mod metadata;
pub mod value;

// Re-export main types at crate root
pub use compiler::{CompileOptions, EscapeMode, TemplateSet, UndefinedMode};
pub use document::Htempl;
pub use error::{HtemplError, Result};
pub use header::{SplitDocument, split_header};
pub use helpers::{DEFAULT_HELPERS, HelperFn, HelperRegistry};
pub use loader::{FileSystemLoader, MemoryLoader, SourceLoader};
pub use metadata::{MetadataBlock, MetadataResolver, ResolvedMetadata};
pub use value::{MetaMap, MetaValue, merge_metadata};
