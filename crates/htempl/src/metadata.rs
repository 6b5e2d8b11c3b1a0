/*
 * metadata.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Metadata resolution across included files.
//!
//! Four top-level keys are reserved and never reach the rendering context:
//!
//! - `include`: a metadata file merged into this one
//! - `includes`: a list of metadata files merged into this one
//! - `template`: a template fragment compiled alongside the body
//! - `templates`: a list of template fragments compiled alongside the body
//!
//! Includes are resolved breadth-first. Each included file may itself name
//! further includes and fragments; those are queued behind everything
//! already pending. Merging follows [`merge_metadata`], so the queue order
//! decides which value wins on a key collision.

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, trace};
use yaml_rust2::YamlLoader;

use crate::error::{HtemplError, Result};
use crate::loader::SourceLoader;
use crate::value::{MetaMap, MetaValue, merge_metadata};

/// Reserved key naming one metadata file.
pub const INCLUDE_KEY: &str = "include";
/// Reserved key naming a list of metadata files.
pub const INCLUDES_KEY: &str = "includes";
/// Reserved key naming one template fragment.
pub const TEMPLATE_KEY: &str = "template";
/// Reserved key naming a list of template fragments.
pub const TEMPLATES_KEY: &str = "templates";

/// One decoded metadata source with its reserved keys pulled out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataBlock {
    /// Remaining, non-reserved keys.
    pub vars: MetaMap,
    /// Metadata files to include, `include` first.
    pub includes: Vec<String>,
    /// Template fragments to compile, `template` first.
    pub templates: Vec<String>,
}

impl MetadataBlock {
    /// Decode a YAML metadata segment.
    ///
    /// An empty segment decodes to an empty block. The top level must
    /// otherwise be a mapping.
    pub fn decode(source_id: &str, text: &str) -> Result<Self> {
        let docs = YamlLoader::load_from_str(text)
            .map_err(|e| HtemplError::decode(source_id, e.to_string()))?;

        let vars = match docs.into_iter().next() {
            None => MetaMap::new(),
            Some(yaml) => match MetaValue::from_yaml(yaml)
                .map_err(|message| HtemplError::decode(source_id, message))?
            {
                MetaValue::Map(map) => map,
                MetaValue::Null => MetaMap::new(),
                other => {
                    return Err(HtemplError::decode(
                        source_id,
                        format!("expected a mapping at top level, found a {}", other.kind_name()),
                    ));
                }
            },
        };

        Self::from_vars(source_id, vars)
    }

    /// Split the reserved keys off an already decoded mapping.
    pub fn from_vars(source_id: &str, mut vars: MetaMap) -> Result<Self> {
        let mut includes = Vec::new();
        let mut templates = Vec::new();
        take_reference(source_id, &mut vars, INCLUDE_KEY, &mut includes)?;
        take_references(source_id, &mut vars, INCLUDES_KEY, &mut includes)?;
        take_reference(source_id, &mut vars, TEMPLATE_KEY, &mut templates)?;
        take_references(source_id, &mut vars, TEMPLATES_KEY, &mut templates)?;
        Ok(Self {
            vars,
            includes,
            templates,
        })
    }
}

fn take_reference(
    source_id: &str,
    vars: &mut MetaMap,
    key: &'static str,
    out: &mut Vec<String>,
) -> Result<()> {
    match vars.remove(key) {
        None | Some(MetaValue::Null) => Ok(()),
        Some(MetaValue::String(id)) => {
            out.push(id);
            Ok(())
        }
        Some(other) => Err(HtemplError::InvalidReference {
            source_id: source_id.to_string(),
            key,
            message: format!("must be a file name, found a {}", other.kind_name()),
        }),
    }
}

fn take_references(
    source_id: &str,
    vars: &mut MetaMap,
    key: &'static str,
    out: &mut Vec<String>,
) -> Result<()> {
    match vars.remove(key) {
        None | Some(MetaValue::Null) => Ok(()),
        Some(MetaValue::List(items)) => {
            for item in items {
                match item {
                    MetaValue::String(id) => out.push(id),
                    other => {
                        return Err(HtemplError::InvalidReference {
                            source_id: source_id.to_string(),
                            key,
                            message: format!(
                                "must list file names, found a {}",
                                other.kind_name()
                            ),
                        });
                    }
                }
            }
            Ok(())
        }
        Some(other) => Err(HtemplError::InvalidReference {
            source_id: source_id.to_string(),
            key,
            message: format!("must be a list of file names, found a {}", other.kind_name()),
        }),
    }
}

/// The outcome of resolving a document's metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMetadata {
    /// Merged metadata with every reserved key removed.
    pub vars: MetaMap,
    /// Template fragments in discovery order, duplicates kept.
    pub templates: Vec<String>,
}

/// A queued include together with the identities of the sources that led
/// to it.
struct PendingInclude {
    reference: String,
    ancestry: Rc<Vec<String>>,
}

/// Resolves metadata segments and their includes through a [`SourceLoader`].
pub struct MetadataResolver<'a> {
    loader: &'a dyn SourceLoader,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(loader: &'a dyn SourceLoader) -> Self {
        Self { loader }
    }

    /// Resolve the metadata segment of the document `source_id`.
    ///
    /// A document without a segment resolves to empty metadata.
    pub fn resolve(&self, source_id: &str, segment: Option<&str>) -> Result<ResolvedMetadata> {
        let Some(segment) = segment else {
            return Ok(ResolvedMetadata::default());
        };

        let root = MetadataBlock::decode(source_id, segment)?;
        let root_ancestry = Rc::new(vec![self.loader.identity(source_id)]);

        let mut vars = root.vars;
        let mut templates = root.templates;
        let mut queue: VecDeque<PendingInclude> = root
            .includes
            .into_iter()
            .map(|reference| PendingInclude {
                reference,
                ancestry: Rc::clone(&root_ancestry),
            })
            .collect();

        while let Some(pending) = queue.pop_front() {
            let identity = self.loader.identity(&pending.reference);
            if pending.ancestry.contains(&identity) {
                let mut chain: Vec<String> = pending.ancestry.as_ref().clone();
                chain.push(identity);
                return Err(HtemplError::IncludeCycle { chain });
            }

            debug!(include = %pending.reference, "resolving metadata include");
            let text = self
                .loader
                .read_to_string(&pending.reference)
                .map_err(|e| HtemplError::io(pending.reference.as_str(), e))?;
            let block = MetadataBlock::decode(&pending.reference, &text)?;

            let mut ancestry = pending.ancestry.as_ref().clone();
            ancestry.push(identity);
            let ancestry = Rc::new(ancestry);
            queue.extend(block.includes.into_iter().map(|reference| PendingInclude {
                reference,
                ancestry: Rc::clone(&ancestry),
            }));
            templates.extend(block.templates);

            trace!(
                include = %pending.reference,
                keys = block.vars.len(),
                "merging included metadata"
            );
            merge_metadata(&mut vars, block.vars);
        }

        Ok(ResolvedMetadata { vars, templates })
    }
}
