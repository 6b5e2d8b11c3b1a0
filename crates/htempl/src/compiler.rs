/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiling a document body and its fragments into one template set.

use std::io::Write;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use tracing::debug;

use crate::error::{HtemplError, Result};
use crate::helpers::HelperRegistry;
use crate::loader::SourceLoader;

/// How interpolated values are escaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscapeMode {
    /// Escape every interpolation for HTML.
    #[default]
    Html,
    /// Write values as they are.
    None,
}

impl EscapeMode {
    fn auto_escape(self) -> AutoEscape {
        match self {
            EscapeMode::Html => AutoEscape::Html,
            EscapeMode::None => AutoEscape::None,
        }
    }
}

/// What happens when a template reads a missing field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndefinedMode {
    /// Printing or reading through a missing field is a render error.
    /// Testing it in a condition is allowed and is false.
    #[default]
    Strict,
    /// Missing fields render as empty and are falsy.
    Lenient,
}

impl UndefinedMode {
    fn behavior(self) -> UndefinedBehavior {
        match self {
            UndefinedMode::Strict => UndefinedBehavior::SemiStrict,
            UndefinedMode::Lenient => UndefinedBehavior::Lenient,
        }
    }
}

/// Options applied to every template set.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub helpers: HelperRegistry,
    pub escape: EscapeMode,
    pub undefined: UndefinedMode,
}

/// A document body compiled together with its fragments.
///
/// Fragments are members named by their identifier; the body is the member
/// named after the document. All members share the same helpers.
pub struct TemplateSet {
    env: Environment<'static>,
    name: String,
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TemplateSet {
    /// Create an empty set whose main member will be `name`.
    pub fn new(name: impl Into<String>, options: &CompileOptions) -> Self {
        let mut env = Environment::new();
        let escape = options.escape;
        env.set_auto_escape_callback(move |_| escape.auto_escape());
        env.set_undefined_behavior(options.undefined.behavior());
        env.set_keep_trailing_newline(true);
        options.helpers.install(&mut env);
        Self {
            env,
            name: name.into(),
        }
    }

    /// Compile `body` as the main member after loading every fragment.
    ///
    /// Fragments are added in order. A fragment listed twice is compiled
    /// twice and the later copy replaces the earlier one.
    pub fn compile(
        name: &str,
        body: String,
        fragments: &[String],
        loader: &dyn SourceLoader,
        options: &CompileOptions,
    ) -> Result<Self> {
        let mut set = Self::new(name, options);
        for fragment in fragments {
            let source = loader
                .read_to_string(fragment)
                .map_err(|e| HtemplError::io(fragment.as_str(), e))?;
            set.add_fragment(fragment, source)?;
        }
        set.add_body(body)?;
        Ok(set)
    }

    /// Add a named fragment.
    pub fn add_fragment(&mut self, name: &str, source: String) -> Result<()> {
        debug!(fragment = %name, "compiling template fragment");
        self.add(name.to_string(), source)
    }

    /// Add the main member.
    pub fn add_body(&mut self, source: String) -> Result<()> {
        debug!(template = %self.name, "compiling document body");
        self.add(self.name.clone(), source)
    }

    fn add(&mut self, name: String, source: String) -> Result<()> {
        self.env
            .add_template_owned(name.clone(), source)
            .map_err(|source| HtemplError::Compile { name, source })
    }

    /// Name of the main member.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a member of that name was compiled.
    pub fn contains(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Render the main member against `context`, streaming into `out`.
    ///
    /// On error, whatever was already written stays in `out`.
    pub fn execute<S: Serialize, W: Write>(&self, context: &S, out: W) -> Result<()> {
        let render_error = |source| HtemplError::Render {
            name: self.name.clone(),
            source,
        };
        let template = self.env.get_template(&self.name).map_err(render_error)?;
        template.render_to_write(context, out).map_err(render_error)?;
        Ok(())
    }
}
