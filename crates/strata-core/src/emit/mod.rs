//! Source emission.
//!
//! Rendering is a pure function of the finished IR. Each file gets its own
//! [`ImportResolver`]; node renderers record every package they spell while
//! producing text, so the import block is complete once the last node has
//! been rendered.

pub mod golang;
pub mod imports;
pub mod typescript;
pub mod writer;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::ir::{Dialect, EmittableFile, IrStore, NodeKind, NodeRef, RenderContext, Type};

pub use golang::GoEmitter;
pub use imports::{ImportLine, ImportResolver};
pub use typescript::TypeScriptEmitter;
pub use writer::CodeWriter;

/// First line of every emitted file.
pub const GENERATED_HEADER: &str = "Code generated by strata. DO NOT EDIT.";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmitError {
    #[error("The {dialect} emitter has no rule for {kind} '{name}'")]
    UnhandledNodeKind {
        dialect: Dialect,
        kind: NodeKind,
        name: String,
    },

    #[error("Function '{name}' has no body")]
    MissingBody { name: String },
}

/// Renders nodes for one dialect.
pub trait Emitter {
    fn dialect(&self) -> Dialect;

    /// Render one top-level node, recording its imports.
    fn render_node(
        &self,
        store: &IrStore,
        node: NodeRef,
        ctx: &RenderContext,
        imports: &mut ImportResolver,
    ) -> Result<String, EmitError>;

    /// Wrap rendered blocks with the header, package clause and imports.
    fn assemble(&self, file: &EmittableFile, imports: &ImportResolver, blocks: &[String]) -> String;
}

/// A file ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFile {
    pub path: String,
    pub dialect: Dialect,
    pub contents: String,
}

fn emitter_for(dialect: Dialect) -> &'static dyn Emitter {
    match dialect {
        Dialect::Go => &GoEmitter,
        Dialect::TypeScript => &TypeScriptEmitter,
    }
}

pub fn render_file(store: &IrStore, file: &EmittableFile) -> Result<RenderedFile, EmitError> {
    let emitter = emitter_for(file.dialect);
    let ctx = RenderContext::new(file.package.clone(), file.dialect);
    let mut imports = ImportResolver::new(file.package.clone());

    let blocks = file
        .nodes
        .iter()
        .map(|node| emitter.render_node(store, *node, &ctx, &mut imports))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(path = %file.path, nodes = file.nodes.len(), "Rendered file");
    Ok(RenderedFile {
        path: file.path.clone(),
        dialect: file.dialect,
        contents: emitter.assemble(file, &imports, &blocks),
    })
}

/// Render every file, stopping at the first failure.
pub fn render_all<'a>(
    store: &IrStore,
    files: impl IntoIterator<Item = &'a EmittableFile>,
) -> Result<Vec<RenderedFile>, EmitError> {
    files.into_iter().map(|f| render_file(store, f)).collect()
}

/// Render a type and record the packages it needs.
pub(crate) fn spell(ty: &Type, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    imports.import_all(&ty.packages(ctx.dialect));
    ty.render(ctx)
}
