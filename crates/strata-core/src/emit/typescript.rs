//! TypeScript emitter.
//!
//! Handles the subset the SDK needs: records become interfaces, enums become
//! string unions, free functions become exported async functions.
//! Interfaces, variables and struct methods have no rule here.

use crate::domain::naming;
use crate::emit::{EmitError, Emitter, GENERATED_HEADER, ImportResolver, spell};
use crate::emit::writer::CodeWriter;
use crate::ir::{
    Const, Dialect, EmittableFile, Enum, Function, IrStore, NodeKind, NodeRef, RenderContext,
    Struct, Type, TypeAlias,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptEmitter;

fn unhandled(kind: NodeKind, name: &str) -> EmitError {
    EmitError::UnhandledNodeKind {
        dialect: Dialect::TypeScript,
        kind,
        name: name.to_string(),
    }
}

impl Emitter for TypeScriptEmitter {
    fn dialect(&self) -> Dialect {
        Dialect::TypeScript
    }

    fn render_node(
        &self,
        store: &IrStore,
        node: NodeRef,
        ctx: &RenderContext,
        imports: &mut ImportResolver,
    ) -> Result<String, EmitError> {
        match node {
            NodeRef::Struct(id) => render_struct(&store.structs[id], ctx, imports),
            NodeRef::Enum(id) => Ok(render_enum(&store.enums[id])),
            NodeRef::Alias(id) => Ok(render_alias(&store.aliases[id], ctx, imports)),
            NodeRef::Const(id) => Ok(render_const(&store.consts[id], ctx, imports)),
            NodeRef::Function(id) => render_function(&store.functions[id], ctx, imports),
            other => Err(unhandled(other.kind(), store.name_of(other))),
        }
    }

    fn assemble(&self, file: &EmittableFile, imports: &ImportResolver, blocks: &[String]) -> String {
        let mut out = format!("// {GENERATED_HEADER}\n");
        if let Some(doc) = &file.doc {
            out.push_str(&doc_comment(doc));
            out.push('\n');
        }
        let import_block = imports.render(Dialect::TypeScript);
        if !import_block.is_empty() {
            out.push('\n');
            out.push_str(&import_block);
            out.push('\n');
        }
        for block in blocks {
            out.push('\n');
            out.push_str(block);
            out.push('\n');
        }
        out
    }
}

fn doc_comment(doc: &str) -> String {
    let lines: Vec<&str> = doc.lines().collect();
    if let [only] = lines.as_slice() {
        return format!("/** {only} */");
    }
    let mut out = String::from("/**\n");
    for line in lines {
        if line.is_empty() {
            out.push_str(" *\n");
        } else {
            out.push_str(&format!(" * {line}\n"));
        }
    }
    out.push_str(" */");
    out
}

fn push_doc(w: &mut CodeWriter, doc: Option<&str>) {
    if let Some(doc) = doc {
        w.line(doc_comment(doc));
    }
}

fn render_struct(
    node: &Struct,
    ctx: &RenderContext,
    imports: &mut ImportResolver,
) -> Result<String, EmitError> {
    if !node.methods.is_empty() {
        return Err(unhandled(NodeKind::Method, &node.name));
    }

    let mut w = CodeWriter::typescript();
    push_doc(&mut w, node.doc.as_deref());
    w.line(format!("export interface {} {{", node.name));
    w.indent();
    for field in &node.fields {
        let property = match field.wire_name() {
            Some("-") => continue,
            Some(name) => name.to_string(),
            None => naming::to_camel_case(&field.name),
        };
        let optional = field.omits_empty() || field.ty.is_pointer();
        push_doc(&mut w, field.doc.as_deref());
        w.line(format!(
            "{property}{}: {};",
            if optional { "?" } else { "" },
            spell(&field.ty, ctx, imports)
        ));
    }
    w.dedent();
    w.line("}");
    Ok(w.finish())
}

fn render_enum(node: &Enum) -> String {
    let mut w = CodeWriter::typescript();
    push_doc(&mut w, node.doc.as_deref());
    let union = if node.variants.is_empty() {
        "never".to_string()
    } else {
        node.variants
            .iter()
            .map(|v| format!("'{}'", v.value))
            .collect::<Vec<_>>()
            .join(" | ")
    };
    w.line(format!("export type {} = {union};", node.name));
    w.finish()
}

fn render_alias(node: &TypeAlias, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let target = match &node.target {
        Type::Func(func) => {
            for part in func.params.iter().chain(&func.results) {
                imports.import_all(&part.packages(Dialect::TypeScript));
            }
            func.render_literal(ctx)
        }
        other => spell(other, ctx, imports),
    };
    let mut w = CodeWriter::typescript();
    push_doc(&mut w, node.doc.as_deref());
    w.line(format!("export type {} = {target};", node.name));
    w.finish()
}

fn render_const(node: &Const, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let mut w = CodeWriter::typescript();
    push_doc(&mut w, node.doc.as_deref());
    match &node.ty {
        Some(ty) => w.line(format!(
            "export const {}: {} = {};",
            node.name,
            spell(ty, ctx, imports),
            node.value
        )),
        None => w.line(format!("export const {} = {};", node.name, node.value)),
    }
    w.finish()
}

fn render_function(
    node: &Function,
    ctx: &RenderContext,
    imports: &mut ImportResolver,
) -> Result<String, EmitError> {
    if node.receiver.is_some() {
        return Err(unhandled(NodeKind::Method, &node.name));
    }
    let body = node
        .body
        .as_ref()
        .ok_or_else(|| EmitError::MissingBody {
            name: node.name.clone(),
        })?
        .render(ctx);
    imports.import_all(&body.imports);

    let type_params = if node.type_params.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = node
            .type_params
            .iter()
            .map(|p| match &p.constraint {
                Some(c) => format!("{} extends {c}", p.name),
                None => p.name.clone(),
            })
            .collect();
        format!("<{}>", list.join(", "))
    };
    let params: Vec<String> = node
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, spell(&p.ty, ctx, imports)))
        .collect();
    let result = match node.results.first() {
        Some(ty) => spell(ty, ctx, imports),
        None => "void".to_string(),
    };

    let mut w = CodeWriter::typescript();
    push_doc(&mut w, node.doc.as_deref());
    w.line(format!(
        "export async function {}{type_params}({}): Promise<{result}> {{",
        node.name,
        params.join(", ")
    ));
    if !body.text.is_empty() {
        w.indent();
        w.line(&body.text);
        w.dedent();
    }
    w.line("}");
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::render_file;
    use crate::ir::{Body, Field, FileSet, Interface, Package};

    fn render_one(store: &IrStore, node: NodeRef) -> Result<String, EmitError> {
        let mut files = FileSet::new();
        files.push("sdk/invoice.ts", &Package::new("./invoice"), Dialect::TypeScript, node);
        render_file(store, files.get("sdk/invoice.ts").unwrap()).map(|f| f.contents)
    }

    #[test]
    fn struct_becomes_interface_keyed_by_json_names() {
        let mut store = IrStore::new();
        let entities = Package::new("./entities");
        let id = store.add_struct(
            Struct::new("GetInvoiceResponse")
                .field(
                    Field::new("Invoice", Type::pointer(Type::symbol(&entities, "Invoice")))
                        .json("invoice", false),
                )
                .field(Field::new("Internal", Type::string()).json("-", false))
                .field(Field::new("Total", Type::Primitive(crate::ir::Primitive::Float64)).json("total", true)),
        );
        let text = render_one(&store, NodeRef::Struct(id)).unwrap();
        assert!(text.contains("import * as entities from './entities';"));
        assert!(text.contains("export interface GetInvoiceResponse {"));
        assert!(text.contains("  invoice?: entities.Invoice | null;"));
        assert!(text.contains("  total?: number;"));
        assert!(!text.contains("Internal"));
    }

    #[test]
    fn enum_becomes_union() {
        let mut store = IrStore::new();
        let mut node = Enum::new("InvoiceOrderField");
        node.variant("InvoiceOrderFieldID", "id");
        node.variant("InvoiceOrderFieldNumber", "number");
        let id = store.add_enum(node);
        assert!(render_one(&store, NodeRef::Enum(id))
            .unwrap()
            .contains("export type InvoiceOrderField = 'id' | 'number';"));
    }

    #[test]
    fn free_function_is_async() {
        let mut store = IrStore::new();
        let id = store.add_function(
            Function::new("getInvoice")
                .param("id", Type::string())
                .result(Type::string())
                .body(Body::fixed("return id;")),
        );
        assert!(render_one(&store, NodeRef::Function(id)).unwrap().contains(
            "export async function getInvoice(id: string): Promise<string> {\n  return id;\n}"
        ));
    }

    #[test]
    fn interfaces_have_no_rule() {
        let mut store = IrStore::new();
        let id = store.add_interface(Interface::new("InvoiceRepository"));
        let err = render_one(&store, NodeRef::Interface(id)).unwrap_err();
        assert_eq!(
            err,
            EmitError::UnhandledNodeKind {
                dialect: Dialect::TypeScript,
                kind: NodeKind::Interface,
                name: "InvoiceRepository".into(),
            }
        );
    }
}
