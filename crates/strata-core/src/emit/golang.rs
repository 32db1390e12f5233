use crate::emit::{EmitError, Emitter, GENERATED_HEADER, ImportResolver, spell};
use crate::emit::writer::CodeWriter;
use crate::ir::nodes::render_tags;
use crate::ir::{
    Const, Dialect, EmittableFile, Enum, Function, Interface, IrStore, MethodSignature, NodeRef,
    Param, RenderContext, Struct, Type, TypeAlias, Var,
};

/// Go source emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoEmitter;

impl Emitter for GoEmitter {
    fn dialect(&self) -> Dialect {
        Dialect::Go
    }

    fn render_node(
        &self,
        store: &IrStore,
        node: NodeRef,
        ctx: &RenderContext,
        imports: &mut ImportResolver,
    ) -> Result<String, EmitError> {
        match node {
            NodeRef::Const(id) => Ok(render_const(&store.consts[id], ctx, imports)),
            NodeRef::Var(id) => Ok(render_var(&store.vars[id], ctx, imports)),
            NodeRef::Struct(id) => render_struct(store, &store.structs[id], ctx, imports),
            NodeRef::Interface(id) => Ok(render_interface(&store.interfaces[id], ctx, imports)),
            NodeRef::Alias(id) => Ok(render_alias(&store.aliases[id], ctx, imports)),
            NodeRef::Enum(id) => Ok(render_enum(&store.enums[id], ctx, imports)),
            NodeRef::Function(id) => render_function(&store.functions[id], ctx, imports),
        }
    }

    fn assemble(&self, file: &EmittableFile, imports: &ImportResolver, blocks: &[String]) -> String {
        let mut out = format!("// {GENERATED_HEADER}\n\n");
        if let Some(doc) = &file.doc {
            out.push_str(&comment(doc));
            out.push('\n');
        }
        out.push_str(&format!("package {}\n", file.package.name()));

        let import_block = imports.render(Dialect::Go);
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

fn comment(doc: &str) -> String {
    doc.lines()
        .map(|l| if l.is_empty() { "//".to_string() } else { format!("// {l}") })
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_doc(w: &mut CodeWriter, doc: Option<&str>) {
    if let Some(doc) = doc {
        w.line(comment(doc));
    }
}

fn render_const(node: &Const, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let mut w = CodeWriter::go();
    push_doc(&mut w, node.doc.as_deref());
    match &node.ty {
        Some(ty) => w.line(format!("const {} {} = {}", node.name, spell(ty, ctx, imports), node.value)),
        None => w.line(format!("const {} = {}", node.name, node.value)),
    }
    w.finish()
}

fn render_var(node: &Var, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let value = node.value.render(ctx);
    imports.import_all(&value.imports);

    let mut w = CodeWriter::go();
    push_doc(&mut w, node.doc.as_deref());
    match &node.ty {
        Some(ty) => w.line(format!("var {} {} = {}", node.name, spell(ty, ctx, imports), value.text)),
        None => w.line(format!("var {} = {}", node.name, value.text)),
    }
    w.finish()
}

fn render_struct(
    store: &IrStore,
    node: &Struct,
    ctx: &RenderContext,
    imports: &mut ImportResolver,
) -> Result<String, EmitError> {
    let mut w = CodeWriter::go();
    push_doc(&mut w, node.doc.as_deref());

    if node.fields.is_empty() {
        w.line(format!("type {} struct{{}}", node.name));
    } else {
        w.line(format!("type {} struct {{", node.name));
        w.indent();

        let rows: Vec<(String, String, Option<String>)> = node
            .fields
            .iter()
            .map(|f| (f.name.clone(), spell(&f.ty, ctx, imports), render_tags(&f.tags)))
            .collect();
        let name_width = rows.iter().map(|r| r.0.len()).max().unwrap_or(0);
        let type_width = rows
            .iter()
            .filter(|r| r.2.is_some())
            .map(|r| r.1.len())
            .max()
            .unwrap_or(0);

        for (field, (name, ty, tags)) in node.fields.iter().zip(rows) {
            push_doc(&mut w, field.doc.as_deref());
            let line = match tags {
                Some(tags) => format!("{name:<name_width$} {ty:<type_width$} {tags}"),
                None => format!("{name:<name_width$} {ty}"),
            };
            w.line(line.trim_end());
        }
        w.dedent();
        w.line("}");
    }

    for method in &node.methods {
        w.blank();
        w.line(render_function(&store.functions[*method], ctx, imports)?);
    }
    Ok(w.finish())
}

fn params(list: &[Param], ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    list.iter()
        .map(|p| format!("{} {}", p.name, spell(&p.ty, ctx, imports)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn results(list: &[Type], ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let rendered: Vec<String> = list.iter().map(|t| spell(t, ctx, imports)).collect();
    match rendered.len() {
        0 => String::new(),
        1 => format!(" {}", rendered[0]),
        _ => format!(" ({})", rendered.join(", ")),
    }
}

fn render_signature(sig: &MethodSignature, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    format!(
        "{}({}){}",
        sig.name,
        params(&sig.params, ctx, imports),
        results(&sig.results, ctx, imports)
    )
}

fn render_interface(node: &Interface, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let mut w = CodeWriter::go();
    push_doc(&mut w, node.doc.as_deref());
    w.line(format!("type {} interface {{", node.name));
    w.indent();
    for method in &node.methods {
        push_doc(&mut w, method.doc.as_deref());
        w.line(render_signature(method, ctx, imports));
    }
    w.dedent();
    w.line("}");
    w.finish()
}

fn render_alias(node: &TypeAlias, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let target = match &node.target {
        Type::Func(func) => {
            for part in func.params.iter().chain(&func.results) {
                imports.import_all(&part.packages(Dialect::Go));
            }
            func.render_literal(ctx)
        }
        other => spell(other, ctx, imports),
    };
    let mut w = CodeWriter::go();
    push_doc(&mut w, node.doc.as_deref());
    w.line(format!("type {} {}", node.name, target));
    w.finish()
}

fn render_enum(node: &Enum, ctx: &RenderContext, imports: &mut ImportResolver) -> String {
    let mut w = CodeWriter::go();
    push_doc(&mut w, node.doc.as_deref());
    w.line(format!("type {} {}", node.name, spell(&node.underlying, ctx, imports)));
    if node.variants.is_empty() {
        return w.finish();
    }

    w.blank();
    w.line("const (");
    w.indent();
    let width = node.variants.iter().map(|v| v.name.len()).max().unwrap_or(0);
    for variant in &node.variants {
        w.line(format!("{:<width$} {} = {:?}", variant.name, node.name, variant.value));
    }
    w.dedent();
    w.line(")");
    w.finish()
}

fn render_function(
    node: &Function,
    ctx: &RenderContext,
    imports: &mut ImportResolver,
) -> Result<String, EmitError> {
    let body = node
        .body
        .as_ref()
        .ok_or_else(|| EmitError::MissingBody {
            name: node.name.clone(),
        })?
        .render(ctx);
    imports.import_all(&body.imports);

    let receiver = node
        .receiver
        .as_ref()
        .map(|r| {
            let ty = spell(&r.ty, ctx, imports);
            if r.name.is_empty() {
                format!("({ty}) ")
            } else {
                format!("({} {ty}) ", r.name)
            }
        })
        .unwrap_or_default();
    let type_params = if node.type_params.is_empty() {
        String::new()
    } else {
        let list: Vec<String> = node
            .type_params
            .iter()
            .map(|p| match &p.constraint {
                Some(c) => format!("{} {c}", p.name),
                None => format!("{} any", p.name),
            })
            .collect();
        format!("[{}]", list.join(", "))
    };

    let mut w = CodeWriter::go();
    push_doc(&mut w, node.doc.as_deref());
    w.line(format!(
        "func {receiver}{}{type_params}({}){} {{",
        node.name,
        params(&node.params, ctx, imports),
        results(&node.results, ctx, imports)
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
    use crate::ir::{
        Body, Field, FileSet, FuncType, Package, std_packages,
    };

    fn repository_pkg() -> Package {
        Package::new("example.com/shop/internal/repository")
    }

    fn render_one(store: &IrStore, node: NodeRef) -> String {
        let mut files = FileSet::new();
        files.push("internal/repository/x.go", &repository_pkg(), Dialect::Go, node);
        render_file(store, files.get("internal/repository/x.go").unwrap())
            .unwrap()
            .contents
    }

    #[test]
    fn struct_fields_are_aligned_with_tags() {
        let mut store = IrStore::new();
        let id = store.add_struct(
            Struct::new("Pagination")
                .doc("Pagination bounds a list query.")
                .field(Field::new("Offset", Type::int()).json("offset", false))
                .field(Field::new("Limit", Type::int()).json("limit", false)),
        );
        let text = render_one(&store, NodeRef::Struct(id));
        assert!(text.contains(
            "// Pagination bounds a list query.\ntype Pagination struct {\n\tOffset int `json:\"offset\"`\n\tLimit  int `json:\"limit\"`\n}"
        ));
    }

    #[test]
    fn empty_struct_renders_inline() {
        let mut store = IrStore::new();
        let id = store.add_struct(Struct::new("DeleteInvoiceResponse"));
        assert!(render_one(&store, NodeRef::Struct(id)).contains("type DeleteInvoiceResponse struct{}"));
    }

    #[test]
    fn func_alias_renders_literal_and_imports_params() {
        let mut store = IrStore::new();
        let id = store.add_alias(TypeAlias {
            name: "ListInvoicesOption".into(),
            doc: None,
            target: Type::Func(FuncType {
                name: "ListInvoicesOption".into(),
                params: vec![Type::pointer(Type::symbol(&repository_pkg(), "ListInvoicesContext"))],
                results: vec![],
            }),
        });
        let text = render_one(&store, NodeRef::Alias(id));
        assert!(text.contains("type ListInvoicesOption func(*ListInvoicesContext)"));
        assert!(!text.contains("import"));
    }

    #[test]
    fn enum_renders_typed_constants() {
        let mut store = IrStore::new();
        let mut node = Enum::new("InvoiceWhereField");
        node.variant("InvoiceWhereFieldID", "id");
        node.variant("InvoiceWhereFieldCustomerID", "customer_id");
        let id = store.add_enum(node);
        let text = render_one(&store, NodeRef::Enum(id));
        assert!(text.contains("type InvoiceWhereField string"));
        assert!(text.contains("\tInvoiceWhereFieldID         InvoiceWhereField = \"id\""));
        assert!(text.contains("\tInvoiceWhereFieldCustomerID InvoiceWhereField = \"customer_id\""));
    }

    #[test]
    fn interface_lists_signatures() {
        let mut store = IrStore::new();
        let mut node = Interface::new("Transaction");
        node.methods.push(MethodSignature::new("Commit").result(Type::error()));
        node.methods.push(MethodSignature::new("Rollback").result(Type::error()));
        let id = store.add_interface(node);
        assert!(render_one(&store, NodeRef::Interface(id))
            .contains("type Transaction interface {\n\tCommit() error\n\tRollback() error\n}"));
    }

    #[test]
    fn var_value_imports_are_recorded() {
        let mut store = IrStore::new();
        let id = store.add_var(Var {
            name: "ErrNotFound".into(),
            doc: None,
            ty: None,
            value: Body::snippet(|s| {
                let new = s.sym(&std_packages::errors(), "New");
                s.line(format!("{new}(\"not found\")"));
            }),
        });
        let text = render_one(&store, NodeRef::Var(id));
        assert!(text.contains("import \"errors\""));
        assert!(text.contains("var ErrNotFound = errors.New(\"not found\")"));
    }

    #[test]
    fn generic_function_signature() {
        let mut store = IrStore::new();
        let id = store.add_function(
            Function::new("applyFilters")
                .type_param("F", Some("~string"))
                .param("by", Type::map(Type::Alias(crate::ir::TypeName::new(repository_pkg(), "F")), Type::any()))
                .body(Body::fixed("")),
        );
        assert!(render_one(&store, NodeRef::Function(id))
            .contains("func applyFilters[F ~string](by map[F]any) {\n}"));
    }
}
