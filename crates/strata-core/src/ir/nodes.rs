//! IR declaration nodes.
//!
//! Nodes refer to each other only through store ids and [`Type`]s, so a
//! node can be copied and specialized without touching anything else.

use std::{fmt, sync::Arc};

use crate::emit::writer::CodeWriter;
use crate::ir::{
    package::{Dialect, Package, RenderContext},
    store::FunctionId,
    types::Type,
};

// ── Records ─────────────────────────────────────────────────────────────────

/// One struct tag entry, `json:"id,omitempty"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn json(name: &str, omit_empty: bool) -> Self {
        if omit_empty {
            Self::new("json", format!("{name},omitempty"))
        } else {
            Self::new("json", name)
        }
    }
}

/// Render a tag list as the raw backquoted Go literal.
pub fn render_tags(tags: &[Tag]) -> Option<String> {
    if tags.is_empty() {
        return None;
    }
    let body: Vec<String> = tags
        .iter()
        .map(|t| format!("{}:{:?}", t.key, t.value))
        .collect();
    Some(format!("`{}`", body.join(" ")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub tags: Vec<Tag>,
    pub doc: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            tags: Vec::new(),
            doc: None,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn json(mut self, name: &str, omit_empty: bool) -> Self {
        self.tags.push(Tag::json(name, omit_empty));
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn tag_value(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Property name on the wire: the `json` tag name, if any.
    pub fn wire_name(&self) -> Option<&str> {
        self.tag_value("json")
            .map(|v| v.split(',').next().unwrap_or(v))
    }

    pub fn omits_empty(&self) -> bool {
        self.tag_value("json")
            .is_some_and(|v| v.split(',').skip(1).any(|o| o == "omitempty"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Struct {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<Field>,
    /// Methods are rendered right after the struct.
    pub methods: Vec<FunctionId>,
}

impl Struct {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

// ── Signatures ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<Param>,
    pub results: Vec<Type>,
}

impl MethodSignature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    pub fn result(mut self, ty: Type) -> Self {
        self.results.push(ty);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub doc: Option<String>,
    pub methods: Vec<MethodSignature>,
}

impl Interface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Generic parameter, `F ~string`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: String,
    pub ty: Type,
}

// ── Bodies ──────────────────────────────────────────────────────────────────

/// Text produced by a body, plus the packages it referenced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub imports: Vec<Package>,
}

impl Rendered {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            imports: Vec::new(),
        }
    }
}

type BodyFn = dyn Fn(&RenderContext) -> Rendered + Send + Sync;

/// Late-bound body. Imports are discovered when the body is rendered for a
/// concrete file, not when the node is built.
#[derive(Clone)]
pub struct Body(Arc<BodyFn>);

impl Body {
    pub fn new(f: impl Fn(&RenderContext) -> Rendered + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Body written with a [`Snippet`].
    pub fn snippet(f: impl Fn(&mut Snippet<'_>) + Send + Sync + 'static) -> Self {
        Self::new(move |ctx| {
            let mut s = Snippet::new(ctx);
            f(&mut s);
            s.finish()
        })
    }

    /// Body with fixed text and no imports.
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Rendered::text(text.clone()))
    }

    pub fn render(&self, ctx: &RenderContext) -> Rendered {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Body(..)")
    }
}

/// Bodies compare by identity: two copies of one template body are equal
/// until one of them is replaced.
impl PartialEq for Body {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Body {}

/// Writer handed to body closures. Every symbol or type spelled through it
/// is qualified for the file being rendered and recorded as an import.
pub struct Snippet<'a> {
    ctx: &'a RenderContext,
    imports: Vec<Package>,
    out: CodeWriter,
}

impl<'a> Snippet<'a> {
    pub fn new(ctx: &'a RenderContext) -> Self {
        let out = match ctx.dialect {
            Dialect::Go => CodeWriter::go(),
            Dialect::TypeScript => CodeWriter::typescript(),
        };
        Self {
            ctx,
            imports: Vec::new(),
            out,
        }
    }

    pub fn context(&self) -> &RenderContext {
        self.ctx
    }

    pub fn import(&mut self, package: &Package) {
        self.imports.push(package.clone());
    }

    /// `pkg.Name`, importing `pkg`.
    pub fn sym(&mut self, package: &Package, name: &str) -> String {
        self.import(package);
        self.ctx.qualify(package, name)
    }

    /// A rendered type, importing whatever it references.
    pub fn ty(&mut self, ty: &Type) -> String {
        self.imports.extend(ty.packages(self.ctx.dialect));
        ty.render(self.ctx)
    }

    pub fn line(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.out.line(line);
        self
    }

    /// Write a line and indent what follows.
    pub fn open(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.out.line(line);
        self.out.indent();
        self
    }

    /// Dedent and write a closing line.
    pub fn close(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.out.dedent();
        self.out.line(line);
        self
    }

    /// Dedent, write a line and indent again: `} else {`.
    pub fn reopen(&mut self, line: impl AsRef<str>) -> &mut Self {
        self.out.dedent();
        self.out.line(line);
        self.out.indent();
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.blank();
        self
    }

    pub fn finish(self) -> Rendered {
        Rendered {
            text: self.out.finish(),
            imports: self.imports,
        }
    }
}

// ── Functions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub doc: Option<String>,
    pub receiver: Option<Receiver>,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub results: Vec<Type>,
    pub body: Option<Body>,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            receiver: None,
            type_params: Vec::new(),
            params: Vec::new(),
            results: Vec::new(),
            body: None,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn receiver(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.receiver = Some(Receiver {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn type_param(mut self, name: impl Into<String>, constraint: Option<&str>) -> Self {
        self.type_params.push(TypeParam {
            name: name.into(),
            constraint: constraint.map(str::to_string),
        });
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.params.push(Param::new(name, ty));
        self
    }

    pub fn result(mut self, ty: Type) -> Self {
        self.results.push(ty);
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// Copy this function under a new name and adjust the copy.
    ///
    /// The original, and any other copy, is left untouched.
    pub fn specialize(&self, name: impl Into<String>, adjust: impl FnOnce(&mut Function)) -> Function {
        let mut copy = self.clone();
        copy.name = name.into();
        adjust(&mut copy);
        copy
    }

    /// Interface view of this function.
    pub fn signature(&self) -> MethodSignature {
        MethodSignature {
            name: self.name.clone(),
            doc: self.doc.clone(),
            params: self.params.clone(),
            results: self.results.clone(),
        }
    }
}

// ── Named types and values ──────────────────────────────────────────────────

/// `type Name Target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    pub name: String,
    pub doc: Option<String>,
    pub target: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: String,
    pub value: String,
}

/// A string-valued enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    pub name: String,
    pub doc: Option<String>,
    pub underlying: Type,
    pub variants: Vec<EnumVariant>,
}

impl Enum {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            underlying: Type::string(),
            variants: Vec::new(),
        }
    }

    pub fn variant(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variants.push(EnumVariant {
            name: name.into(),
            value: value.into(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Const {
    pub name: String,
    pub doc: Option<String>,
    pub ty: Option<Type>,
    /// Literal source text.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Var {
    pub name: String,
    pub doc: Option<String>,
    pub ty: Option<Type>,
    pub value: Body,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::package::std_packages;

    #[test]
    fn tags_render_as_go_literal() {
        let field = Field::new("CustomerID", Type::string())
            .json("customerId", false)
            .tag("validate", "required");
        assert_eq!(
            render_tags(&field.tags).unwrap(),
            "`json:\"customerId\" validate:\"required\"`"
        );
        assert_eq!(field.wire_name(), Some("customerId"));
        assert!(!field.omits_empty());
    }

    #[test]
    fn omitempty_is_detected() {
        let field = Field::new("Note", Type::pointer(Type::string())).json("note", true);
        assert_eq!(field.wire_name(), Some("note"));
        assert!(field.omits_empty());
    }

    #[test]
    fn specialize_leaves_the_template_alone() {
        let template = Function::new("By")
            .param("value", Type::any())
            .body(Body::fixed("return nil"));
        let copy = template.specialize("GetInvoiceBy", |f| {
            f.body = Some(Body::fixed("return 1"));
        });

        assert_eq!(template.name, "By");
        assert_eq!(copy.name, "GetInvoiceBy");
        assert_ne!(template.body, copy.body);

        let ctx = RenderContext::go(Package::new("example.com/app/repository"));
        assert_eq!(template.body.as_ref().unwrap().render(&ctx).text, "return nil");
        assert_eq!(copy.body.as_ref().unwrap().render(&ctx).text, "return 1");
    }

    #[test]
    fn snippet_records_imports_as_it_renders() {
        let body = Body::snippet(|s| {
            let not_found = s.sym(&std_packages::errors(), "New");
            s.line(format!("return {not_found}(\"missing\")"));
        });
        let rendered = body.render(&RenderContext::go(Package::new("example.com/app/repository")));
        assert_eq!(rendered.text, "return errors.New(\"missing\")");
        assert_eq!(rendered.imports, vec![std_packages::errors()]);
    }
}
