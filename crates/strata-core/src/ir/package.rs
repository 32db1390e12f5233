//! Packages, dialects and the render context.

use std::fmt;

use serde::Serialize;

/// Target language of an emitted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Go,
    TypeScript,
}

impl Dialect {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::TypeScript => "typescript",
        }
    }

    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::TypeScript => "ts",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol namespace: a Go import path or a TypeScript module specifier.
///
/// Two packages are the same namespace when their paths are equal; the
/// alias is only a spelling preference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Package {
    path: String,
    alias: Option<String>,
}

impl Package {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    pub fn with_alias(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Last path segment: `github.com/acme/shop/internal/entities` →
    /// `entities`, `./client` → `client`.
    pub fn name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|s| !s.is_empty() && *s != ".")
            .unwrap_or(&self.path)
    }

    /// Identifier used to qualify symbols from this package.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.name())
    }

    pub fn same_namespace(&self, other: &Package) -> bool {
        self.path == other.path
    }

    /// Go standard library: the first segment has no dot.
    pub fn is_std(&self) -> bool {
        !self.path.starts_with('.')
            && self
                .path
                .split('/')
                .next()
                .is_some_and(|first| !first.contains('.'))
    }

    /// Join a child segment onto this path.
    pub fn child(&self, segment: &str) -> Package {
        Package::new(format!("{}/{}", self.path.trim_end_matches('/'), segment))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{alias} {:?}", self.path),
            None => write!(f, "{:?}", self.path),
        }
    }
}

/// What a renderer knows about the file it is writing into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    pub package: Package,
    pub dialect: Dialect,
}

impl RenderContext {
    pub fn new(package: Package, dialect: Dialect) -> Self {
        Self { package, dialect }
    }

    pub fn go(package: Package) -> Self {
        Self::new(package, Dialect::Go)
    }

    pub fn typescript(package: Package) -> Self {
        Self::new(package, Dialect::TypeScript)
    }

    /// `pkg.Name`, or just `Name` inside the same package.
    pub fn qualify(&self, package: &Package, name: &str) -> String {
        if self.package.same_namespace(package) {
            name.to_string()
        } else {
            format!("{}.{}", package.qualifier(), name)
        }
    }
}

/// Well-known standard packages.
pub mod std_packages {
    use super::Package;

    pub fn context() -> Package {
        Package::new("context")
    }

    pub fn errors() -> Package {
        Package::new("errors")
    }

    pub fn fmt() -> Package {
        Package::new("fmt")
    }

    pub fn time() -> Package {
        Package::new("time")
    }

    pub fn net_http() -> Package {
        Package::new("net/http")
    }

    pub fn encoding_json() -> Package {
        Package::new("encoding/json")
    }

    pub fn strconv() -> Package {
        Package::new("strconv")
    }

    pub fn gorm() -> Package {
        Package::new("gorm.io/gorm")
    }

    pub fn uuid() -> Package {
        Package::new("github.com/google/uuid")
    }

    /// Imported as `validator`; the path's last segment is `v10`.
    pub fn validator() -> Package {
        Package::with_alias("github.com/go-playground/validator/v10", "validator")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_name_is_last_segment() {
        assert_eq!(Package::new("github.com/acme/shop/internal/entities").name(), "entities");
        assert_eq!(Package::new("./client").name(), "client");
        assert_eq!(Package::new("context").name(), "context");
    }

    #[test]
    fn alias_overrides_qualifier() {
        let pkg = std_packages::validator();
        assert_eq!(pkg.name(), "v10");
        assert_eq!(pkg.qualifier(), "validator");
    }

    #[test]
    fn std_detection() {
        assert!(Package::new("net/http").is_std());
        assert!(!Package::new("gorm.io/gorm").is_std());
        assert!(!Package::new("./client").is_std());
    }

    #[test]
    fn qualify_elides_own_package() {
        let entities = Package::new("example.com/shop/internal/entities");
        let ctx = RenderContext::go(entities.clone());
        assert_eq!(ctx.qualify(&entities, "Invoice"), "Invoice");

        let other = RenderContext::go(Package::new("example.com/shop/internal/usecase"));
        assert_eq!(other.qualify(&entities, "Invoice"), "entities.Invoice");
    }
}
