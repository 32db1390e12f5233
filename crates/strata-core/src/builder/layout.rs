//! Where generated code lives: packages and file paths.

use serde::{Deserialize, Serialize};

use crate::domain::naming;
use crate::ir::{Dialect, Package};

/// Generator settings that shape the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Go module path of the generated backend.
    pub module_path: String,
    /// Directory holding the Go packages, relative to the output root.
    pub backend_dir: String,
    /// Directory holding the TypeScript SDK, relative to the output root.
    pub sdk_dir: String,
    pub emit_sdk: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            module_path: "example.com/app".to_string(),
            backend_dir: "internal".to_string(),
            sdk_dir: "sdk".to_string(),
            emit_sdk: true,
        }
    }
}

/// Go packages of the generated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoPackage {
    Entities,
    Repository,
    Usecase,
    GormRepo,
    HttpApi,
}

impl GoPackage {
    /// Directory below the backend dir.
    pub const fn dir(&self) -> &'static str {
        match self {
            Self::Entities => "entities",
            Self::Repository => "repository",
            Self::Usecase => "usecase",
            Self::GormRepo => "adapter/gormrepo",
            Self::HttpApi => "httpapi",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    config: BuildConfig,
}

impl Layout {
    pub fn new(config: BuildConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    fn backend_root(&self) -> String {
        self.config.backend_dir.trim_matches('/').to_string()
    }

    pub fn package(&self, pkg: GoPackage) -> Package {
        Package::new(format!(
            "{}/{}/{}",
            self.config.module_path.trim_end_matches('/'),
            self.backend_root(),
            pkg.dir()
        ))
    }

    /// `internal/<dir>/<stem>.go`.
    pub fn go_file(&self, pkg: GoPackage, stem: &str) -> String {
        format!("{}/{}/{}.go", self.backend_root(), pkg.dir(), stem)
    }

    /// Go file stem for an entity or use case name.
    pub fn go_stem(name: &str) -> String {
        naming::to_snake_case(name)
    }

    /// TypeScript module of one SDK file, `./invoice-line`.
    pub fn sdk_package(&self, stem: &str) -> Package {
        Package::new(format!("./{stem}"))
    }

    pub fn sdk_file(&self, stem: &str) -> String {
        format!("{}/{}.ts", self.config.sdk_dir.trim_matches('/'), stem)
    }

    pub fn sdk_stem(name: &str) -> String {
        naming::to_kebab_case(name)
    }

    pub fn emit_sdk(&self) -> bool {
        self.config.emit_sdk
    }

    pub fn dialect_of(path: &str) -> Dialect {
        if path.ends_with(".ts") {
            Dialect::TypeScript
        } else {
            Dialect::Go
        }
    }
}
