//! Filesystem-based declaration loader.
//!
//! A declaration is one TOML or JSON file, or a directory of them merged in
//! path order:
//!
//! ```text
//! domain/
//! ├── project.toml      ← [project] module = "github.com/acme/shop"
//! ├── billing.toml      ← [[entities]], [[relations]], ...
//! └── catalog/
//!     └── products.json
//! ```
//!
//! Files with other extensions are ignored when walking a directory and
//! rejected when named directly.

use std::fs;
use std::path::{Path, PathBuf};

use strata_core::application::ApplicationError;
use strata_core::domain::DomainDeclaration;
use strata_core::error::StrataResult;
use tracing::{debug, instrument};
use walkdir::WalkDir;

/// Declaration file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationFormat {
    Toml,
    Json,
}

impl DeclarationFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeclarationLoader {
    path: PathBuf,
}

fn load_error(path: &Path, reason: impl Into<String>) -> ApplicationError {
    ApplicationError::DeclarationLoad {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

impl DeclarationLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> StrataResult<DomainDeclaration> {
        if self.path.is_dir() {
            return self.load_dir();
        }
        if !self.path.exists() {
            return Err(load_error(&self.path, "no such file or directory").into());
        }
        let format = DeclarationFormat::from_path(&self.path)
            .ok_or_else(|| load_error(&self.path, "expected a .toml or .json file"))?;
        Self::load_file(&self.path, format)
    }

    fn load_dir(&self) -> StrataResult<DomainDeclaration> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path).sort_by_file_name() {
            let entry = entry.map_err(|e| load_error(&self.path, e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(format) = DeclarationFormat::from_path(entry.path()) {
                files.push((entry.into_path(), format));
            }
        }
        if files.is_empty() {
            return Err(load_error(&self.path, "the directory holds no .toml or .json files").into());
        }

        let mut merged = DomainDeclaration::default();
        for (path, format) in files {
            merged.merge(Self::load_file(&path, format)?);
        }
        debug!(entities = merged.entities.len(), "Merged declaration directory");
        Ok(merged)
    }

    fn load_file(path: &Path, format: DeclarationFormat) -> StrataResult<DomainDeclaration> {
        let text = fs::read_to_string(path).map_err(|e| load_error(path, e.to_string()))?;
        let declaration = match format {
            DeclarationFormat::Toml => {
                toml::from_str(&text).map_err(|e| load_error(path, e.to_string()))?
            }
            DeclarationFormat::Json => {
                serde_json::from_str(&text).map_err(|e| load_error(path, e.to_string()))?
            }
        };
        debug!(path = %path.display(), "Loaded declaration file");
        Ok(declaration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::error::StrataError;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_a_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "shop.toml",
            r#"
[[entities]]
name = "tag"
fields = [{ name = "label", type = "string", rules = ["required"] }]
"#,
        );
        let decl = DeclarationLoader::new(path).load().unwrap();
        assert_eq!(decl.entities[0].name, "tag");
        assert_eq!(decl.entities[0].fields[0].rules.len(), 1);
    }

    #[test]
    fn loads_a_json_file() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "shop.json",
            r#"{ "entities": [{ "name": "tag", "activable": true }], "cruds": [{ "entity": "tag", "getActive": true }] }"#,
        );
        let decl = DeclarationLoader::new(path).load().unwrap();
        assert!(decl.entities[0].activable);
        assert!(decl.cruds[0].get_active);
    }

    #[test]
    fn directories_merge_in_path_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.toml", "[[entities]]\nname = \"second\"\n");
        write(dir.path(), "a.toml", "[[entities]]\nname = \"first\"\n");
        write(dir.path(), "nested/c.json", r#"{ "entities": [{ "name": "third" }] }"#);
        write(dir.path(), "project.toml", "[project]\nmodule = \"github.com/acme/shop\"\n");
        write(dir.path(), "README.md", "ignored");

        let decl = DeclarationLoader::new(dir.path()).load().unwrap();
        let names: Vec<&str> = decl.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
        assert_eq!(decl.project.module.as_deref(), Some("github.com/acme/shop"));
    }

    #[test]
    fn malformed_files_name_their_path() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "broken.toml", "[[entities]\nname = ");
        let err = DeclarationLoader::new(&path).load().unwrap_err();
        match err {
            StrataError::Application(ApplicationError::DeclarationLoad { path: p, .. }) => {
                assert_eq!(p, path);
            }
            other => panic!("expected DeclarationLoad, got {other:?}"),
        }
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "shop.yaml", "entities: []");
        assert!(DeclarationLoader::new(path).load().is_err());
    }

    #[test]
    fn empty_directories_are_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(DeclarationLoader::new(dir.path()).load().is_err());
    }
}
