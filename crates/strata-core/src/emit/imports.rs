//! Per-file import resolution.

use std::collections::BTreeMap;

use crate::ir::{Dialect, Package};

/// One line of the import block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine {
    pub path: String,
    /// Set only when it differs from the package's own name.
    pub alias: Option<String>,
    pub std: bool,
}

/// Tracks the packages one file references.
///
/// Created fresh for every file. Recording the file's own package is a
/// no-op, and recording a path twice keeps the last alias seen.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    own: Package,
    packages: BTreeMap<String, Package>,
}

impl ImportResolver {
    pub fn new(own: Package) -> Self {
        Self {
            own,
            packages: BTreeMap::new(),
        }
    }

    pub fn import_package(&mut self, package: &Package) {
        if package.same_namespace(&self.own) {
            return;
        }
        self.packages
            .insert(package.path().to_string(), package.clone());
    }

    pub fn import_all<'a>(&mut self, packages: impl IntoIterator<Item = &'a Package>) {
        for package in packages {
            self.import_package(package);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn lines(&self) -> Vec<ImportLine> {
        self.packages
            .values()
            .map(|p| ImportLine {
                path: p.path().to_string(),
                alias: p.alias().filter(|a| *a != p.name()).map(str::to_string),
                std: p.is_std(),
            })
            .collect()
    }

    /// The import block, or an empty string when nothing is imported.
    pub fn render(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::Go => self.render_go(),
            Dialect::TypeScript => self.render_typescript(),
        }
    }

    fn render_go(&self) -> String {
        let lines = self.lines();
        let spell = |l: &ImportLine| match &l.alias {
            Some(alias) => format!("{alias} {:?}", l.path),
            None => format!("{:?}", l.path),
        };
        if let [only] = lines.as_slice() {
            return format!("import {}", spell(only));
        }
        if lines.is_empty() {
            return String::new();
        }

        let (std, external): (Vec<_>, Vec<_>) = lines.iter().partition(|l| l.std);
        let mut out = String::from("import (\n");
        for line in &std {
            out.push_str(&format!("\t{}\n", spell(line)));
        }
        if !std.is_empty() && !external.is_empty() {
            out.push('\n');
        }
        for line in &external {
            out.push_str(&format!("\t{}\n", spell(line)));
        }
        out.push(')');
        out
    }

    fn render_typescript(&self) -> String {
        self.packages
            .values()
            .map(|p| format!("import * as {} from '{}';", p.qualifier(), p.path()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::std_packages;

    fn usecase() -> Package {
        Package::new("example.com/shop/internal/usecase")
    }

    #[test]
    fn own_package_is_never_imported() {
        let mut imports = ImportResolver::new(usecase());
        imports.import_package(&usecase());
        assert!(imports.is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let mut imports = ImportResolver::new(usecase());
        imports.import_package(&std_packages::context());
        imports.import_package(&std_packages::context());
        assert_eq!(imports.lines().len(), 1);
    }

    #[test]
    fn alias_is_written_only_when_it_differs() {
        let mut imports = ImportResolver::new(usecase());
        imports.import_package(&std_packages::validator());
        imports.import_package(&Package::with_alias("gorm.io/gorm", "gorm"));
        let lines = imports.lines();
        // Sorted by path: the validator path comes first.
        assert_eq!(lines[0].alias.as_deref(), Some("validator"));
        assert_eq!(lines[1].alias, None);
    }

    #[test]
    fn last_alias_wins() {
        let mut imports = ImportResolver::new(usecase());
        imports.import_package(&Package::with_alias("example.com/x/v2", "first"));
        imports.import_package(&Package::with_alias("example.com/x/v2", "second"));
        assert_eq!(imports.lines()[0].alias.as_deref(), Some("second"));
    }

    #[test]
    fn go_block_groups_std_first() {
        let mut imports = ImportResolver::new(usecase());
        imports.import_package(&std_packages::gorm());
        imports.import_package(&std_packages::errors());
        imports.import_package(&std_packages::context());
        assert_eq!(
            imports.render(Dialect::Go),
            "import (\n\t\"context\"\n\t\"errors\"\n\n\t\"gorm.io/gorm\"\n)"
        );
    }

    #[test]
    fn single_go_import_uses_short_form() {
        let mut imports = ImportResolver::new(usecase());
        imports.import_package(&std_packages::time());
        assert_eq!(imports.render(Dialect::Go), "import \"time\"");
    }

    #[test]
    fn typescript_uses_namespace_imports() {
        let mut imports = ImportResolver::new(Package::new("./invoice"));
        imports.import_package(&Package::new("./entities"));
        imports.import_package(&Package::new("./client"));
        assert_eq!(
            imports.render(Dialect::TypeScript),
            "import * as client from './client';\nimport * as entities from './entities';"
        );
    }
}
