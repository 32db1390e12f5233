//! Generate Service - main application orchestrator.
//!
//! 1. Build the IR from the declaration
//! 2. Render every file (nothing is written unless all render)
//! 3. Write the tree, rolling back a freshly created root on failure
//! 4. Run the formatters, one call per dialect

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::application::ApplicationError;
use crate::application::ports::{CodeFormatter, Filesystem};
use crate::builder::{BuildConfig, BuiltDomain, DomainBuilder};
use crate::domain::DomainDeclaration;
use crate::emit::RenderedFile;
use crate::error::StrataResult;
use crate::ir::Dialect;

/// Rendered output, paths relative to the output root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedTree {
    pub files: Vec<RenderedFile>,
}

impl GeneratedTree {
    pub fn get(&self, path: &str) -> Option<&RenderedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    /// Relative paths of one dialect's files, in tree order.
    pub fn paths_of(&self, dialect: Dialect) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|f| f.dialect == dialect)
            .map(|f| PathBuf::from(&f.path))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Counts shown after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub entities: usize,
    pub relations: usize,
    pub repositories: usize,
    pub usecases: usize,
    pub custom_usecases: usize,
    pub routes: usize,
    pub go_files: usize,
    pub typescript_files: usize,
}

impl GenerationReport {
    fn new(built: &BuiltDomain, tree: &GeneratedTree) -> Self {
        let count = |d: Dialect| tree.files.iter().filter(|f| f.dialect == d).count();
        Self {
            entities: built.entity_models().count(),
            relations: built.registry().relations().count(),
            repositories: built.repository_models().count(),
            usecases: built.usecase_models().count(),
            custom_usecases: built.custom().map_or(0, |c| c.methods.len()),
            routes: built.routes().len(),
            go_files: count(Dialect::Go),
            typescript_files: count(Dialect::TypeScript),
        }
    }

    pub fn files(&self) -> usize {
        self.go_files + self.typescript_files
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationPlan {
    pub tree: GeneratedTree,
    pub report: GenerationReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Write into an existing output root.
    pub force: bool,
    /// Run the formatters after writing.
    pub format: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            force: false,
            format: true,
        }
    }
}

pub struct GenerateService {
    filesystem: Box<dyn Filesystem>,
    formatter: Box<dyn CodeFormatter>,
}

impl GenerateService {
    pub fn new(filesystem: Box<dyn Filesystem>, formatter: Box<dyn CodeFormatter>) -> Self {
        Self {
            filesystem,
            formatter,
        }
    }

    /// Build and render without touching the filesystem.
    #[instrument(skip_all, fields(module = %config.module_path))]
    pub fn plan(&self, declaration: DomainDeclaration, config: BuildConfig) -> StrataResult<GenerationPlan> {
        let built = DomainBuilder::build(config, declaration)?;
        let tree = GeneratedTree {
            files: built.render()?,
        };
        let report = GenerationReport::new(&built, &tree);
        info!(files = tree.len(), routes = report.routes, "Generation planned");
        Ok(GenerationPlan { tree, report })
    }

    /// Plan, write and format.
    #[instrument(skip_all, fields(output = %output.display(), force = options.force))]
    pub fn generate(
        &self,
        declaration: DomainDeclaration,
        config: BuildConfig,
        output: &Path,
        options: GenerateOptions,
    ) -> StrataResult<GenerationPlan> {
        let plan = self.plan(declaration, config)?;

        let existed = self.filesystem.exists(output);
        if existed && !options.force {
            return Err(ApplicationError::OutputExists {
                path: output.to_path_buf(),
            }
            .into());
        }

        if let Err(e) = self.write_tree(output, &plan.tree) {
            if existed {
                warn!("Write failed inside an existing directory, leaving it in place");
            } else {
                warn!("Write failed, attempting rollback");
                self.rollback(output);
            }
            return Err(e);
        }
        info!(files = plan.tree.len(), "Generated tree written");

        if options.format {
            for dialect in [Dialect::Go, Dialect::TypeScript] {
                let files = plan.tree.paths_of(dialect);
                if files.is_empty() {
                    continue;
                }
                self.formatter.format(output, &files, dialect)?;
            }
        }
        Ok(plan)
    }

    fn write_tree(&self, root: &Path, tree: &GeneratedTree) -> StrataResult<()> {
        self.filesystem.create_dir_all(root)?;
        for file in &tree.files {
            let path = root.join(&file.path);
            if let Some(parent) = path.parent() {
                self.filesystem.create_dir_all(parent)?;
            }
            self.filesystem.write_file(&path, &file.contents)?;
        }
        Ok(())
    }

    /// Best-effort rollback on failure.
    fn rollback(&self, root: &Path) {
        if let Err(e) = self.filesystem.remove_dir_all(root) {
            warn!(error = %e, path = %root.display(), "Rollback failed");
        } else {
            info!("Rollback successful");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{MockCodeFormatter, MockFilesystem};
    use crate::domain::{CrudDeclaration, EntityDeclaration, FieldDeclaration, RepositoryDeclaration};
    use crate::error::StrataError;

    fn declaration() -> DomainDeclaration {
        DomainDeclaration {
            entities: vec![EntityDeclaration::new("tag").field(FieldDeclaration::new("label", "string"))],
            repositories: vec![RepositoryDeclaration::new("tag")],
            cruds: vec![CrudDeclaration::all("tag")],
            ..DomainDeclaration::default()
        }
    }

    fn quiet_formatter() -> Box<MockCodeFormatter> {
        let mut formatter = MockCodeFormatter::new();
        formatter.expect_format().never();
        Box::new(formatter)
    }

    #[test]
    fn plan_counts_what_was_built() {
        let service = GenerateService::new(Box::new(MockFilesystem::new()), quiet_formatter());
        let plan = service.plan(declaration(), BuildConfig::default()).unwrap();
        assert_eq!(plan.report.entities, 1);
        assert_eq!(plan.report.usecases, 1);
        assert_eq!(plan.report.routes, 5);
        assert_eq!(plan.report.files(), plan.tree.len());
        assert!(plan.tree.get("internal/entities/tag.go").is_some());
        assert!(plan.tree.get("sdk/tag.ts").is_some());
    }

    #[test]
    fn existing_output_is_refused_without_force() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(true);
        fs.expect_write_file().never();
        let service = GenerateService::new(Box::new(fs), quiet_formatter());

        let err = service
            .generate(declaration(), BuildConfig::default(), Path::new("/out"), GenerateOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::Application(ApplicationError::OutputExists { .. })
        ));
    }

    #[test]
    fn failed_write_rolls_back_a_fresh_root() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().returning(|path, _| {
            Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "disk full".into(),
            }
            .into())
        });
        fs.expect_remove_dir_all()
            .withf(|path| path == Path::new("/out"))
            .times(1)
            .returning(|_| Ok(()));
        let service = GenerateService::new(Box::new(fs), quiet_formatter());

        let result = service.generate(
            declaration(),
            BuildConfig::default(),
            Path::new("/out"),
            GenerateOptions::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn forced_writes_never_remove_the_existing_root() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(true);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().returning(|path, _| {
            Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "read-only".into(),
            }
            .into())
        });
        fs.expect_remove_dir_all().never();
        let service = GenerateService::new(Box::new(fs), quiet_formatter());

        let options = GenerateOptions { force: true, format: true };
        assert!(service
            .generate(declaration(), BuildConfig::default(), Path::new("/out"), options)
            .is_err());
    }

    #[test]
    fn formatters_run_once_per_dialect() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().return_const(false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write_file().returning(|_, _| Ok(()));
        let mut formatter = MockCodeFormatter::new();
        formatter
            .expect_format()
            .withf(|_, files, dialect| {
                files.iter().all(|f| {
                    f.extension().and_then(|e| e.to_str()) == Some(dialect.extension())
                })
            })
            .times(2)
            .returning(|_, _, _| Ok(()));
        let service = GenerateService::new(Box::new(fs), Box::new(formatter));

        let plan = service
            .generate(declaration(), BuildConfig::default(), Path::new("/out"), GenerateOptions::default())
            .unwrap();
        assert!(plan.report.go_files > 0);
    }

    #[test]
    fn build_errors_write_nothing() {
        let mut fs = MockFilesystem::new();
        fs.expect_exists().never();
        fs.expect_write_file().never();
        let service = GenerateService::new(Box::new(fs), quiet_formatter());

        let mut decl = declaration();
        decl.cruds[0].entity = "ghost".into();
        let err = service
            .generate(decl, BuildConfig::default(), Path::new("/out"), GenerateOptions::default())
            .unwrap_err();
        assert!(matches!(err, StrataError::Build(_)));
    }
}
