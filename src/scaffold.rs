//! Core render pipeline orchestration.
//!
//! A [`Scaffold`] renders a template source tree into a target directory.
//! Rendering always happens into a staging temp directory first; committing
//! to the real target compares content hashes so unchanged files are never
//! rewritten, and changed files are swapped in atomically. A noop render
//! performs the same staging pass and reports the plan without touching the
//! target.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::{Config, FileAction, ManagedFile};
use crate::engine::{self, AltTemplateFuncs, EngineKind, RenderEnv, TemplateFuncs};
use crate::error::{Error, Result};
use crate::fsops;
use crate::logger::Logger;
use crate::source;

/// The rendering engine and its configuration bundle. An instance may be
/// reused across renders; every render stages into a fresh temp directory.
pub struct Scaffold {
    cfg: Config,
    kind: EngineKind,
    funcs: TemplateFuncs,
    alt_funcs: AltTemplateFuncs,
    logger: Option<Arc<dyn Logger>>,
}

impl std::fmt::Debug for Scaffold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scaffold")
            .field("cfg", &self.cfg)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Scaffold {
    /// Creates a new scaffold using the primary template engine. `funcs`
    /// are installed as globals in every template execution.
    pub fn new(mut cfg: Config, funcs: TemplateFuncs) -> Result<Self> {
        cfg.validate()?;

        Ok(Self {
            cfg,
            kind: EngineKind::Jinja,
            funcs,
            alt_funcs: Vec::new(),
            logger: None,
        })
    }

    /// Creates a new scaffold using the alternate template engine. `funcs`
    /// are registered as helpers in every template execution.
    pub fn new_alt(mut cfg: Config, funcs: AltTemplateFuncs) -> Result<Self> {
        cfg.validate()?;

        if let (Some(left), Some(right)) = (&cfg.left_delimiter, &cfg.right_delimiter) {
            if left != "{{" || right != "}}" {
                return Err(Error::Config(
                    "custom delimiters are not supported by the alternate engine".to_string(),
                ));
            }
        }

        Ok(Self {
            cfg,
            kind: EngineKind::Handlebars,
            funcs: TemplateFuncs::new(),
            alt_funcs: funcs,
            logger: None,
        })
    }

    /// Configures a logger to use; no logging is done without this.
    pub fn set_logger(&mut self, logger: impl Logger + 'static) {
        self.logger = Some(Arc::new(logger));
    }

    /// The absolute target directory this scaffold renders into.
    pub fn target_directory(&self) -> &Path {
        &self.cfg.target_directory
    }

    /// Renders all templates and commits them to the target directory,
    /// creating it as needed. Returns the plan of every managed file and
    /// the action taken, sorted by path.
    pub fn render(&self, data: &Value) -> Result<Vec<ManagedFile>> {
        let staging = tempfile::Builder::new()
            .prefix("stencil-render-")
            .tempdir()?;
        let stage = staging.path().join("target");

        self.render_to_dir(&stage, data)?;

        fs::create_dir_all(&self.cfg.target_directory)?;

        let mut plan = self.commit_tree(&stage)?;
        plan.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(plan)
    }

    /// Performs a full render into a temporary directory and compares the
    /// result against the real target, which is never modified. The plan
    /// additionally reports target files absent from the rendered output
    /// with the `remove` action.
    pub fn render_noop(&self, data: &Value) -> Result<Vec<ManagedFile>> {
        let staging = tempfile::Builder::new().prefix("stencil-noop-").tempdir()?;
        let stage = staging.path().join("target");

        self.render_to_dir(&stage, data)?;

        let mut rendered: BTreeMap<String, PathBuf> = BTreeMap::new();
        for entry in WalkDir::new(&stage).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&stage)
                .map_err(|e| Error::Input(e.to_string()))?;
            rendered.insert(fsops::rel_slash(rel), entry.path().to_path_buf());
        }

        let target = &self.cfg.target_directory;
        let mut plan = Vec::new();

        for (rel, stage_path) in &rendered {
            let real = target.join(rel);
            match fs::metadata(&real) {
                Err(e) if e.kind() == io::ErrorKind::NotFound => plan.push(ManagedFile {
                    path: rel.clone(),
                    action: FileAction::Add,
                }),
                Err(e) => return Err(e.into()),
                Ok(_) => {
                    let action = if fsops::sha256_file(stage_path)? == fsops::sha256_file(&real)? {
                        FileAction::Equal
                    } else {
                        FileAction::Update
                    };
                    plan.push(ManagedFile {
                        path: rel.clone(),
                        action,
                    });
                }
            }
        }

        if fs::metadata(target).is_ok() {
            for entry in WalkDir::new(target).min_depth(1).sort_by_file_name() {
                let entry = entry.map_err(io::Error::from)?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(target)
                    .map_err(|e| Error::Input(e.to_string()))?;
                let rel = fsops::rel_slash(rel);
                if !rendered.contains_key(&rel) {
                    plan.push(ManagedFile {
                        path: rel,
                        action: FileAction::Remove,
                    });
                }
            }
        }

        plan.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(plan)
    }

    /// Renders a single string using the same engine, delimiters and
    /// function set as file rendering. The `write` and `render` template
    /// functions are not available here.
    pub fn render_string(&self, template: &str, data: &Value) -> Result<String> {
        let env = Arc::new(RenderEnv {
            kind: self.kind,
            delimiters: self.delimiters(),
            target_dir: self.cfg.target_directory.clone(),
            source_dir: None,
            post: Vec::new(),
            funcs: self.funcs.clone(),
            alt_funcs: self.alt_funcs.clone(),
            callbacks: false,
            logger: self.logger.clone(),
        });

        let rendered = engine::render_bytes(&env, "string", template.as_bytes(), data, false)?
            .unwrap_or_default();

        Ok(String::from_utf8_lossy(&rendered).into_owned())
    }

    fn delimiters(&self) -> Option<(String, String)> {
        self.cfg
            .left_delimiter
            .clone()
            .zip(self.cfg.right_delimiter.clone())
    }

    fn debug(&self, message: &str) {
        if let Some(log) = &self.logger {
            log.debug(message);
        }
    }

    /// Renders every template into `dir`, running post-processing on each
    /// rendered file. In-memory sources are materialized into a temp
    /// directory that is removed when this returns, on success or failure.
    fn render_to_dir(&self, dir: &Path, data: &Value) -> Result<()> {
        fs::create_dir_all(dir)?;

        let (source_dir, _source_guard) = match &self.cfg.source_directory {
            Some(d) => (d.clone(), None),
            None => {
                let tree = self
                    .cfg
                    .source
                    .as_ref()
                    .ok_or_else(|| Error::Config("no sources provided".to_string()))?;
                let td = source::materialize(tree)?;
                (td.path().to_path_buf(), Some(td))
            }
        };

        let env = Arc::new(RenderEnv {
            kind: self.kind,
            delimiters: self.delimiters(),
            target_dir: dir.to_path_buf(),
            source_dir: Some(source_dir.clone()),
            post: self.cfg.post.clone(),
            funcs: self.funcs.clone(),
            alt_funcs: self.alt_funcs.clone(),
            callbacks: true,
            logger: self.logger.clone(),
        });

        let walker = WalkDir::new(&source_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != "_partials");

        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            let path = entry.path();
            let rel = path
                .strip_prefix(&source_dir)
                .map_err(|e| Error::Input(e.to_string()))?;
            let out = dir.join(rel);

            let file_type = entry.file_type();
            if file_type.is_dir() {
                fs::create_dir_all(&out)?;
            } else if file_type.is_file() {
                let template = fs::read(path)?;
                let name = fsops::rel_slash(rel);

                match engine::render_bytes(&env, &name, &template, data, self.cfg.skip_empty)? {
                    None => self.debug(&format!("Skipping empty file {}", out.display())),
                    Some(bytes) => {
                        fs::write(&out, &bytes)?;
                        fsops::set_mode(&out, 0o644)?;
                        crate::post::post_file(&env, &out)?;
                        self.debug(&format!("Rendered {}", out.display()));
                    }
                }
            } else {
                return Err(Error::Input(format!(
                    "invalid file in source: {}",
                    entry.file_name().to_string_lossy()
                )));
            }
        }

        Ok(())
    }

    /// Copies the staged tree into the real target, emitting one plan entry
    /// per regular file. Unchanged files are detected by content hash and
    /// left untouched.
    fn commit_tree(&self, stage: &Path) -> Result<Vec<ManagedFile>> {
        let mut plan = Vec::new();

        for entry in WalkDir::new(stage).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let rel = entry
                .path()
                .strip_prefix(stage)
                .map_err(|e| Error::Input(e.to_string()))?;
            let dst = self.cfg.target_directory.join(rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dst)?;
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let rel_slash = fsops::rel_slash(rel);

            if fs::metadata(&dst).is_ok() {
                if fsops::sha256_file(entry.path())? == fsops::sha256_file(&dst)? {
                    self.debug(&format!("Skipping unchanged file {}", rel_slash));
                    plan.push(ManagedFile {
                        path: rel_slash,
                        action: FileAction::Equal,
                    });
                    continue;
                }

                fsops::atomic_copy_file(entry.path(), &dst)?;
                plan.push(ManagedFile {
                    path: rel_slash,
                    action: FileAction::Update,
                });
            } else {
                fsops::atomic_copy_file(entry.path(), &dst)?;
                plan.push(ManagedFile {
                    path: rel_slash,
                    action: FileAction::Add,
                });
            }
        }

        Ok(plan)
    }
}

/// Extracts the paths a plan would write: every file whose action is `add`
/// or `update`, in plan order.
pub fn changed_files(plan: &[ManagedFile]) -> Vec<String> {
    plan.iter()
        .filter(|f| matches!(f.action, FileAction::Add | FileAction::Update))
        .map(|f| f.path.clone())
        .collect()
}
