// src/pipeline/stage.rs

//! Typed stage descriptors.
//!
//! A stage is a program plus an ordered list of argument templates. Templates
//! are parsed when the stage is built, so a reference to an unknown
//! parameter is rejected at registration time, long before anything spawns.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::errors::{Result, RunsampleError};
use crate::exec::CommandLine;
use crate::pipeline::params::{Param, StageParams};
use crate::types::Fatality;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

/// One argument with `{param}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    raw: String,
    params: Vec<Param>,
}

impl Template {
    pub fn parse(raw: impl Into<String>) -> std::result::Result<Self, String> {
        let raw = raw.into();
        let mut params = Vec::new();
        for caps in placeholder_re().captures_iter(&raw) {
            let param: Param = caps[1].parse()?;
            if !params.contains(&param) {
                params.push(param);
            }
        }
        Ok(Self { raw, params })
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Substitute every placeholder. `Err(param)` names the first one
    /// without a value.
    pub fn render(&self, values: &StageParams) -> std::result::Result<String, Param> {
        for param in &self.params {
            if !values.contains(*param) {
                return Err(*param);
            }
        }
        let rendered = placeholder_re().replace_all(&self.raw, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<Param>()
                .ok()
                .and_then(|p| values.get(p))
                .unwrap_or_default()
                .to_string()
        });
        Ok(rendered.into_owned())
    }
}

/// One slot in a stage's argument list.
#[derive(Debug, Clone)]
pub enum Arg {
    Template(Template),
    /// Rendered only when `param` has a value (e.g. `-c {config}`).
    IfSet { param: Param, args: Vec<Template> },
    /// Files directly inside directory `dir` whose names match `pattern`,
    /// sorted. Expanded when the command is built, so it sees the outputs of
    /// every stage that already ran.
    Glob {
        dir: Param,
        pattern: String,
        matcher: GlobMatcher,
    },
}

/// Where a stage's stdout/stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageSink {
    /// Both streams appended to the shared transcript (`<sample>.std.log`).
    Transcript,
    /// Both streams to a stage-dedicated log file named by the parameter.
    Dedicated(Param),
    /// stdout is the stage's product and goes to the file named by the
    /// parameter; stderr goes to the transcript.
    CaptureStdout(Param),
}

/// An immutable, validated pipeline stage.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    program: String,
    args: Vec<Arg>,
    fatality: Fatality,
    sink: StageSink,
    use_search_dir: bool,
    outputs: Vec<Param>,
}

impl Stage {
    pub fn builder(name: impl Into<String>, program: impl Into<String>) -> StageBuilder {
        StageBuilder {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            fatality: Fatality::Recoverable,
            sink: StageSink::Transcript,
            use_search_dir: true,
            outputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn fatality(&self) -> Fatality {
        self.fatality
    }

    pub fn is_fatal(&self) -> bool {
        self.fatality == Fatality::Fatal
    }

    pub fn sink(&self) -> StageSink {
        self.sink
    }

    pub fn outputs(&self) -> &[Param] {
        &self.outputs
    }

    /// Parameters that must have a value before this stage can be built.
    pub fn required_params(&self) -> BTreeSet<Param> {
        let mut required = BTreeSet::new();
        for arg in &self.args {
            match arg {
                Arg::Template(t) => required.extend(t.params().iter().copied()),
                Arg::IfSet { .. } => {}
                Arg::Glob { dir, .. } => {
                    required.insert(*dir);
                }
            }
        }
        match self.sink {
            StageSink::Transcript => {}
            StageSink::Dedicated(p) | StageSink::CaptureStdout(p) => {
                required.insert(p);
            }
        }
        required.extend(self.outputs.iter().copied());
        required
    }

    /// Render the command line for this stage against `params`.
    pub fn command(&self, params: &StageParams) -> Result<CommandLine> {
        let missing = |param: Param| RunsampleError::MissingParameter {
            stage: self.name.clone(),
            param: param.to_string(),
        };

        let mut cmd = CommandLine::new(&self.program);
        if !self.use_search_dir {
            cmd = cmd.on_path();
        }

        for arg in &self.args {
            match arg {
                Arg::Template(t) => {
                    cmd = cmd.arg(t.render(params).map_err(missing)?);
                }
                Arg::IfSet { param, args } => {
                    if params.contains(*param) {
                        for t in args {
                            cmd = cmd.arg(t.render(params).map_err(missing)?);
                        }
                    }
                }
                Arg::Glob { dir, matcher, .. } => {
                    let dir = params.path(*dir).ok_or_else(|| missing(*dir))?;
                    cmd = cmd.args(
                        expand_glob(&dir, matcher)?
                            .into_iter()
                            .map(|p| p.to_string_lossy().into_owned()),
                    );
                }
            }
        }

        Ok(cmd)
    }

    /// Human-readable form of the argument templates (for `--dry-run`).
    pub fn describe(&self) -> String {
        let mut out = self.program.clone();
        for arg in &self.args {
            match arg {
                Arg::Template(t) => {
                    out.push(' ');
                    out.push_str(t.raw());
                }
                Arg::IfSet { args, .. } => {
                    let inner: Vec<&str> = args.iter().map(Template::raw).collect();
                    out.push_str(&format!(" [{}]", inner.join(" ")));
                }
                Arg::Glob { dir, pattern, .. } => {
                    out.push_str(&format!(" {{{dir}}}/{pattern}"));
                }
            }
        }
        out
    }
}

fn expand_glob(dir: &Path, matcher: &GlobMatcher) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut matches = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matched = path
            .file_name()
            .map(|name| matcher.is_match(name))
            .unwrap_or(false);
        if matched {
            matches.push(path);
        }
    }
    matches.sort();
    Ok(matches)
}

/// Accumulates a stage definition; [`StageBuilder::build`] validates it.
#[derive(Debug, Clone)]
pub struct StageBuilder {
    name: String,
    program: String,
    args: Vec<RawArg>,
    fatality: Fatality,
    sink: StageSink,
    use_search_dir: bool,
    outputs: Vec<Param>,
}

#[derive(Debug, Clone)]
enum RawArg {
    Template(String),
    IfSet(Param, Vec<String>),
    Glob(Param, String),
}

impl StageBuilder {
    /// Append arguments; each whitespace-separated token becomes one argument.
    pub fn args(mut self, template: &str) -> Self {
        self.args.extend(
            template
                .split_whitespace()
                .map(|tok| RawArg::Template(tok.to_string())),
        );
        self
    }

    /// Append a single argument verbatim (may contain spaces).
    pub fn arg(mut self, template: impl Into<String>) -> Self {
        self.args.push(RawArg::Template(template.into()));
        self
    }

    /// Append `template` only when `param` has a value.
    pub fn args_if_set(mut self, param: Param, template: &str) -> Self {
        self.args.push(RawArg::IfSet(
            param,
            template.split_whitespace().map(str::to_string).collect(),
        ));
        self
    }

    /// Append every file in `dir` matching `pattern`.
    pub fn glob(mut self, dir: Param, pattern: impl Into<String>) -> Self {
        self.args.push(RawArg::Glob(dir, pattern.into()));
        self
    }

    pub fn fatal(mut self) -> Self {
        self.fatality = Fatality::Fatal;
        self
    }

    pub fn sink(mut self, sink: StageSink) -> Self {
        self.sink = sink;
        self
    }

    /// Look the program up on `PATH` instead of the script directory.
    pub fn on_path(mut self) -> Self {
        self.use_search_dir = false;
        self
    }

    /// Declare a workspace path this stage is expected to produce.
    pub fn produces(mut self, param: Param) -> Self {
        self.outputs.push(param);
        self
    }

    pub fn build(self) -> Result<Stage> {
        let invalid = |msg: String| RunsampleError::InvalidStage(format!("{}: {msg}", self.name));

        if self.name.trim().is_empty() {
            return Err(RunsampleError::InvalidStage(
                "stage name must not be empty".to_string(),
            ));
        }
        if self.program.trim().is_empty() {
            return Err(invalid("program must not be empty".to_string()));
        }

        let mut args = Vec::with_capacity(self.args.len());
        for raw in &self.args {
            let arg = match raw {
                RawArg::Template(s) => Arg::Template(Template::parse(s.as_str()).map_err(&invalid)?),
                RawArg::IfSet(param, tokens) => {
                    let mut templates = Vec::with_capacity(tokens.len());
                    for tok in tokens {
                        let t = Template::parse(tok.as_str()).map_err(&invalid)?;
                        if t.params().iter().any(|p| p != param) {
                            return Err(invalid(format!(
                                "conditional argument '{tok}' may only reference {{{param}}}"
                            )));
                        }
                        templates.push(t);
                    }
                    Arg::IfSet {
                        param: *param,
                        args: templates,
                    }
                }
                RawArg::Glob(dir, pattern) => {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| invalid(format!("bad glob '{pattern}': {e}")))?
                        .compile_matcher();
                    Arg::Glob {
                        dir: *dir,
                        pattern: pattern.clone(),
                        matcher,
                    }
                }
            };
            args.push(arg);
        }

        Ok(Stage {
            name: self.name,
            program: self.program,
            args,
            fatality: self.fatality,
            sink: self.sink,
            use_search_dir: self.use_search_dir,
            outputs: self.outputs,
        })
    }
}
