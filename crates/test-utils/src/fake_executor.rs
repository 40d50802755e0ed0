use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use runsample::errors::{Result, RunsampleError};
use runsample::exec::{CommandLine, ProcessHandle, ProcessRunner, Redirect, StageIo};

type Hook = Arc<dyn Fn(&CommandLine) + Send + Sync>;

#[derive(Default)]
struct Script {
    exit_codes: HashMap<String, i32>,
    missing: HashSet<String>,
    stdout: HashMap<String, String>,
    hooks: HashMap<String, Hook>,
    invocations: Vec<CommandLine>,
}

/// A fake process runner that:
/// - records every command it is asked to start, in order
/// - returns a scripted exit code per program (default 0)
/// - can pretend a program does not exist
/// - can write canned stdout into the stage's stdout sink
/// - can run a hook per program, e.g. to create the files a stage produces.
///
/// Clones share state, so a test can keep one clone for assertions and hand
/// the other to the pipeline.
#[derive(Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Mutex<Script>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit_code(self, program: &str, code: i32) -> Self {
        self.script
            .lock()
            .unwrap()
            .exit_codes
            .insert(program.to_string(), code);
        self
    }

    pub fn missing(self, program: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .missing
            .insert(program.to_string());
        self
    }

    pub fn stdout(self, program: &str, text: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .stdout
            .insert(program.to_string(), text.to_string());
        self
    }

    pub fn on_run<F>(self, program: &str, hook: F) -> Self
    where
        F: Fn(&CommandLine) + Send + Sync + 'static,
    {
        self.script
            .lock()
            .unwrap()
            .hooks
            .insert(program.to_string(), Arc::new(hook));
        self
    }

    pub fn invocations(&self) -> Vec<CommandLine> {
        self.script.lock().unwrap().invocations.clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.invocations().into_iter().map(|c| c.program).collect()
    }

    pub fn invocation(&self, program: &str) -> Option<CommandLine> {
        self.invocations().into_iter().find(|c| c.program == program)
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&mut self, command: &CommandLine, io: StageIo) -> Result<Box<dyn ProcessHandle>> {
        let (hook, code, stdout) = {
            let mut script = self.script.lock().unwrap();
            script.invocations.push(command.clone());
            if script.missing.contains(&command.program) {
                return Err(RunsampleError::CommandNotFound(command.program.clone()));
            }
            (
                script.hooks.get(&command.program).cloned(),
                script.exit_codes.get(&command.program).copied().unwrap_or(0),
                script.stdout.get(&command.program).cloned(),
            )
        };

        if let Some(text) = stdout {
            if let Redirect::File(mut f) = io.stdout {
                f.write_all(text.as_bytes())?;
            }
        }
        if let Some(hook) = hook {
            hook(command);
        }

        Ok(Box::new(FinishedHandle { code }))
    }
}

/// A process that has already exited.
struct FinishedHandle {
    code: i32,
}

impl ProcessHandle for FinishedHandle {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        let code = self.code;
        Box::pin(async move { Ok(code) })
    }
}
