//! Code transformation seam
//!
//! The bundler decides what goes into each bundle; a [`Transformer`] turns the
//! chosen modules into code. It is called once per bundle with every module
//! that bundle carries.

use crate::models::import::ImportStyle;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

/// One module handed to the transformer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformModule {
    /// Runtime module id (`lodash@4.17.21`)
    pub id: String,
    pub specifier: String,
    pub mode: ImportStyle,
    pub entry: PathBuf,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    pub bundle: String,
    pub environment: String,
    pub modules: Vec<TransformModule>,
}

impl TransformRequest {
    pub fn eager(&self) -> impl Iterator<Item = &TransformModule> {
        self.modules.iter().filter(|m| m.mode == ImportStyle::Eager)
    }

    pub fn lazy(&self) -> impl Iterator<Item = &TransformModule> {
        self.modules.iter().filter(|m| m.mode == ImportStyle::Lazy)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformOutput {
    /// Code defining every eager module
    pub eager: String,
    /// Module id to code defining that lazy module
    #[serde(default)]
    pub chunks: IndexMap<String, String>,
}

/// Turns a bundle's modules into code
pub trait Transformer: Send + Sync {
    /// Stable name; part of every artifact key
    fn name(&self) -> &str;

    /// Transform all modules of one bundle; `Err` carries the diagnostic
    fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, String>;
}

/// Wraps each module's source in a CommonJS-style `loader.define` factory
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTransformer;

impl PassthroughTransformer {
    fn define(module: &TransformModule) -> String {
        format!(
            "loader.define({}, function (module, exports, loader) {{\n{}\n}});",
            crate::core::loader::js_string(&module.id),
            module.source.trim_end()
        )
    }
}

impl Transformer for PassthroughTransformer {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, String> {
        let eager = request
            .eager()
            .map(Self::define)
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = request
            .lazy()
            .map(|module| (module.id.clone(), Self::define(module)))
            .collect();
        Ok(TransformOutput { eager, chunks })
    }
}

/// Runs an external program: request JSON on stdin, output JSON on stdout
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandTransformer {
    /// Build from an argv list; `None` when the list is empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            name: format!("command:{}", argv.join(" ")),
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Transformer for CommandTransformer {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, String> {
        let input = serde_json::to_vec(request).map_err(|e| e.to_string())?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("could not start '{}': {}", self.program, e))?;

        // Feed stdin from another thread so a chatty child cannot block on stdout
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || stdin.write_all(&input))
        });

        let output = child
            .wait_with_output()
            .map_err(|e| format!("'{}' did not finish: {}", self.program, e))?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) if output.status.success() => {
                    return Err(format!("could not send request to '{}': {}", self.program, e));
                }
                _ => {}
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(if stderr.is_empty() {
                format!("'{}' exited with {}", self.program, output.status)
            } else {
                stderr
            });
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| format!("'{}' wrote invalid output: {}", self.program, e))
    }
}
