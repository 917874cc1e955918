//! Turns a file or a directory of sources into output files.
//!
//! Each unit is rendered completely in memory before anything is written, so
//! a failing unit never leaves a truncated output file behind.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use log::{info, warn};
use snafu::ResultExt;

use crate::error::{CompileError, CompileResult, IoSnafu};
use crate::lexer::Lexer;
use crate::xml::{class_to_xml, tokens_to_xml};

pub const SOURCE_EXTENSION: &str = "jack";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// Stack-machine code (`Foo.vm`)
    #[default]
    Vm,
    /// Parse tree (`Foo.xml`)
    Xml,
    /// Token stream (`FooT.xml`)
    Tokens,
}

impl Emit {
    pub fn output_name(self, stem: &str) -> String {
        match self {
            Emit::Vm => format!("{stem}.vm"),
            Emit::Xml => format!("{stem}.xml"),
            Emit::Tokens => format!("{stem}T.xml"),
        }
    }

    pub fn render<R: BufRead>(self, reader: R) -> CompileResult<String> {
        match self {
            Emit::Vm => crate::compile_reader(reader),
            Emit::Xml => Ok(class_to_xml(&crate::parse(reader)?)),
            Emit::Tokens => {
                let tokens = Lexer::new(reader).collect::<CompileResult<Vec<_>>>()?;
                Ok(tokens_to_xml(&tokens))
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Options {
    pub emit: Emit,
    /// Defaults to the directory of each source file.
    pub out_dir: Option<PathBuf>,
    /// Keep compiling the remaining files after a failure instead of aborting.
    pub keep_going: bool,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<CompileError>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A single file is taken as is; a directory yields its `.jack` files in
/// name order.
pub fn collect_sources(input: &Path) -> CompileResult<Vec<PathBuf>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut sources = vec![];
    for entry in fs::read_dir(input).context(IoSnafu)? {
        let path = entry.context(IoSnafu)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

pub fn compile_file(path: &Path, options: &Options) -> CompileResult<PathBuf> {
    let file = File::open(path).context(IoSnafu)?;
    let output = options.emit.render(BufReader::new(file))?;

    let dir = match &options.out_dir {
        Some(dir) => dir.clone(),
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let out_path = dir.join(options.emit.output_name(&stem));

    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(&dir).context(IoSnafu)?;
    }
    fs::write(&out_path, output).context(IoSnafu)?;
    info!("{} -> {}", path.display(), out_path.display());
    Ok(out_path)
}

/// Compiles every source under `input`. Without `keep_going` the first
/// failure is returned as is; with it failures are collected in the summary.
pub fn run(input: &Path, options: &Options) -> CompileResult<Summary> {
    let sources = collect_sources(input).map_err(|e| e.in_file(input))?;
    let mut summary = Summary::default();

    for path in sources {
        match compile_file(&path, options) {
            Ok(out_path) => summary.written.push(out_path),
            Err(e) => {
                let e = e.in_file(&path);
                if !options.keep_going {
                    return Err(e);
                }
                warn!("{e}");
                summary.failed.push(e);
            }
        }
    }
    Ok(summary)
}
