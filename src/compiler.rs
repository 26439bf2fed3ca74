//! Turning font binaries into trees and back.
//!
//! The normalizer only ever sees a [`FontTree`]; a [`FontCompiler`] is what
//! gets it there from the bytes of a font and back again afterwards.

use crate::error::{Result, VMetricsError};
use crate::font;
use crate::tree::FontTree;
use crate::ttx;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Converts between a font binary and its tree form.
///
/// Implementations hold no per-call state, so one compiler may serve many
/// threads at once.
pub trait FontCompiler: Sync {
    fn decompile(&self, data: &[u8]) -> Result<FontTree>;
    fn compile(&self, tree: &FontTree) -> Result<Vec<u8>>;
}

/// The built-in sfnt reader and writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SfntCompiler;

impl FontCompiler for SfntCompiler {
    fn decompile(&self, data: &[u8]) -> Result<FontTree> {
        font::decompile(data)
    }

    fn compile(&self, tree: &FontTree) -> Result<Vec<u8>> {
        font::compile(tree)
    }
}

/// Delegates to an external `ttx` executable, going through TTX XML.
#[derive(Debug, Clone)]
pub struct TtxCompiler {
    program: PathBuf,
}

impl Default for TtxCompiler {
    fn default() -> Self {
        TtxCompiler::new("ttx")
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> VMetricsError + '_ {
    move |source| VMetricsError::Io {
        source,
        path: path.to_path_buf(),
    }
}

impl TtxCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        TtxCompiler {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run `ttx` over `contents`, returning what it wrote.
    fn run(&self, contents: &[u8], input_ext: &str, output_ext: &str) -> Result<Vec<u8>> {
        let scratch = scratch_dir()?;
        let input = scratch.path().join(format!("input.{}", input_ext));
        let output_file = scratch.path().join(format!("output.{}", output_ext));
        fs::write(&input, contents).map_err(io_error(&input))?;
        debug!("Running {} on {}", self.program.display(), input.display());
        let output = Command::new(&self.program)
            .arg("-q")
            .arg("-o")
            .arg(&output_file)
            .arg(&input)
            .output()
            .map_err(io_error(&self.program))?;
        if !output.status.success() {
            return Err(VMetricsError::Compiler {
                program: self.program.display().to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let data = fs::read(&output_file).map_err(io_error(&output_file))?;
        let path = scratch.path().to_path_buf();
        scratch.close().map_err(io_error(&path))?;
        Ok(data)
    }
}

/// A fresh private directory for one `ttx` run, removed when dropped.
fn scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("vmetrics")
        .tempdir()
        .map_err(io_error(&std::env::temp_dir()))
}

impl FontCompiler for TtxCompiler {
    fn decompile(&self, data: &[u8]) -> Result<FontTree> {
        let xml = self.run(data, "ttf", "ttx")?;
        let xml = String::from_utf8(xml).map_err(|e| VMetricsError::Xml {
            reason: e.to_string(),
        })?;
        ttx::parse(&xml)
    }

    fn compile(&self, tree: &FontTree) -> Result<Vec<u8>> {
        let xml = ttx::build(tree)?;
        self.run(xml.as_bytes(), "ttx", "ttf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::font_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn sfnt_compiler_round_trip() {
        let compiler = SfntCompiler;
        let binary = compiler.compile(&font_tree(true)).unwrap();
        let tree = compiler.decompile(&binary).unwrap();
        assert_eq!(compiler.compile(&tree).unwrap(), binary);
    }

    #[test]
    fn missing_ttx_is_an_io_error() {
        let compiler = TtxCompiler::new("/nonexistent/path/to/ttx");
        let err = compiler.decompile(&[0, 1, 0, 0]).unwrap_err();
        match err {
            VMetricsError::Io { path, .. } => assert_eq!(path, compiler.program()),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failing_ttx_is_a_compiler_error() {
        // `false` ignores its arguments and exits 1.
        let compiler = TtxCompiler::new("false");
        let err = compiler.compile(&font_tree(false)).unwrap_err();
        assert!(matches!(err, VMetricsError::Compiler { .. }));
    }

    #[test]
    fn scratch_dirs_are_private_and_removed() {
        let (first_path, second_path) = {
            let first = scratch_dir().unwrap();
            let second = scratch_dir().unwrap();
            fs::write(first.path().join("input.ttf"), b"x").unwrap();
            assert_ne!(first.path(), second.path());
            let name = first.path().file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with("vmetrics"));
            (first.path().to_path_buf(), second.path().to_path_buf())
        };
        assert!(!first_path.exists());
        assert!(!second_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn ttx_runs_in_a_scratch_dir_which_is_removed() {
        use std::os::unix::fs::PermissionsExt;

        // Copies its input to its output and records where it ran.
        let bin = tempfile::tempdir().unwrap();
        let record = bin.path().join("ran-in");
        let program = bin.path().join("ttx");
        let script = format!(
            "#!/bin/sh\ncp \"$4\" \"$3\"\ndirname \"$3\" > \"{}\"\n",
            record.display()
        );
        fs::write(&program, script).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let compiler = TtxCompiler::new(&program);
        assert_eq!(compiler.run(b"font data", "ttf", "ttx").unwrap(), b"font data");
        let ran_in = fs::read_to_string(&record).unwrap();
        let ran_in = Path::new(ran_in.trim());
        assert!(ran_in
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("vmetrics"));
        assert!(!ran_in.exists());
    }
}
