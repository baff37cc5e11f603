//! Loading script files into a frame.
//!
//! `import name` searches the interpreter's search paths in order for
//! `name`, appending the default extension when `name` has none. The first
//! regular file found is parsed and evaluated in the importing frame, so its
//! bindings and leftover values land there.

use std::fs;
use std::path::{Path, PathBuf};

use quill_ir::{import_disabled, import_failed, EvalResult};
use tracing::{debug, info};

use crate::{EvalContext, Interpreter, StackFrame};

impl Interpreter {
    /// Import `name` into `frame`.
    ///
    /// Returns `Ok(false)` when no search path holds the file. Fails when
    /// imports are disabled, the file cannot be read, or it fails to parse
    /// or evaluate.
    pub fn import(&self, frame: &StackFrame, name: &str) -> EvalResult<bool> {
        if !self.import_enabled() {
            return Err(import_disabled(name));
        }
        let Some(path) = self.resolve_import(name) else {
            debug!(name, "import not found on search paths");
            return Ok(false);
        };
        info!(path = %path.display(), "importing");

        let source = fs::read_to_string(&path)
            .map_err(|err| import_failed(&path.display().to_string(), err.to_string()))?;
        let exprs = quill_parse::parse(&source)
            .map_err(|err| err.with_metadata("file", path.display().to_string()))?;
        self.eval(frame, &exprs, EvalContext::Normal)
            .map_err(|err| err.with_metadata("file", path.display().to_string()))?;
        Ok(true)
    }

    /// The file `import name` would load, if any.
    pub fn resolve_import(&self, name: &str) -> Option<PathBuf> {
        let file = with_default_extension(Path::new(name), self.default_extension());
        if file.is_absolute() {
            return file.is_file().then_some(file);
        }
        self.search_paths()
            .iter()
            .map(|dir| dir.join(&file))
            .find(|candidate| candidate.is_file())
    }
}

fn with_default_extension(name: &Path, extension: &str) -> PathBuf {
    let mut file = name.to_path_buf();
    if file.extension().is_none() && !extension.is_empty() {
        file.set_extension(extension);
    }
    file
}

#[cfg(test)]
mod tests;
