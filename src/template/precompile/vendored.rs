//! Precompiler backed by the project's vendored template compiler.
//!
//! The compiler script (`ember-template-compiler.js` by default) is loaded
//! into a fresh node VM context per template, and its `precompile` function
//! is applied to the template read from stdin. The output targets the same
//! runtime that `<engine>.template(...)` wraps, which is what production
//! bundles need.

use std::path::{Path, PathBuf};

use super::{CommandPrecompiler, Precompile, PrecompileError};

/// Loads the compiler named by `argv[1]`, precompiles stdin, prints the result.
const DRIVER: &str = r#"
const fs = require('fs');
const vm = require('vm');
const file = process.argv[1];
const mod = { exports: {} };
const sandbox = { module: mod, exports: mod.exports, console };
sandbox.window = sandbox;
sandbox.self = sandbox;
try {
  vm.runInNewContext(fs.readFileSync(file, 'utf8'), sandbox, { filename: file });
} catch (e) {
  console.error(file + ': ' + e.message);
  process.exit(2);
}
const candidates = [
  mod.exports,
  sandbox.exports,
  sandbox.Ember && sandbox.Ember.Handlebars,
  sandbox.EmberHandlebars,
  sandbox.Handlebars,
];
const compiler = candidates.find((c) => c && typeof c.precompile === 'function');
if (!compiler) {
  console.error(file + ' does not define precompile');
  process.exit(2);
}
try {
  const source = fs.readFileSync(0, 'utf8');
  process.stdout.write(String(compiler.precompile(source)));
} catch (e) {
  console.error(e.message);
  process.exit(1);
}
"#;

#[derive(Debug, Clone)]
pub struct VendoredPrecompiler {
    compiler: PathBuf,
    inner: CommandPrecompiler,
}

impl VendoredPrecompiler {
    /// Precompiler running `compiler` with `node` from `cwd`.
    pub fn new(node: &str, compiler: &Path, cwd: &Path) -> Self {
        let command = Self::command(node, compiler);
        Self {
            compiler: compiler.to_path_buf(),
            inner: CommandPrecompiler::new(&command, cwd),
        }
    }

    fn command(node: &str, compiler: &Path) -> Vec<String> {
        vec![
            node.to_string(),
            "-e".to_string(),
            DRIVER.to_string(),
            compiler.to_string_lossy().into_owned(),
        ]
    }
}

impl Precompile for VendoredPrecompiler {
    fn precompile(&self, source: &str) -> Result<String, PrecompileError> {
        if !self.compiler.is_file() {
            return Err(PrecompileError::new(format!(
                "template compiler `{}` not found",
                self.compiler.display()
            )));
        }
        self.inner.precompile(source)
    }

    fn name(&self) -> &str {
        "vendored"
    }
}
