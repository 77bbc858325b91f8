//! Configuration section definitions.
//!
//! | Section        | Purpose                                       |
//! |----------------|-----------------------------------------------|
//! | `[build]`      | Default environment, output directory         |
//! | `[framework]`  | Namespace, template engine, namespace aliases |
//! | `[templates]`  | Template extensions and precompiler selection |
//! | `[[bundle]]`   | Bundle name, source roots, exclusions         |

mod build;
mod bundle;
mod framework;
mod templates;

pub use build::BuildConfig;
pub use bundle::BundleConfig;
pub use framework::FrameworkConfig;
pub use templates::{PrecompilerKind, TemplatesConfig};
