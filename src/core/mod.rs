//! Core build stages: registry, analysis, splitting and bundling

pub mod analyzer;
pub mod bundler;
pub mod cache;
pub mod loader;
pub mod node;
pub mod parallel;
pub mod pipeline;
pub mod registry;
pub mod splitter;
pub mod transform;

pub use analyzer::Analyzer;
pub use bundler::{BuildOutput, Bundler};
pub use cache::ArtifactCache;
pub use pipeline::{AutoImport, BuildReport};
pub use registry::PackageRegistry;
pub use splitter::Splitter;
pub use transform::{CommandTransformer, PassthroughTransformer, Transformer};
