//! AST parser wrapper using OXC

use crate::error::{AutoImportError, Result};
use crate::models::import::RawImport;
use crate::parsers::import_detector::ImportDetector;
use oxc_allocator::Allocator;
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use parking_lot::Mutex;
use std::path::Path;

/// Thread-safe allocator pool for reuse across parses
pub struct AllocatorPool {
    allocators: Mutex<Vec<Allocator>>,
}

impl AllocatorPool {
    /// Create a new allocator pool
    pub fn new(size: usize) -> Self {
        let allocators = (0..size).map(|_| Allocator::default()).collect();
        Self {
            allocators: Mutex::new(allocators),
        }
    }

    /// Take an allocator from the pool
    pub fn take(&self) -> Option<Allocator> {
        self.allocators.lock().pop()
    }

    /// Return an allocator to the pool, freeing what it holds
    pub fn return_allocator(&self, mut allocator: Allocator) {
        allocator.reset();
        self.allocators.lock().push(allocator);
    }
}

/// AST parser using OXC
pub struct ASTParser {
    parse_options: ParseOptions,
    allocator_pool: AllocatorPool,
    include_require: bool,
}

impl ASTParser {
    /// Create a new AST parser
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            allocator_pool: AllocatorPool::new(num_cpus::get()),
            include_require: false,
        }
    }

    /// Also report `require('x')` calls as eager imports
    pub fn with_require(mut self, include_require: bool) -> Self {
        self.include_require = include_require;
        self
    }

    /// Parse one module and extract its imports while the allocator is alive
    ///
    /// `module_path` picks the source type by extension and names the file in
    /// errors. Any diagnostic fails the whole file.
    pub fn parse_imports(
        &self,
        module_path: &str,
        package: &str,
        source_text: &str,
    ) -> Result<Vec<RawImport>> {
        let source_type = SourceType::from_path(Path::new(module_path)).map_err(|e| {
            AutoImportError::parse_error(module_path, package, e.to_string())
        })?;

        let allocator = self.allocator_pool.take().unwrap_or_default();

        let ret = Parser::new(&allocator, source_text, source_type)
            .with_options(self.parse_options.clone())
            .parse();

        let result = match ret.errors.first() {
            Some(diagnostic) => Err(AutoImportError::parse_error(
                module_path,
                package,
                diagnostic.to_string(),
            )),
            None if ret.panicked => Err(AutoImportError::parse_error(
                module_path,
                package,
                "parser gave up on this file",
            )),
            None => Ok(ImportDetector::detect(
                &ret.program,
                source_text,
                self.include_require,
            )),
        };

        drop(ret);
        self.allocator_pool.return_allocator(allocator);
        result
    }
}

impl Default for ASTParser {
    fn default() -> Self {
        Self::new()
    }
}
