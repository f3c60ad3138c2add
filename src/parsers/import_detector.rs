//! Import detection using the oxc AST visitor

use crate::models::import::{ImportStyle, RawImport};
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};

/// Byte offsets of line starts, for span to line conversion
struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i as u32 + 1),
        );
        Self { starts }
    }

    /// 1-based line containing `offset`
    fn line_of(&self, offset: u32) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }
}

/// Visitor collecting every statically known module specifier in a program
pub struct ImportDetector {
    include_require: bool,
    lines: LineIndex,
    found: Vec<(u32, RawImport)>,
}

impl ImportDetector {
    /// Collect imports in source order
    ///
    /// Every string specifier is returned; deciding which ones are external
    /// is left to the caller.
    pub fn detect(program: &Program<'_>, source: &str, include_require: bool) -> Vec<RawImport> {
        let mut detector = Self {
            include_require,
            lines: LineIndex::new(source),
            found: Vec::new(),
        };
        detector.visit_program(program);

        detector.found.sort_by_key(|(start, _)| *start);
        detector.found.into_iter().map(|(_, import)| import).collect()
    }

    fn record(&mut self, specifier: &str, style: ImportStyle, start: u32) {
        let import = RawImport {
            specifier: specifier.to_string(),
            style,
            line: self.lines.line_of(start),
        };
        self.found.push((start, import));
    }
}

/// A string literal, or a template literal without substitutions
fn static_string<'b>(expr: &'b Expression<'_>) -> Option<&'b str> {
    match expr {
        Expression::StringLiteral(lit) => Some(lit.value.as_str()),
        Expression::TemplateLiteral(template)
            if template.expressions.is_empty() && template.quasis.len() == 1 =>
        {
            template.quasis[0].value.cooked.as_ref().map(|cooked| cooked.as_str())
        }
        _ => None,
    }
}

impl<'a> Visit<'a> for ImportDetector {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        if !decl.import_kind.is_type() {
            self.record(decl.source.value.as_str(), ImportStyle::Eager, decl.span.start);
        }
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            if !decl.export_kind.is_type() {
                self.record(source.value.as_str(), ImportStyle::Eager, decl.span.start);
            }
        }
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        if !decl.export_kind.is_type() {
            self.record(decl.source.value.as_str(), ImportStyle::Eager, decl.span.start);
        }
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Some(specifier) = static_string(&expr.source) {
            self.record(specifier, ImportStyle::Lazy, expr.span.start);
        }
        walk::walk_import_expression(self, expr);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.include_require && call.arguments.len() == 1 {
            if let Expression::Identifier(callee) = &call.callee {
                if callee.name.as_str() == "require" {
                    let argument = call.arguments[0].as_expression();
                    if let Some(specifier) = argument.and_then(static_string) {
                        self.record(specifier, ImportStyle::Eager, call.span.start);
                    }
                }
            }
        }
        walk::walk_call_expression(self, call);
    }
}
