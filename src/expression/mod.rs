//! The filter/transform expression compiler is an external collaborator:
//! this crate only calls `compile(expr, fields) -> ok|diag`. The
//! `ExpressionCompiler` trait is the seam; `BlackBoxCompiler` is a minimal
//! stand-in used by tests and the default wiring so the crate runs without
//! the real compiler dependency.

use crate::domain::pipeline_config::SchemaField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax,
    UndefinedFunction,
    Runtime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl CompileDiagnostic {
    /// Human-readable diagnostic distinguishing the three failure classes.
    pub fn describe(&self) -> String {
        match self.kind {
            DiagnosticKind::Syntax => format!("syntax error: {}", self.message),
            DiagnosticKind::UndefinedFunction => format!("undefined function: {}", self.message),
            DiagnosticKind::Runtime => format!("runtime error: {}", self.message),
        }
    }
}

pub trait ExpressionCompiler: Send + Sync {
    /// Compile `expression` against `fields` without executing it.
    fn compile(&self, expression: &str, fields: &[SchemaField]) -> Result<(), CompileDiagnostic>;

    /// Evaluate `expression` against a caller-supplied JSON sample. Used
    /// only by the `/api/v1/evaluate/transform` endpoint, never during
    /// validation.
    fn evaluate(
        &self,
        expression: &str,
        sample: &serde_json::Value,
    ) -> Result<serde_json::Value, CompileDiagnostic>;
}

const KNOWN_FUNCTIONS: &[&str] = &["lower", "upper", "trim", "concat", "coalesce", "cast", "len"];

/// A conservative stand-in for the real expression compiler: balances
/// parentheses/quotes for a syntax check, flags calls to unrecognized
/// function names, and requires bare identifiers to name a declared field.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlackBoxCompiler;

impl BlackBoxCompiler {
    fn check_syntax(expression: &str) -> Result<(), CompileDiagnostic> {
        if expression.trim().is_empty() {
            return Err(CompileDiagnostic {
                kind: DiagnosticKind::Syntax,
                message: "expression is empty".to_string(),
            });
        }
        let mut depth = 0i32;
        let mut in_quote = false;
        for ch in expression.chars() {
            match ch {
                '\'' | '"' => in_quote = !in_quote,
                '(' if !in_quote => depth += 1,
                ')' if !in_quote => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(CompileDiagnostic {
                            kind: DiagnosticKind::Syntax,
                            message: "unbalanced parentheses".to_string(),
                        });
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(CompileDiagnostic {
                kind: DiagnosticKind::Syntax,
                message: "unbalanced parentheses".to_string(),
            });
        }
        if in_quote {
            return Err(CompileDiagnostic {
                kind: DiagnosticKind::Syntax,
                message: "unterminated string literal".to_string(),
            });
        }
        Ok(())
    }

    fn find_calls(expression: &str) -> Vec<String> {
        let mut calls = Vec::new();
        let bytes = expression.as_bytes();
        let mut ident_start = None;
        for (i, ch) in expression.char_indices() {
            if ch.is_alphanumeric() || ch == '_' {
                if ident_start.is_none() {
                    ident_start = Some(i);
                }
            } else {
                if ch == '(' {
                    if let Some(start) = ident_start {
                        calls.push(expression[start..i].to_string());
                    }
                }
                ident_start = None;
            }
        }
        let _ = bytes;
        calls
    }
}

impl ExpressionCompiler for BlackBoxCompiler {
    fn compile(&self, expression: &str, fields: &[SchemaField]) -> Result<(), CompileDiagnostic> {
        Self::check_syntax(expression)?;

        for call in Self::find_calls(expression) {
            let lower = call.to_ascii_lowercase();
            if !KNOWN_FUNCTIONS.contains(&lower.as_str()) {
                return Err(CompileDiagnostic {
                    kind: DiagnosticKind::UndefinedFunction,
                    message: call,
                });
            }
        }

        let known: std::collections::HashSet<&str> =
            fields.iter().map(|f| f.name.as_str()).collect();
        for token in expression.split(|c: char| !(c.is_alphanumeric() || c == '_')) {
            if token.is_empty() || token.chars().next().unwrap().is_ascii_digit() {
                continue;
            }
            if KNOWN_FUNCTIONS.iter().any(|f| f.eq_ignore_ascii_case(token)) {
                continue;
            }
            if !known.contains(token) {
                return Err(CompileDiagnostic {
                    kind: DiagnosticKind::Runtime,
                    message: format!("unknown identifier '{token}'"),
                });
            }
        }

        Ok(())
    }

    fn evaluate(
        &self,
        expression: &str,
        sample: &serde_json::Value,
    ) -> Result<serde_json::Value, CompileDiagnostic> {
        Self::check_syntax(expression)?;
        let trimmed = expression.trim();
        if let Some(field) = sample.get(trimmed) {
            return Ok(field.clone());
        }
        Ok(serde_json::json!({ "expression": trimmed, "input": sample }))
    }
}
