use regex::Regex;
use std::sync::LazyLock;

use super::{expr, syntax::SyntaxRules, Conversion, Dialect, Fault, Statement, SyntaxIssue};
use crate::types::Language;

static STRIP_CHAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\.\s*(?:strip|lstrip|rstrip)\s*\(\s*\)\s*)*$").unwrap());
static PRINT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^print\s*\((.*)\)$").unwrap());
static ASSIGN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*(\+)?=\s*([^=].*)$").unwrap());
static TRY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^try\s*:$").unwrap());
static EXCEPT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^except\b.*:$").unwrap());

pub struct PythonDialect;

impl PythonDialect {
    fn print_statement(args: &str) -> Statement {
        let mut parts = Vec::new();
        let mut separator = " ".to_string();
        let mut terminator = "\n".to_string();

        for arg in expr::split_top_level(args, ",") {
            let arg = arg.trim();
            if arg.is_empty() {
                continue;
            }
            if let Some(value) = keyword_literal(arg, "sep") {
                separator = value;
            } else if let Some(value) = keyword_literal(arg, "end") {
                terminator = value;
            } else {
                parts.push(arg.to_string());
            }
        }

        Statement::Output {
            parts,
            separator,
            terminator,
        }
    }
}

/// `input(...)`, optionally stripped and optionally inside `int(...)` or
/// `float(...)`, as the whole right-hand side
fn input_form(rhs: &str) -> Option<(Conversion, Option<String>)> {
    let rhs = rhs.trim();
    let (conversion, inner) = match (whole_call(rhs, "int"), whole_call(rhs, "float")) {
        (Some(inner), _) => (Conversion::Int, inner.trim()),
        (_, Some(inner)) => (Conversion::Float, inner.trim()),
        _ => (Conversion::Text, rhs),
    };
    let call = expr::find_call(inner, "input")?;
    if call.start != 0 || !STRIP_CHAIN_RE.is_match(&inner[call.end..]) {
        return None;
    }
    let prompt = call.args.trim();
    Some((conversion, (!prompt.is_empty()).then(|| prompt.to_string())))
}

fn whole_call<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    expr::find_call(text, name)
        .filter(|call| call.start == 0 && call.end == text.len())
        .map(|call| call.args)
}

fn keyword_literal(arg: &str, keyword: &str) -> Option<String> {
    let value = arg.strip_prefix(keyword)?.trim_start().strip_prefix('=')?;
    expr::string_literal(value.trim())
}

impl Dialect for PythonDialect {
    fn language(&self) -> Language {
        Language::Python
    }

    fn syntax_rules(&self) -> SyntaxRules {
        SyntaxRules {
            line_comment: "#",
            block_comments: false,
            triple_quotes: true,
        }
    }

    fn classify(&self, line: &str) -> Statement {
        if TRY_RE.is_match(line) {
            return Statement::TryStart;
        }
        if EXCEPT_RE.is_match(line) {
            return Statement::Handler;
        }
        if let Some(caps) = PRINT_RE.captures(line) {
            return Self::print_statement(&caps[1]);
        }
        if let Some(caps) = ASSIGN_RE.captures(line) {
            let name = caps[1].to_string();
            let rhs = caps[3].trim();
            let augmented = caps.get(2).is_some();
            if let Some((conversion, prompt)) = input_form(rhs).filter(|_| !augmented) {
                return Statement::Input {
                    targets: vec![name],
                    conversion: Some(conversion),
                    prompt,
                };
            }
            let expr = if augmented {
                format!("{} + ({})", name, rhs)
            } else {
                rhs.to_string()
            };
            return Statement::Assignment { name, expr };
        }
        Statement::Unrecognized
    }

    fn syntax_diagnostic(&self, issue: &SyntaxIssue, source_line: &str) -> String {
        format!(
            "  File \"main.py\", line {}\n    {}\nSyntaxError: {}\n",
            issue.line, source_line, issue.message
        )
    }

    fn syntax_report(&self, diagnostics: &[String]) -> String {
        format!("Traceback (most recent call last):\n{}", diagnostics.concat())
    }

    fn runtime_error(&self, line: usize, fault: &Fault) -> String {
        let message = match fault {
            Fault::Conversion {
                raw,
                target: Conversion::Float,
            } => format!("ValueError: could not convert string to float: '{}'", raw),
            Fault::Conversion { raw, .. } => {
                format!("ValueError: invalid literal for int() with base 10: '{}'", raw)
            }
            Fault::EndOfInput => "EOFError: EOF when reading a line".to_string(),
        };
        format!(
            "Traceback (most recent call last):\n  File \"main.py\", line {}, in <module>\n{}",
            line, message
        )
    }

    fn indentation_blocks(&self) -> bool {
        true
    }

    fn inline_input(&self) -> Option<&'static str> {
        Some("input")
    }
}
