use regex::{Captures, Regex};
use std::sync::LazyLock;

use super::{
    declared_names, expr, syntax::SyntaxRules, Conversion, Dialect, Fault, Statement, SyntaxIssue,
};
use crate::types::Language;

static WRITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Console\.(WriteLine|Write)\s*\((.*)\)\s*;$").unwrap());
static READ_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z_][\w<>\[\]?]*\s+)?([A-Za-z_]\w*)\s*=\s*(?:(int\.Parse|long\.Parse|double\.Parse|float\.Parse|decimal\.Parse|Convert\.ToInt32|Convert\.ToInt64|Convert\.ToDouble|Convert\.ToDecimal)\s*\(\s*)?Console\.ReadLine\s*\(\s*\)\s*!?\s*\)?\s*;$",
    )
    .unwrap()
});
static DECLARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(int|long|short|double|float|decimal|string|char)\s+([\w\s,]+);$").unwrap()
});
static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:const\s+)?[A-Za-z_][\w<>\[\]?]*\s+)?([A-Za-z_]\w*)\s*(\+)?=\s*([^=].*?)\s*;$")
        .unwrap()
});
static INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)(?:[:,][^}]*)?\}").unwrap());

pub struct CSharpDialect;

fn parse_conversion(parser: Option<&str>) -> Conversion {
    match parser {
        Some("int.Parse" | "long.Parse" | "Convert.ToInt32" | "Convert.ToInt64") => Conversion::Int,
        Some(_) => Conversion::Float,
        None => Conversion::Text,
    }
}

/// Rewrites `"{0} and {1}", a, b` into the interpolated `$"{a} and {b}"`.
fn composite_format(args: &[&str]) -> Option<String> {
    let (format, values) = args.split_first()?;
    if values.is_empty() || !format.starts_with('"') {
        return None;
    }
    if values
        .iter()
        .any(|value| value.contains(['"', '{', '}', ':']))
    {
        return None;
    }
    let body = format.strip_prefix('"')?.strip_suffix('"')?;
    let replaced = INDEX_RE.replace_all(body, |caps: &Captures| {
        match caps[1].parse::<usize>().ok().and_then(|i| values.get(i)) {
            Some(value) => format!("{{{}}}", value.trim()),
            None => caps[0].to_string(),
        }
    });
    Some(format!("$\"{}\"", replaced))
}

impl Dialect for CSharpDialect {
    fn language(&self) -> Language {
        Language::CSharp
    }

    fn syntax_rules(&self) -> SyntaxRules {
        SyntaxRules {
            line_comment: "//",
            block_comments: true,
            triple_quotes: false,
        }
    }

    fn classify(&self, line: &str) -> Statement {
        if let Some(caps) = WRITE_RE.captures(line) {
            let args: Vec<&str> = expr::split_top_level(&caps[2], ",")
                .into_iter()
                .map(str::trim)
                .filter(|arg| !arg.is_empty())
                .collect();
            let parts = match composite_format(&args) {
                Some(template) => vec![template],
                None => args.first().map(|arg| arg.to_string()).into_iter().collect(),
            };
            return Statement::Output {
                parts,
                separator: String::new(),
                terminator: if &caps[1] == "WriteLine" { "\n" } else { "" }.to_string(),
            };
        }
        if let Some(caps) = READ_RE.captures(line) {
            return Statement::Input {
                targets: vec![caps[1].to_string()],
                conversion: Some(parse_conversion(caps.get(2).map(|m| m.as_str()))),
                prompt: None,
            };
        }
        if let Some(caps) = DECLARE_RE.captures(line) {
            let conversion = match &caps[1] {
                "string" | "char" => Conversion::Text,
                "double" | "float" | "decimal" => Conversion::Float,
                _ => Conversion::Int,
            };
            return Statement::Declaration {
                names: declared_names(&caps[2]),
                conversion,
            };
        }
        if let Some(caps) = ASSIGN_RE.captures(line) {
            let name = caps[1].to_string();
            let rhs = caps[3].trim();
            let expr = if caps.get(2).is_some() {
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
            "Program.cs({}): error: {}\n    {}\n",
            issue.line, issue.message, source_line
        )
    }

    fn syntax_report(&self, diagnostics: &[String]) -> String {
        format!(
            "{}\nCompilation failed: {} error(s)\n",
            diagnostics.concat(),
            diagnostics.len()
        )
    }

    fn runtime_error(&self, line: usize, fault: &Fault) -> String {
        let exception = match fault {
            Fault::Conversion { raw, .. } => format!(
                "System.FormatException: The input string '{}' was not in a correct format.",
                raw
            ),
            Fault::EndOfInput => {
                "System.InvalidOperationException: No more input lines are available.".to_string()
            }
        };
        format!(
            "Unhandled exception. {}\n   at Program.Main() in Program.cs:line {}",
            exception, line
        )
    }
}
