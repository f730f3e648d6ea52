use regex::Regex;
use std::sync::LazyLock;

use super::{
    declared_names, expr, syntax::SyntaxRules, Conversion, Dialect, Fault, Statement, SyntaxIssue,
};
use crate::types::Language;

static COUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:std::)?cout\s*<<(.*);$").unwrap());
static CIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:std::)?cin\s*>>(.*);$").unwrap());
static GETLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:std::)?getline\s*\(\s*(?:std::)?cin\s*,\s*([A-Za-z_]\w*)\s*\)\s*;$").unwrap()
});
static DECLARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:const\s+)?(long long|long|int|short|unsigned|double|float|char|bool|std::string|string)\s+([\w\s,]+);$",
    )
    .unwrap()
});
static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:const\s+)?([A-Za-z_][\w:<>]*(?:\s+long)?)\s+)?([A-Za-z_]\w*)\s*(\+)?=\s*([^=].*?)\s*;$")
        .unwrap()
});
static MANIPULATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:std::)?(?:fixed|scientific|boolalpha|flush|setw\s*\(.*\)|setprecision\s*\(.*\))$")
        .unwrap()
});

pub struct CppDialect;

fn type_conversion(ty: &str) -> Option<Conversion> {
    match ty {
        "int" | "long" | "long long" | "short" | "unsigned" | "bool" => Some(Conversion::Int),
        "double" | "float" => Some(Conversion::Float),
        "string" | "std::string" | "char" => Some(Conversion::Text),
        _ => None,
    }
}

impl CppDialect {
    fn output_statement(chain: &str) -> Statement {
        let parts = expr::split_top_level(chain, "<<")
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty() && !MANIPULATOR_RE.is_match(part))
            .map(|part| match part {
                "endl" | "std::endl" => "\"\\n\"".to_string(),
                other => other.to_string(),
            })
            .collect();
        Statement::Output {
            parts,
            separator: String::new(),
            terminator: String::new(),
        }
    }
}

impl Dialect for CppDialect {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn syntax_rules(&self) -> SyntaxRules {
        SyntaxRules {
            line_comment: "//",
            block_comments: true,
            triple_quotes: false,
        }
    }

    fn classify(&self, line: &str) -> Statement {
        if let Some(caps) = COUT_RE.captures(line) {
            return Self::output_statement(&caps[1]);
        }
        if let Some(caps) = CIN_RE.captures(line) {
            return Statement::Input {
                targets: declared_names(&caps[1].replace(">>", ",")),
                conversion: None,
                prompt: None,
            };
        }
        if let Some(caps) = GETLINE_RE.captures(line) {
            return Statement::Input {
                targets: vec![caps[1].to_string()],
                conversion: Some(Conversion::Text),
                prompt: None,
            };
        }
        if let Some(caps) = DECLARE_RE.captures(line) {
            return Statement::Declaration {
                names: declared_names(&caps[2]),
                conversion: type_conversion(&caps[1]).unwrap_or(Conversion::Text),
            };
        }
        if let Some(caps) = ASSIGN_RE.captures(line) {
            let name = caps[2].to_string();
            let rhs = caps[4].trim();
            let expr = if caps.get(3).is_some() {
                format!("{} + ({})", name, rhs)
            } else {
                // numeric declarations keep their type for later `cin` reads
                match caps.get(1).and_then(|ty| type_conversion(ty.as_str())) {
                    Some(Conversion::Int) => format!("int({})", rhs),
                    Some(Conversion::Float) => format!("float({})", rhs),
                    _ => rhs.to_string(),
                }
            };
            return Statement::Assignment { name, expr };
        }
        Statement::Unrecognized
    }

    fn syntax_diagnostic(&self, issue: &SyntaxIssue, source_line: &str) -> String {
        format!(
            "main.cpp:{}: error: {}\n    {}\n",
            issue.line, issue.message, source_line
        )
    }

    fn runtime_error(&self, line: usize, fault: &Fault) -> String {
        match fault {
            Fault::Conversion { raw, target } => {
                let kind = match target {
                    Conversion::Float => "a floating-point value",
                    _ => "an integer",
                };
                format!(
                    "main.cpp:{}: runtime error: cin could not read '{}' as {}, value set to 0",
                    line, raw, kind
                )
            }
            Fault::EndOfInput => {
                format!("main.cpp:{}: runtime error: cin reached end of input", line)
            }
        }
    }
}
