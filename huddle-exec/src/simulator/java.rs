use regex::Regex;
use std::sync::LazyLock;

use super::{
    declared_names, syntax::SyntaxRules, Conversion, Dialect, Fault, Statement, SyntaxIssue,
};
use crate::types::Language;

static PRINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^System\.out\.(println|print)\s*\((.*)\)\s*;$").unwrap()
});
static SCANNER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:final\s+)?[A-Za-z_][\w<>\[\]]*\s+)?([A-Za-z_]\w*)\s*=\s*(?:(Integer\.parseInt|Double\.parseDouble)\s*\(\s*)?[A-Za-z_]\w*\.(nextLine|next|nextInt|nextLong|nextDouble|nextFloat)\s*\(\s*\)\s*\)?\s*;$",
    )
    .unwrap()
});
static DECLARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:final\s+)?(int|long|short|byte|double|float|String|char)\s+([\w\s,]+);$")
        .unwrap()
});
static ASSIGN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:final\s+)?[A-Za-z_][\w<>\[\]]*\s+)?([A-Za-z_]\w*)\s*(\+)?=\s*([^=].*?)\s*;$")
        .unwrap()
});

pub struct JavaDialect;

fn conversion_for(method: &str, wrapper: Option<&str>) -> Conversion {
    match (wrapper, method) {
        (Some("Integer.parseInt"), _) => Conversion::Int,
        (Some(_), _) => Conversion::Float,
        (None, "nextInt" | "nextLong") => Conversion::Int,
        (None, "nextDouble" | "nextFloat") => Conversion::Float,
        _ => Conversion::Text,
    }
}

impl Dialect for JavaDialect {
    fn language(&self) -> Language {
        Language::Java
    }

    fn syntax_rules(&self) -> SyntaxRules {
        SyntaxRules {
            line_comment: "//",
            block_comments: true,
            triple_quotes: false,
        }
    }

    fn classify(&self, line: &str) -> Statement {
        if let Some(caps) = PRINT_RE.captures(line) {
            let arg = caps[2].trim();
            return Statement::Output {
                parts: if arg.is_empty() {
                    Vec::new()
                } else {
                    vec![arg.to_string()]
                },
                separator: String::new(),
                terminator: if &caps[1] == "println" { "\n" } else { "" }.to_string(),
            };
        }
        if let Some(caps) = SCANNER_RE.captures(line) {
            return Statement::Input {
                targets: vec![caps[1].to_string()],
                conversion: Some(conversion_for(
                    &caps[3],
                    caps.get(2).map(|m| m.as_str()),
                )),
                prompt: None,
            };
        }
        if let Some(caps) = DECLARE_RE.captures(line) {
            let conversion = match &caps[1] {
                "String" | "char" => Conversion::Text,
                "double" | "float" => Conversion::Float,
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
            "Main.java:{}: error: {}\n    {}\n",
            issue.line, issue.message, source_line
        )
    }

    fn syntax_report(&self, diagnostics: &[String]) -> String {
        let count = diagnostics.len();
        format!(
            "{}{} error{}\n",
            diagnostics.concat(),
            count,
            if count == 1 { "" } else { "s" }
        )
    }

    fn runtime_error(&self, line: usize, fault: &Fault) -> String {
        let exception = match fault {
            Fault::Conversion { raw, .. } => {
                format!("java.util.InputMismatchException: For input string: \"{}\"", raw)
            }
            Fault::EndOfInput => "java.util.NoSuchElementException: No line found".to_string(),
        };
        format!(
            "Exception in thread \"main\" {}\n\tat Main.main(Main.java:{})",
            exception, line
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::simulate;
    use crate::types::{ExecutionResult, StatusKind};

    const GREETER: &str = r#"import java.util.Scanner;

public class Main {
    public static void main(String[] args) {
        Scanner sc = new Scanner(System.in);
        System.out.print("Name: ");
        String name = sc.nextLine();
        int age = sc.nextInt();
        System.out.println("Hello, " + name + "!");
        System.out.println("Next year: " + (age + 1));
    }
}
"#;

    fn run(code: &str, input: &[&str]) -> ExecutionResult {
        let stdin: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        simulate(&JavaDialect, code, &stdin)
    }

    #[test]
    fn test_classify_scanner_reads() {
        let d = JavaDialect;
        assert_eq!(
            d.classify("int n = Integer.parseInt(sc.nextLine());"),
            Statement::Input {
                targets: vec!["n".into()],
                conversion: Some(Conversion::Int),
                prompt: None,
            }
        );
        assert_eq!(
            d.classify("double d = input.nextDouble();"),
            Statement::Input {
                targets: vec!["d".into()],
                conversion: Some(Conversion::Float),
                prompt: None,
            }
        );
        assert_eq!(
            d.classify("Scanner sc = new Scanner(System.in);"),
            Statement::Assignment {
                name: "sc".into(),
                expr: "new Scanner(System.in)".into()
            }
        );
    }

    #[test]
    fn test_greeter_program() {
        let result = run(GREETER, &["Ann", "29"]);
        assert_eq!(result.status, StatusKind::Success);
        assert!(result.report.starts_with("Java (simulated)\n"));
        assert!(result
            .report
            .contains("Name: Hello, Ann!\nNext year: 30\n"));
    }

    #[test]
    fn test_bad_number_reports_exception() {
        let result = run(GREETER, &["Ann", "old"]);
        assert_eq!(result.status, StatusKind::RuntimeError);
        assert!(result
            .report
            .contains("java.util.InputMismatchException: For input string: \"old\""));
        assert!(result.report.contains("at Main.main(Main.java:8)"));
    }

    #[test]
    fn test_missing_brace_is_compile_error() {
        let code = "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"hi\");\n    }\n";
        let result = run(code, &[]);
        assert_eq!(result.status, StatusKind::CompileError);
        assert!(result.report.starts_with("Main.java:1: error: '{' was never closed"));
        assert!(result.report.ends_with("1 error\n"));
    }

    #[test]
    fn test_compound_assignment() {
        let code = "int total = 1;\ntotal += 2;\nString s = \"t=\";\ns += total;\nSystem.out.println(s);\n";
        let result = run(code, &[]);
        assert!(result.report.contains("\nt=3\n"));
    }
}
