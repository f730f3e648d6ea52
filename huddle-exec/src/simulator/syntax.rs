//! Bracket and quote balance checks run before any line is interpreted.

/// Lexical conventions of a language, as far as the balance scan needs them
#[derive(Debug, Clone, Copy)]
pub struct SyntaxRules {
    pub line_comment: &'static str,
    pub block_comments: bool,
    pub triple_quotes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    /// 1-based source line
    pub line: usize,
    pub message: String,
}

impl SyntaxIssue {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy)]
enum Mode {
    Code,
    Str { quote: char, triple: bool, line: usize },
    BlockComment { line: usize },
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

/// Scans the whole text and reports every imbalance; never stops early.
pub fn scan(code: &str, rules: SyntaxRules) -> Vec<SyntaxIssue> {
    let chars: Vec<char> = code.chars().collect();
    let mut issues = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut mode = Mode::Code;
    let mut line = 1;
    let mut i = 0;
    let comment: Vec<char> = rules.line_comment.chars().collect();

    while i < chars.len() {
        let c = chars[i];
        match mode {
            Mode::Code => {
                if !comment.is_empty() && chars[i..].starts_with(&comment) {
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
                if rules.block_comments && chars[i..].starts_with(&['/', '*']) {
                    mode = Mode::BlockComment { line };
                    i += 2;
                    continue;
                }
                match c {
                    '"' | '\'' => {
                        let triple = rules.triple_quotes && chars[i..].starts_with(&[c, c, c]);
                        mode = Mode::Str {
                            quote: c,
                            triple,
                            line,
                        };
                        if triple {
                            i += 2;
                        }
                    }
                    '(' | '[' | '{' => stack.push((c, line)),
                    ')' | ']' | '}' => match stack.last() {
                        Some(&(open, _)) if closing(open) == c => {
                            stack.pop();
                        }
                        Some(&(open, open_line)) => {
                            issues.push(SyntaxIssue::new(
                                line,
                                format!(
                                    "closing '{}' does not match opening '{}' on line {}",
                                    c, open, open_line
                                ),
                            ));
                            stack.pop();
                        }
                        None => issues.push(SyntaxIssue::new(line, format!("unmatched '{}'", c))),
                    },
                    _ => {}
                }
            }
            Mode::Str {
                quote,
                triple,
                line: start,
            } => {
                if c == '\\' {
                    if chars.get(i + 1) == Some(&'\n') {
                        line += 1;
                    }
                    i += 2;
                    continue;
                }
                if triple {
                    if chars[i..].starts_with(&[quote, quote, quote]) {
                        mode = Mode::Code;
                        i += 3;
                        continue;
                    }
                } else if c == quote {
                    mode = Mode::Code;
                } else if c == '\n' {
                    issues.push(SyntaxIssue::new(start, "unterminated string literal"));
                    mode = Mode::Code;
                }
            }
            Mode::BlockComment { .. } => {
                if chars[i..].starts_with(&['*', '/']) {
                    mode = Mode::Code;
                    i += 2;
                    continue;
                }
            }
        }
        if c == '\n' {
            line += 1;
        }
        i += 1;
    }

    match mode {
        Mode::Str {
            triple: true,
            line: start,
            ..
        } => issues.push(SyntaxIssue::new(
            start,
            "unterminated triple-quoted string literal",
        )),
        Mode::Str { line: start, .. } => {
            issues.push(SyntaxIssue::new(start, "unterminated string literal"))
        }
        Mode::BlockComment { line: start } => {
            issues.push(SyntaxIssue::new(start, "unterminated comment"))
        }
        Mode::Code => {}
    }

    for (open, open_line) in stack {
        issues.push(SyntaxIssue::new(
            open_line,
            format!("'{}' was never closed", open),
        ));
    }

    issues.sort_by_key(|issue| issue.line);
    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYTHON: SyntaxRules = SyntaxRules {
        line_comment: "#",
        block_comments: false,
        triple_quotes: true,
    };
    const C_FAMILY: SyntaxRules = SyntaxRules {
        line_comment: "//",
        block_comments: true,
        triple_quotes: false,
    };

    #[test]
    fn test_balanced_code_is_clean() {
        let code = "x = [1, (2 + 3)]\nprint(\"(not a bracket\")  # ) either\n";
        assert!(scan(code, PYTHON).is_empty());
    }

    #[test]
    fn test_unclosed_paren() {
        let issues = scan("print(\"hi\"\nx = 1\n", PYTHON);
        assert_eq!(
            issues,
            vec![SyntaxIssue::new(1, "'(' was never closed")]
        );
    }

    #[test]
    fn test_scan_continues_after_first_issue() {
        let issues = scan("a = )\nb = \"open\nc = (\n", PYTHON);
        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].message, "unmatched ')'");
        assert_eq!(issues[1].message, "unterminated string literal");
        assert_eq!(issues[2].line, 3);
    }

    #[test]
    fn test_triple_quotes_span_lines() {
        assert!(scan("s = \"\"\"a\n(b\n\"\"\"\n", PYTHON).is_empty());
        let issues = scan("s = '''never closed\n", PYTHON);
        assert_eq!(issues[0].message, "unterminated triple-quoted string literal");
    }

    #[test]
    fn test_c_family_comments_and_braces() {
        let code = "int main() {\n  /* { */ int x = 1; // }\n  return 0;\n}\n";
        assert!(scan(code, C_FAMILY).is_empty());

        let issues = scan("class A {\n  void f() {\n}\n", C_FAMILY);
        assert_eq!(issues, vec![SyntaxIssue::new(1, "'{' was never closed")]);
    }

    #[test]
    fn test_mismatched_pair() {
        let issues = scan("x = (1]\n", C_FAMILY);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("does not match"));
    }
}
