//! Expression resolution for the line simulators.
//!
//! Only literals, known variables, a handful of conversion calls and
//! interpolated strings are understood. Everything else resolves to `None`.

use regex::Regex;
use std::sync::LazyLock;

use crate::context::{ExecutionContext, Value};

const MAX_DEPTH: usize = 32;

static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_][\w.:]*)\s*\((.*)\)$").unwrap());
static METHOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\.(ToString|toString)\s*\(\s*\)$").unwrap());
static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z_]\w*$").unwrap());

/// Splits `text` at every top-level occurrence of `sep`, ignoring separators
/// inside quotes and brackets.
pub fn split_top_level<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ if depth == 0 && text[i..].starts_with(sep) => {
                parts.push(&text[start..i]);
                start = i + sep.len();
                for _ in 1..sep.chars().count() {
                    iter.next();
                }
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Left-to-right `+` fold over literals and known variables.
pub fn eval(expr: &str, ctx: &ExecutionContext) -> Option<Value> {
    eval_depth(expr, ctx, 0)
}

/// Resolves `expr` for display.
///
/// When the fold fails, each top-level operand is rendered on its own and
/// the pieces are concatenated in source order. Inside an operand that does
/// not resolve, only quoted literals and known variables are kept.
pub fn render(expr: &str, ctx: &ExecutionContext) -> String {
    if let Some(value) = eval(expr, ctx) {
        return value.to_string();
    }
    split_top_level(expr, "+")
        .into_iter()
        .map(|token| match operand(token, ctx, 0) {
            Some(value) => value.to_string(),
            None => salvage(token, ctx),
        })
        .collect()
}

/// Quoted literals and known variables of `token`, in source order
fn salvage(token: &str, ctx: &ExecutionContext) -> String {
    let mut out = String::new();
    let mut rest = token;

    while let Some(c) = rest.chars().next() {
        if c == '"' || c == '\'' {
            let end = literal_end(rest, c);
            let literal = &rest[..end];
            if let Some(text) = string_literal(literal) {
                out.push_str(&text);
            }
            rest = &rest[end..];
        } else if c.is_alphabetic() || c == '_' {
            let end = rest
                .find(|ch: char| !(ch.is_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len());
            let (name, tail) = rest.split_at(end);
            if let Some(template) = interpolated_literal_prefix(name, tail) {
                let end = literal_end(tail, template);
                if let Some(text) = interpolated_literal(&rest[..name.len() + end]) {
                    out.push_str(&interpolate(&text, ctx, 0));
                }
                rest = &tail[end..];
                continue;
            }
            if let Some(value) = ctx.var(name) {
                out.push_str(&value.to_string());
            }
            rest = tail;
        } else {
            rest = &rest[c.len_utf8()..];
        }
    }
    out
}

/// Quote character when `name` is an f-string prefix directly before a literal
fn interpolated_literal_prefix(name: &str, tail: &str) -> Option<char> {
    let quote = tail.chars().next().filter(|q| *q == '"' || *q == '\'')?;
    matches!(name, "f" | "F").then_some(quote)
}

/// Byte length of the quoted literal starting at `text`, closing quote included
fn literal_end(text: &str, quote: char) -> usize {
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return i + c.len_utf8();
        }
    }
    text.len()
}

/// A call `name(args)` found in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call<'a> {
    /// Byte offset of the function name
    pub start: usize,
    /// Byte offset just past the closing parenthesis
    pub end: usize,
    pub args: &'a str,
}

/// First balanced call of `name` outside string literals
pub fn find_call<'a>(text: &'a str, name: &str) -> Option<Call<'a>> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev: Option<char> = None;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            prev = Some(c);
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        } else if text[i..].starts_with(name)
            && !prev.is_some_and(|p| p.is_alphanumeric() || p == '_' || p == '.')
        {
            let after = &text[i + name.len()..];
            let trimmed = after.trim_start();
            if trimmed.starts_with('(') {
                let open = text.len() - trimmed.len();
                if let Some(close) = matching_paren(&text[open..]) {
                    return Some(Call {
                        start: i,
                        end: open + close + 1,
                        args: &text[open + 1..open + close],
                    });
                }
                return None;
            }
        }
        prev = Some(c);
    }
    None
}

/// Offset of the `)` closing the `(` that starts `text`
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Source text of a double-quoted literal holding `text`
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn eval_depth(expr: &str, ctx: &ExecutionContext, depth: usize) -> Option<Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    let mut operands = split_top_level(expr, "+").into_iter();
    let first = operand(operands.next()?, ctx, depth)?;
    operands.try_fold(first, |acc, next| Some(acc.plus(&operand(next, ctx, depth)?)))
}

fn operand(token: &str, ctx: &ExecutionContext, depth: usize) -> Option<Value> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Some(inner) = strip_wrapping_parens(token) {
        return eval_depth(inner, ctx, depth + 1);
    }
    if let Some(text) = string_literal(token) {
        return Some(Value::Str(text));
    }
    if let Some(template) = interpolated_literal(token) {
        return Some(Value::Str(interpolate(&template, ctx, depth)));
    }
    if let Some(number) = number_literal(token) {
        return Some(number);
    }
    if IDENT_RE.is_match(token) {
        return ctx.var(token).cloned();
    }
    if let Some(caps) = METHOD_RE.captures(token) {
        return ctx.var(&caps[1]).map(|v| Value::Str(v.to_string()));
    }
    if let Some(caps) = CALL_RE.captures(token) {
        let arg = eval_depth(&caps[2], ctx, depth + 1)?;
        return convert_call(&caps[1], arg);
    }
    None
}

fn convert_call(function: &str, arg: Value) -> Option<Value> {
    match function {
        "str" | "String.valueOf" | "to_string" | "std::to_string" | "Convert.ToString" => {
            Some(Value::Str(arg.to_string()))
        }
        "int" | "Integer.parseInt" | "int.Parse" | "Convert.ToInt32" | "stoi" | "std::stoi" => {
            match arg {
                Value::Int(n) => Some(Value::Int(n)),
                Value::Float(x) => Some(Value::Int(x.trunc() as i64)),
                Value::Str(s) => s.trim().parse().ok().map(Value::Int),
            }
        }
        "float" | "Double.parseDouble" | "double.Parse" | "Convert.ToDouble" | "stod"
        | "std::stod" => match arg {
            Value::Int(n) => Some(Value::Float(n as f64)),
            Value::Float(x) => Some(Value::Float(x)),
            Value::Str(s) => parse_float(s.trim()).map(Value::Float),
        },
        _ => None,
    }
}

fn strip_wrapping_parens(token: &str) -> Option<&str> {
    let inner = token.strip_prefix('(')?.strip_suffix(')')?;
    // "(a) + (b)" must not be unwrapped
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// `"..."` or `'...'` with escapes processed
pub fn string_literal(token: &str) -> Option<String> {
    let quote = token.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let body = token.strip_prefix(quote)?.strip_suffix(quote)?;
    if token.len() < 2 || has_unescaped(body, quote) {
        return None;
    }
    Some(unescape(body))
}

/// Python `f"..."` or C# `$"..."` templates
fn interpolated_literal(token: &str) -> Option<String> {
    let rest = token
        .strip_prefix('f')
        .or_else(|| token.strip_prefix('F'))
        .or_else(|| token.strip_prefix('$'))?;
    string_literal(rest)
}

fn interpolate(template: &str, ctx: &ExecutionContext, depth: usize) -> String {
    let mut out = String::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        if let Some(stripped) = after.strip_prefix('{') {
            out.push('{');
            rest = stripped;
            continue;
        }
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let field = &after[..close];
        // drop format specs such as `{x:.2f}`
        let expr = field.split(':').next().unwrap_or(field);
        match eval_depth(expr, ctx, depth + 1) {
            Some(value) => out.push_str(&value.to_string()),
            None => {
                out.push('{');
                out.push_str(field);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(&rest.replace("}}", "}"));
    out
}

fn has_unescaped(body: &str, quote: char) -> bool {
    let mut escaped = false;
    for c in body.chars() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return true;
        }
    }
    false
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other @ ('\\' | '"' | '\'')) => out.push(other),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Integer or floating point literal, tolerating C-family type suffixes
pub fn number_literal(token: &str) -> Option<Value> {
    let first = token.chars().next()?;
    if !(first.is_ascii_digit() || first == '-' || first == '.') {
        return None;
    }
    if let Ok(n) = token.parse::<i64>() {
        return Some(Value::Int(n));
    }
    let trimmed = token.trim_end_matches(['l', 'L', 'f', 'F', 'd', 'D', 'm', 'M']);
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Value::Int(n));
    }
    parse_float(trimmed).map(Value::Float)
}

/// Float parsing limited to plain decimal notation
pub fn parse_float(text: &str) -> Option<f64> {
    let valid = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && text.chars().any(|c| c.is_ascii_digit());
    if valid {
        text.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecutionContext {
        let mut ctx = ExecutionContext::new(Vec::new());
        ctx.set_var("name", Value::Str("Ann".into()));
        ctx.set_var("age", Value::Int(30));
        ctx
    }

    #[test]
    fn test_split_respects_quotes_and_brackets() {
        assert_eq!(
            split_top_level(r#""a, b", f(x, y), 3"#, ","),
            vec![r#""a, b""#, " f(x, y)", " 3"]
        );
        assert_eq!(
            split_top_level(r#""x" << y << endl"#, "<<"),
            vec![r#""x" "#, " y ", " endl"]
        );
    }

    #[test]
    fn test_fold_is_left_to_right() {
        let ctx = ctx();
        assert_eq!(eval("1 + 2 + \"a\"", &ctx), Some(Value::Str("3a".into())));
        assert_eq!(eval("\"a\" + 1 + 2", &ctx), Some(Value::Str("a12".into())));
        assert_eq!(eval("age + 1", &ctx), Some(Value::Int(31)));
        assert_eq!(eval("(age + 1) + name", &ctx), Some(Value::Str("31Ann".into())));
    }

    #[test]
    fn test_unknown_names_do_not_resolve() {
        let ctx = ctx();
        assert_eq!(eval("missing + 1", &ctx), None);
    }

    #[test]
    fn test_render_keeps_literals_and_known_variables() {
        let ctx = ctx();
        assert_eq!(render(r#""Hello " + who + "!""#, &ctx), "Hello !");
        assert_eq!(render(r#""Hi " + name + who"#, &ctx), "Hi Ann");
        assert_eq!(render("a * b", &ctx), "");
        assert_eq!(render(r#"len(name) + " chars""#, &ctx), "Ann chars");
        assert_eq!(render(r#"who + f"{name}!""#, &ctx), "Ann!");
        assert_eq!(render(r#""it's \"ok\"" + who"#, &ctx), "it's \"ok\"");
    }

    #[test]
    fn test_find_call_is_bracket_aware() {
        let text = r#"input("a)b").strip()"#;
        let call = find_call(text, "input").unwrap();
        assert_eq!(call.start, 0);
        assert_eq!(call.args, r#""a)b""#);
        assert_eq!(&text[call.end..], ".strip()");

        let text = "int(input()) + int(input())";
        let first = find_call(text, "input").unwrap();
        assert_eq!((first.start, first.end), (4, 11));
        assert!(find_call("user_input()", "input").is_none());
        assert!(find_call("scanner.input()", "input").is_none());
        assert!(find_call(r#"print("input()")"#, "input").is_none());
    }

    #[test]
    fn test_quote_escapes() {
        let ctx = ctx();
        let source = quote(r#"say "hi" \o/"#);
        assert_eq!(eval(&source, &ctx), Some(Value::Str(r#"say "hi" \o/"#.into())));
    }

    #[test]
    fn test_literals() {
        let ctx = ctx();
        assert_eq!(eval(r#""a\tb""#, &ctx), Some(Value::Str("a\tb".into())));
        assert_eq!(eval("'single'", &ctx), Some(Value::Str("single".into())));
        assert_eq!(eval("2.5f", &ctx), Some(Value::Float(2.5)));
        assert_eq!(eval("10L", &ctx), Some(Value::Int(10)));
        assert_eq!(eval("-4", &ctx), Some(Value::Int(-4)));
    }

    #[test]
    fn test_interpolation_and_conversions() {
        let ctx = ctx();
        assert_eq!(
            eval(r#"f"{name} is {age + 1}""#, &ctx),
            Some(Value::Str("Ann is 31".into()))
        );
        assert_eq!(
            eval(r#"$"Hi {name}!""#, &ctx),
            Some(Value::Str("Hi Ann!".into()))
        );
        assert_eq!(
            eval("\"age: \" + str(age)", &ctx),
            Some(Value::Str("age: 30".into()))
        );
        assert_eq!(eval("int(\"7\")", &ctx), Some(Value::Int(7)));
        assert_eq!(eval("age.ToString()", &ctx), Some(Value::Str("30".into())));
    }

    #[test]
    fn test_deep_nesting_gives_up() {
        let ctx = ctx();
        let expr = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(eval(&expr, &ctx), None);
    }
}
