//! Script formatter.
//!
//! Re-renders a parsed script with normalized indentation. The contract
//! is AST stability: `parse(format(s))` equals `parse(s)` for any source
//! that parses.

use crate::ast::types::*;
use crate::parser::{parse, ParseError};

#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Spaces per indentation level.
    pub indent: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Format shell source, normalizing whitespace and indentation.
pub fn format_source(source: &str, options: &FormatOptions) -> Result<String, ParseError> {
    let script = parse(source)?;
    let mut f = Formatter::new(options.indent);
    f.script(&script, 0);
    Ok(f.finish())
}

struct Formatter {
    out: String,
    indent: usize,
    /// Heredocs whose bodies must follow the current line.
    pending_heredocs: Vec<HereDoc>,
}

impl Formatter {
    fn new(indent: usize) -> Self {
        Self { out: String::new(), indent, pending_heredocs: Vec::new() }
    }

    fn finish(self) -> String {
        self.out
    }

    fn pad(&mut self, level: usize) {
        for _ in 0..level * self.indent {
            self.out.push(' ');
        }
    }

    fn line_end(&mut self) {
        self.out.push('\n');
        // Heredoc bodies follow the command line that opened them.
        let pending = std::mem::take(&mut self.pending_heredocs);
        for h in pending {
            self.out.push_str(&heredoc_body_text(&h));
            self.out.push_str(&h.delimiter);
            self.out.push('\n');
        }
    }

    fn script(&mut self, script: &Script, level: usize) {
        for stmt in &script.statements {
            self.pad(level);
            let text = self.statement(stmt, level);
            self.out.push_str(&text);
            self.line_end();
        }
    }

    fn statement(&mut self, stmt: &Statement, level: usize) -> String {
        let mut out = String::new();
        for (i, pipeline) in stmt.pipelines.iter().enumerate() {
            if i > 0 {
                out.push_str(match stmt.operators[i - 1] {
                    ListOp::And => " && ",
                    ListOp::Or => " || ",
                    ListOp::Seq => "; ",
                });
            }
            out.push_str(&self.pipeline(pipeline, level));
        }
        if stmt.background {
            out.push_str(" &");
        }
        out
    }

    fn pipeline(&mut self, pipeline: &Pipeline, level: usize) -> String {
        let mut out = String::new();
        if pipeline.negated {
            out.push_str("! ");
        }
        for (i, cmd) in pipeline.commands.iter().enumerate() {
            if i > 0 {
                out.push_str(" | ");
            }
            out.push_str(&self.command(cmd, level));
        }
        out
    }

    fn command(&mut self, cmd: &Command, level: usize) -> String {
        match cmd {
            Command::Simple(simple) => self.simple_command(simple),
            Command::Compound(compound) => self.compound(compound, level),
            Command::FunctionDef(def) => {
                let mut out = format!("{}() ", def.name);
                out.push_str(&self.compound(&def.body, level));
                out.push_str(&self.redirections(&def.redirections));
                out
            }
        }
    }

    fn simple_command(&mut self, cmd: &SimpleCommand) -> String {
        let mut parts = Vec::new();
        for a in &cmd.assignments {
            parts.push(self.assignment(a));
        }
        if let Some(name) = &cmd.name {
            parts.push(word_text(name));
        }
        for arg in &cmd.args {
            parts.push(word_text(arg));
        }
        let mut out = parts.join(" ");
        out.push_str(&self.redirections(&cmd.redirections));
        out
    }

    fn assignment(&mut self, a: &Assignment) -> String {
        let op = if a.append { "+=" } else { "=" };
        match (&a.array, &a.value) {
            (Some(items), _) => {
                let rendered: Vec<String> = items.iter().map(word_text).collect();
                format!("{}{}({})", a.name, op, rendered.join(" "))
            }
            (None, Some(value)) => format!("{}{}{}", a.name, op, word_text(value)),
            (None, None) => format!("{}{}", a.name, op),
        }
    }

    fn redirections(&mut self, redirections: &[Redirection]) -> String {
        let mut out = String::new();
        for r in redirections {
            out.push(' ');
            if let Some(fd) = r.fd {
                out.push_str(&fd.to_string());
            }
            out.push_str(&r.op.to_string());
            match &r.target {
                RedirTarget::Word(w) => {
                    out.push_str(&word_text(w));
                }
                RedirTarget::HereDoc(h) => {
                    if h.quoted {
                        out.push('\'');
                        out.push_str(&h.delimiter);
                        out.push('\'');
                    } else {
                        out.push_str(&h.delimiter);
                    }
                    self.pending_heredocs.push(h.clone());
                }
            }
        }
        out
    }

    fn compound(&mut self, compound: &CompoundCommand, level: usize) -> String {
        match compound {
            CompoundCommand::If(node) => {
                let mut out = String::new();
                for (i, branch) in node.branches.iter().enumerate() {
                    out.push_str(if i == 0 { "if " } else { "elif " });
                    out.push_str(&self.inline_statements(&branch.condition, level));
                    out.push_str("; then");
                    self.nl(&mut out);
                    out.push_str(&self.block_text(&branch.body, level + 1));
                    self.pad_into(&mut out, level);
                }
                if let Some(else_body) = &node.else_body {
                    out.push_str("else");
                    self.nl(&mut out);
                    out.push_str(&self.block_text(else_body, level + 1));
                    self.pad_into(&mut out, level);
                }
                out.push_str("fi");
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::For(node) => {
                let mut out = format!("for {}", node.variable);
                if let Some(words) = &node.words {
                    out.push_str(" in");
                    for w in words {
                        out.push(' ');
                        out.push_str(&word_text(w));
                    }
                }
                out.push_str("; do");
                self.nl(&mut out);
                out.push_str(&self.block_text(&node.body, level + 1));
                self.pad_into(&mut out, level);
                out.push_str("done");
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::CStyleFor(node) => {
                let sec = |e: &Option<ArithExpr>| e.as_ref().map(arith_text).unwrap_or_default();
                let mut out = format!(
                    "for (({}; {}; {})); do",
                    sec(&node.init),
                    sec(&node.condition),
                    sec(&node.update)
                );
                self.nl(&mut out);
                out.push_str(&self.block_text(&node.body, level + 1));
                self.pad_into(&mut out, level);
                out.push_str("done");
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::While(node) => {
                let cond = self.inline_statements(&node.condition, level);
                let mut out = format!("while {}; do", cond);
                self.nl(&mut out);
                out.push_str(&self.block_text(&node.body, level + 1));
                self.pad_into(&mut out, level);
                out.push_str("done");
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::Until(node) => {
                let cond = self.inline_statements(&node.condition, level);
                let mut out = format!("until {}; do", cond);
                self.nl(&mut out);
                out.push_str(&self.block_text(&node.body, level + 1));
                self.pad_into(&mut out, level);
                out.push_str("done");
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::Case(node) => {
                let mut out = format!("case {} in", word_text(&node.subject));
                self.nl(&mut out);
                for arm in &node.arms {
                    self.pad_into(&mut out, level + 1);
                    let patterns: Vec<String> = arm.patterns.iter().map(word_text).collect();
                    out.push_str(&patterns.join(" | "));
                    out.push(')');
                    self.nl(&mut out);
                    out.push_str(&self.block_text(&arm.body, level + 2));
                    self.pad_into(&mut out, level + 2);
                    out.push_str(match arm.terminator {
                        CaseTerminator::Break => ";;",
                        CaseTerminator::FallThrough => ";&",
                        CaseTerminator::Continue => ";;&",
                    });
                    self.nl(&mut out);
                }
                self.pad_into(&mut out, level);
                out.push_str("esac");
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::Subshell(node) => {
                let mut out = format!("({})", self.inline_statements(&node.body, level));
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::Group(node) => {
                let mut out = format!("{{ {}; }}", self.inline_statements(&node.body, level));
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::Arith(node) => {
                let mut out = format!("(({}))", arith_text(&node.expr));
                out.push_str(&self.redirections(&node.redirections));
                out
            }
            CompoundCommand::Cond(node) => {
                let mut out = format!("[[ {} ]]", cond_text(&node.expr));
                out.push_str(&self.redirections(&node.redirections));
                out
            }
        }
    }

    fn pad_into(&self, out: &mut String, level: usize) {
        for _ in 0..level * self.indent {
            out.push(' ');
        }
    }

    /// Newline plus any here-document bodies opened on the line just
    /// written. Bodies must directly follow the first newline after
    /// their operator or reparsing would mis-associate them.
    fn nl(&mut self, out: &mut String) {
        out.push('\n');
        let pending = std::mem::take(&mut self.pending_heredocs);
        for h in pending {
            out.push_str(&heredoc_body_text(&h));
            out.push_str(&h.delimiter);
            out.push('\n');
        }
    }

    fn inline_statements(&mut self, statements: &[Statement], level: usize) -> String {
        let rendered: Vec<String> =
            statements.iter().map(|s| self.statement(s, level)).collect();
        rendered.join("; ")
    }

    fn block_text(&mut self, statements: &[Statement], level: usize) -> String {
        let mut block = String::new();
        for stmt in statements {
            let text = self.statement(stmt, level);
            for _ in 0..level * self.indent {
                block.push(' ');
            }
            block.push_str(&text);
            self.nl(&mut block);
        }
        block
    }
}

// =============================================================================
// Word rendering
// =============================================================================

pub(crate) fn word_text(word: &Word) -> String {
    word.parts.iter().map(part_text).collect()
}

fn part_text(part: &WordPart) -> String {
    match part {
        WordPart::Literal(s) | WordPart::Glob(s) => s.clone(),
        WordPart::SingleQuoted(s) => single_quote(s),
        WordPart::DoubleQuoted(parts) => {
            let inner: String = parts.iter().map(part_text).collect();
            format!("\"{}\"", inner)
        }
        WordPart::Escaped(s) => format!("\\{}", s),
        WordPart::ParamExpansion(pe) => param_text(pe),
        WordPart::CommandSubstitution { body, legacy } => {
            let inner = script_inline(body);
            if *legacy {
                format!("`{}`", inner)
            } else {
                format!("$({})", inner)
            }
        }
        WordPart::ArithExpansion(expr) => format!("$(({}))", arith_text(expr)),
        WordPart::ProcessSubstitution { body, direction } => {
            let ch = match direction {
                ProcessDirection::In => '<',
                ProcessDirection::Out => '>',
            };
            format!("{}({})", ch, script_inline(body))
        }
        WordPart::BraceExpansion(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| match item {
                    BraceItem::Word(w) => word_text(w),
                    BraceItem::NumberRange { start, end, step, width } => {
                        let fmt_n = |n: i64| {
                            if *width > 0 {
                                format!("{:0width$}", n, width = *width)
                            } else {
                                n.to_string()
                            }
                        };
                        if *step == 1 {
                            format!("{}..{}", fmt_n(*start), fmt_n(*end))
                        } else {
                            format!("{}..{}..{}", fmt_n(*start), fmt_n(*end), step)
                        }
                    }
                    BraceItem::CharRange { start, end, step } => {
                        if *step == 1 {
                            format!("{}..{}", start, end)
                        } else {
                            format!("{}..{}..{}", start, end, step)
                        }
                    }
                })
                .collect();
            format!("{{{}}}", rendered.join(","))
        }
        WordPart::TildeExpansion { user } => match user {
            Some(u) => format!("~{}", u),
            None => "~".to_string(),
        },
    }
}

fn single_quote(s: &str) -> String {
    if s.contains('\'') {
        // 'a'\''b' keeps an embedded single quote literal
        let escaped = s.replace('\'', "'\\''");
        format!("'{}'", escaped)
    } else {
        format!("'{}'", s)
    }
}

fn param_text(pe: &ParamExpansion) -> String {
    let name = &pe.name;
    match &pe.op {
        None => format!("${{{}}}", name),
        Some(op) => {
            let body = match op {
                ParamOp::DefaultValue { word, check_empty } => {
                    format!("{}{}{}", name, if *check_empty { ":-" } else { "-" }, word_text(word))
                }
                ParamOp::AssignDefault { word, check_empty } => {
                    format!("{}{}{}", name, if *check_empty { ":=" } else { "=" }, word_text(word))
                }
                ParamOp::ErrorIfUnset { word, check_empty } => {
                    let msg = word.as_ref().map(word_text).unwrap_or_default();
                    format!("{}{}{}", name, if *check_empty { ":?" } else { "?" }, msg)
                }
                ParamOp::UseAlternative { word, check_empty } => {
                    format!("{}{}{}", name, if *check_empty { ":+" } else { "+" }, word_text(word))
                }
                ParamOp::Length => format!("#{}", name),
                ParamOp::Substring { offset, length } => match length {
                    Some(len) => format!("{}:{}:{}", name, arith_text(offset), arith_text(len)),
                    None => format!("{}:{}", name, arith_text(offset)),
                },
                ParamOp::PatternRemoval { pattern, side, greedy } => {
                    let op_str = match (side, greedy) {
                        (PatternSide::Prefix, false) => "#",
                        (PatternSide::Prefix, true) => "##",
                        (PatternSide::Suffix, false) => "%",
                        (PatternSide::Suffix, true) => "%%",
                    };
                    format!("{}{}{}", name, op_str, word_text(pattern))
                }
                ParamOp::PatternReplacement { pattern, replacement, all, anchor } => {
                    let lead = match (all, anchor) {
                        (true, _) => "//".to_string(),
                        (false, PatternAnchor::Start) => "/#".to_string(),
                        (false, PatternAnchor::End) => "/%".to_string(),
                        (false, PatternAnchor::None) => "/".to_string(),
                    };
                    match replacement {
                        Some(r) => format!("{}{}{}/{}", name, lead, word_text(pattern), word_text(r)),
                        None => format!("{}{}{}", name, lead, word_text(pattern)),
                    }
                }
                ParamOp::CaseModification { upper, all, pattern } => {
                    let op_str = match (upper, all) {
                        (true, false) => "^",
                        (true, true) => "^^",
                        (false, false) => ",",
                        (false, true) => ",,",
                    };
                    let pat = pattern.as_ref().map(word_text).unwrap_or_default();
                    format!("{}{}{}", name, op_str, pat)
                }
                ParamOp::Indirection => format!("!{}", name),
            };
            format!("${{{}}}", body)
        }
    }
}

fn script_inline(script: &Script) -> String {
    let mut f = Formatter::new(0);
    let rendered: Vec<String> = script
        .statements
        .iter()
        .map(|s| f.statement(s, 0))
        .collect();
    rendered.join("; ")
}

fn heredoc_body_text(h: &HereDoc) -> String {
    match &h.body.parts[..] {
        [WordPart::Literal(text)] => text.clone(),
        [WordPart::DoubleQuoted(parts)] => parts.iter().map(part_text).collect(),
        parts => parts.iter().map(part_text).collect(),
    }
}

// =============================================================================
// Arithmetic and conditional rendering
// =============================================================================

fn arith_bin_op_text(op: ArithBinOp) -> &'static str {
    match op {
        ArithBinOp::Add => "+",
        ArithBinOp::Sub => "-",
        ArithBinOp::Mul => "*",
        ArithBinOp::Div => "/",
        ArithBinOp::Mod => "%",
        ArithBinOp::Pow => "**",
        ArithBinOp::Shl => "<<",
        ArithBinOp::Shr => ">>",
        ArithBinOp::Lt => "<",
        ArithBinOp::Le => "<=",
        ArithBinOp::Gt => ">",
        ArithBinOp::Ge => ">=",
        ArithBinOp::Eq => "==",
        ArithBinOp::Ne => "!=",
        ArithBinOp::BitAnd => "&",
        ArithBinOp::BitOr => "|",
        ArithBinOp::BitXor => "^",
        ArithBinOp::LogicalAnd => "&&",
        ArithBinOp::LogicalOr => "||",
        ArithBinOp::Comma => ",",
    }
}

pub(crate) fn arith_text(expr: &ArithExpr) -> String {
    match expr {
        ArithExpr::Number(n) => n.to_string(),
        ArithExpr::Var(name) => name.clone(),
        ArithExpr::Element { name, index } => format!("{}[{}]", name, arith_text(index)),
        ArithExpr::Binary { op, lhs, rhs } => {
            if *op == ArithBinOp::Comma {
                format!("{}, {}", arith_text(lhs), arith_text(rhs))
            } else {
                format!("{} {} {}", arith_text(lhs), arith_bin_op_text(*op), arith_text(rhs))
            }
        }
        ArithExpr::Unary { op, operand, prefix } => {
            let op_str = match op {
                ArithUnOp::Neg => "-",
                ArithUnOp::Plus => "+",
                ArithUnOp::Not => "!",
                ArithUnOp::BitNot => "~",
                ArithUnOp::Inc => "++",
                ArithUnOp::Dec => "--",
            };
            if *prefix {
                format!("{}{}", op_str, arith_text(operand))
            } else {
                format!("{}{}", arith_text(operand), op_str)
            }
        }
        ArithExpr::Ternary { cond, then, otherwise } => {
            format!("{} ? {} : {}", arith_text(cond), arith_text(then), arith_text(otherwise))
        }
        ArithExpr::Assign { op, name, index, value } => {
            let op_str = match op {
                ArithAssignOp::Assign => "=",
                ArithAssignOp::Add => "+=",
                ArithAssignOp::Sub => "-=",
                ArithAssignOp::Mul => "*=",
                ArithAssignOp::Div => "/=",
                ArithAssignOp::Mod => "%=",
                ArithAssignOp::Shl => "<<=",
                ArithAssignOp::Shr => ">>=",
                ArithAssignOp::And => "&=",
                ArithAssignOp::Or => "|=",
                ArithAssignOp::Xor => "^=",
            };
            let lhs = match index {
                Some(i) => format!("{}[{}]", name, arith_text(i)),
                None => name.clone(),
            };
            format!("{} {} {}", lhs, op_str, arith_text(value))
        }
        ArithExpr::Group(inner) => format!("({})", arith_text(inner)),
    }
}

fn cond_text(expr: &CondExpr) -> String {
    match expr {
        CondExpr::Binary { op, lhs, rhs } => {
            let op_str = match op {
                CondBinOp::StrEq => "==",
                CondBinOp::StrNe => "!=",
                CondBinOp::Match => "=~",
                CondBinOp::StrLt => "<",
                CondBinOp::StrGt => ">",
                CondBinOp::IntEq => "-eq",
                CondBinOp::IntNe => "-ne",
                CondBinOp::IntLt => "-lt",
                CondBinOp::IntLe => "-le",
                CondBinOp::IntGt => "-gt",
                CondBinOp::IntGe => "-ge",
                CondBinOp::NewerThan => "-nt",
                CondBinOp::OlderThan => "-ot",
                CondBinOp::SameFile => "-ef",
            };
            format!("{} {} {}", word_text(lhs), op_str, word_text(rhs))
        }
        CondExpr::Unary { op, operand } => {
            let op_str = match op {
                CondUnOp::Exists => "-e",
                CondUnOp::IsFile => "-f",
                CondUnOp::IsDir => "-d",
                CondUnOp::Readable => "-r",
                CondUnOp::Writable => "-w",
                CondUnOp::Executable => "-x",
                CondUnOp::NonEmptyFile => "-s",
                CondUnOp::IsSymlink => "-L",
                CondUnOp::ZeroLength => "-z",
                CondUnOp::NonZeroLength => "-n",
                CondUnOp::VarSet => "-v",
            };
            format!("{} {}", op_str, word_text(operand))
        }
        CondExpr::Not(inner) => format!("! {}", cond_text(inner)),
        CondExpr::And(lhs, rhs) => format!("{} && {}", cond_text(lhs), cond_text(rhs)),
        CondExpr::Or(lhs, rhs) => format!("{} || {}", cond_text(lhs), cond_text(rhs)),
        CondExpr::Group(inner) => format!("( {} )", cond_text(inner)),
        CondExpr::Word(w) => word_text(w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(src: &str) {
        let formatted = format_source(src, &FormatOptions::default()).unwrap();
        let original = parse(src).unwrap();
        let reparsed = parse(&formatted)
            .unwrap_or_else(|e| panic!("formatted output failed to parse: {}\n{}", e, formatted));
        assert_eq!(original, reparsed, "AST changed:\n{}", formatted);
    }

    #[test]
    fn roundtrip_simple() {
        roundtrip("echo   hello    world");
        roundtrip("echo 'a b' \"c $v d\"");
    }

    #[test]
    fn roundtrip_operators() {
        roundtrip("true && echo yes || echo no");
        roundtrip("echo a; echo b");
        roundtrip("! cat f | wc -l");
    }

    #[test]
    fn roundtrip_control_flow() {
        roundtrip("if true; then echo yes; else echo no; fi");
        roundtrip("for i in 1 2 3; do echo $i; done");
        roundtrip("while [ $i -lt 3 ]; do i=$((i+1)); done");
        roundtrip("case $x in a) echo a ;; *) echo other ;; esac");
    }

    #[test]
    fn roundtrip_expansions() {
        roundtrip("echo ${v:-default} ${#v} ${v%.*} ${v/a/b}");
        roundtrip("echo $(date) `hostname` $((1 + 2 * 3))");
        roundtrip("echo {a,b,c} {1..5}");
    }

    #[test]
    fn roundtrip_redirections() {
        roundtrip("cmd > out 2>&1 < in");
        roundtrip("cmd >> log");
        roundtrip("cat <<< \"here string\"");
    }

    #[test]
    fn roundtrip_heredoc() {
        roundtrip("cat <<EOF\nline one $v\nline two\nEOF\n");
        roundtrip("cat <<'EOF'\nliteral $v\nEOF\n");
    }

    #[test]
    fn roundtrip_functions() {
        roundtrip("greet() { echo hello; }");
    }

    #[test]
    fn roundtrip_cond_and_arith() {
        roundtrip("[[ -f file && $x == y* ]]");
        roundtrip("(( x += 2 ))");
        roundtrip("for ((i=0; i<10; i++)); do echo $i; done");
    }

    #[test]
    fn indentation_is_applied() {
        let out = format_source(
            "if true; then echo a; fi",
            &FormatOptions { indent: 4 },
        )
        .unwrap();
        assert!(out.contains("\n    echo a\n"), "got: {}", out);
    }

    #[test]
    fn parse_error_propagates() {
        assert!(format_source("if true; then", &FormatOptions::default()).is_err());
    }
}
