//! Test support: a small parser for the subset of source syntax the rules
//! care about, and helpers that run rules over parsed snippets.

use polish_engine::{DriverConfig, NullSink, RuleSelection, RunOutcome, compute_active_schedule, run};
use polish_syntax::printer::{print_node, print_tree};
use polish_syntax::validation::validate_tree;
use polish_syntax::{
    AssignOp, BinaryOp, ClassKind, LanguageLevel, LiteralKind, ModifierKeyword, NodeBuilder,
    NodeKind, NodeRef, PrimitiveKind, ScopeResolver, Symbol, SyntaxTree, UnaryOp,
};

// ============================================================================
// Running rules
// ============================================================================

/// Imports every snippet gets so library types resolve.
const PRELUDE: &str = "import java.util.ArrayList;
import java.util.Collection;
import java.util.HashMap;
import java.util.List;
import java.util.Map;
import java.util.Objects;
import java.util.Optional;
import java.util.Set;
";

/// Run the named rules (ids, aliases or bundles) to a fixed point.
pub fn run_rules(ids: &[&str], tree: &mut SyntaxTree) -> RunOutcome {
    let catalog = crate::catalog().expect("built-in catalog is valid");
    let selection = ids.iter().fold(
        RuleSelection::new().language_level(LanguageLevel::LATEST),
        |selection, id| selection.include(Symbol::from_dynamic(id)),
    );
    let schedule = compute_active_schedule(&catalog, &selection).expect("schedule");
    let resolver = ScopeResolver::default();
    let outcome = run(tree, &resolver, &schedule, DriverConfig::default(), &mut NullSink);
    let validation = validate_tree(tree);
    assert!(validation.is_ok(), "{validation}");
    outcome
}

/// Rewrite a whole compilation unit and print it.
pub fn check_unit(ids: &[&str], source: &str) -> String {
    let mut tree = SyntaxTree::new();
    let root = parse_unit(&mut tree, source).unwrap_or_else(|e| panic!("{e}"));
    tree.set_root(root).unwrap();
    run_rules(ids, &mut tree);
    print_tree(&tree)
}

/// Rewrite `body` inside `void m(params)` and print the method body.
pub fn check_body(ids: &[&str], params: &str, body: &str) -> String {
    let mut tree = SyntaxTree::new();
    let method = method_fixture(&mut tree, params, body);
    run_rules(ids, &mut tree);
    let body = tree.slot(method, 2).expect("method body");
    print_node(&tree, body)
}

/// Rewrite the expression statement `expr;` inside `void m(params)` and
/// print the expression.
pub fn check_expr(ids: &[&str], params: &str, expr: &str) -> String {
    let mut tree = SyntaxTree::new();
    let method = method_fixture(&mut tree, params, &format!("{expr};"));
    run_rules(ids, &mut tree);
    let body = tree.slot(method, 2).expect("method body");
    let stmt = tree.list(body)[0];
    print_node(&tree, tree.slot(stmt, 0).expect("expression"))
}

fn method_fixture(tree: &mut SyntaxTree, params: &str, body: &str) -> NodeRef {
    let source = format!("{PRELUDE}\nclass T {{\n void m({params}) {{\n{body}\n}}\n}}");
    let root = parse_unit(tree, &source).unwrap_or_else(|e| panic!("{e}"));
    tree.set_root(root).unwrap();
    let class = tree.list(root)[0];
    tree.list(class)[0]
}

/// A parsed expression as the only statement of a block root.
pub struct Fixture {
    pub tree: SyntaxTree,
    pub expr: NodeRef,
}

impl Fixture {
    pub fn expr(source: &str) -> Self {
        let mut tree = SyntaxTree::new();
        let expr = parse_expr(&mut tree, source);
        let stmt = tree.create(NodeBuilder::new(NodeKind::ExprStmt).slot(expr));
        let block = tree.create(NodeBuilder::new(NodeKind::Block).item(stmt));
        tree.set_root(block).unwrap();
        Self { tree, expr }
    }
}

/// Parse a detached expression.
pub fn parse_expr(tree: &mut SyntaxTree, source: &str) -> NodeRef {
    let mut parser = Parser::new(tree, source).unwrap_or_else(|e| panic!("{e}"));
    let expr = parser.expr().unwrap_or_else(|e| panic!("{e}"));
    assert!(parser.at_end(), "trailing input in `{source}`");
    expr
}

pub fn parse_unit(tree: &mut SyntaxTree, source: &str) -> Result<NodeRef, String> {
    let mut parser = Parser::new(tree, source)?;
    let unit = parser.unit()?;
    if !parser.at_end() {
        return Err(parser.error("end of input"));
    }
    Ok(unit)
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Ident(String),
    Int(String),
    Long(String),
    Double(String),
    Str(String),
    Char(String),
    Punct(&'static str),
}

const PUNCTS: &[&str] = &[
    ">>>=", "<<=", ">>=", ">>>", "->", "::", "++", "--", "&&", "||", "==", "!=", "<=", ">=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "(", ")", "{", "}", "[", "]",
    ";", ",", ".", "?", ":", "=", "<", ">", "!", "~", "+", "-", "*", "/", "%", "&", "|", "^",
];

fn lex(source: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '/' && chars.get(i + 1) == Some(&'/') {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c.is_ascii_digit() {
            let start = i;
            let mut is_double = false;
            while i < chars.len()
                && (chars[i].is_ascii_alphanumeric()
                    || chars[i] == '_'
                    || (chars[i] == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit)))
            {
                is_double |= chars[i] == '.';
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            tokens.push(if text.ends_with(['l', 'L']) {
                Tok::Long(text)
            } else if is_double || text.ends_with(['d', 'D']) {
                Tok::Double(text)
            } else {
                Tok::Int(text)
            });
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            tokens.push(Tok::Ident(chars[start..i].iter().collect()));
        } else if c == '"' || c == '\'' {
            let quote = c;
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err("unterminated literal".to_owned()),
                    Some(&ch) if ch == quote => break,
                    Some('\\') => {
                        let escaped = chars.get(i + 1).ok_or("dangling escape")?;
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            other => *other,
                        });
                        i += 2;
                    }
                    Some(&ch) => {
                        text.push(ch);
                        i += 1;
                    }
                }
            }
            i += 1;
            tokens.push(if quote == '"' {
                Tok::Str(text)
            } else {
                Tok::Char(text)
            });
        } else {
            let rest: String = chars[i..chars.len().min(i + 4)].iter().collect();
            let punct = PUNCTS
                .iter()
                .find(|p| rest.starts_with(**p))
                .ok_or_else(|| format!("unexpected character `{c}`"))?;
            tokens.push(Tok::Punct(*punct));
            i += punct.len();
        }
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

type PResult<T> = Result<T, String>;

const MODIFIERS: &[(&str, ModifierKeyword)] = &[
    ("public", ModifierKeyword::Public),
    ("protected", ModifierKeyword::Protected),
    ("private", ModifierKeyword::Private),
    ("abstract", ModifierKeyword::Abstract),
    ("static", ModifierKeyword::Static),
    ("final", ModifierKeyword::Final),
    ("default", ModifierKeyword::Default),
    ("synchronized", ModifierKeyword::Synchronized),
    ("native", ModifierKeyword::Native),
    ("transient", ModifierKeyword::Transient),
    ("volatile", ModifierKeyword::Volatile),
    ("strictfp", ModifierKeyword::Strictfp),
];

const KEYWORDS: &[&str] = &[
    "class", "interface", "if", "else", "while", "for", "return", "throw", "break", "continue",
    "new", "this", "super", "true", "false", "null", "instanceof", "import", "package", "var",
];

struct Parser<'t> {
    tree: &'t mut SyntaxTree,
    tokens: Vec<Tok>,
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tree: &'t mut SyntaxTree, source: &str) -> PResult<Self> {
        Ok(Self {
            tree,
            tokens: lex(source)?,
            pos: 0,
        })
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset)
    }

    fn is_punct_at(&self, offset: usize, punct: &str) -> bool {
        matches!(self.peek_at(offset), Some(Tok::Punct(p)) if *p == punct)
    }

    fn at(&self, punct: &str) -> bool {
        self.is_punct_at(0, punct)
    }

    fn at_kw(&self, kw: &str) -> bool {
        matches!(self.peek_at(0), Some(Tok::Ident(id)) if id == kw)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.at(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.at_kw(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> PResult<()> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.error(&format!("`{punct}`")))
        }
    }

    fn error(&self, expected: &str) -> String {
        format!(
            "expected {expected} at token {} ({:?})",
            self.pos,
            self.peek_at(0)
        )
    }

    fn ident(&mut self) -> PResult<Symbol> {
        match self.peek_at(0) {
            Some(Tok::Ident(id)) if !KEYWORDS.contains(&id.as_str()) => {
                let symbol = Symbol::from_dynamic(id);
                self.pos += 1;
                Ok(symbol)
            }
            _ => Err(self.error("identifier")),
        }
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let mut name = self.ident()?.to_text();
        while self.is_punct_at(0, ".") && matches!(self.peek_at(1), Some(Tok::Ident(_))) {
            if matches!(self.peek_at(1), Some(Tok::Ident(id)) if KEYWORDS.contains(&id.as_str())) {
                break;
            }
            self.pos += 1;
            name.push('.');
            name.push_str(&self.ident()?.to_text());
        }
        Ok(name)
    }

    fn create(&mut self, builder: NodeBuilder) -> PResult<NodeRef> {
        self.tree.try_create(builder).map_err(|e| e.to_string())
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn unit(&mut self) -> PResult<NodeRef> {
        let mut package = None;
        if self.eat_kw("package") {
            package = Some(Symbol::from_dynamic(&self.qualified_name()?));
            self.expect(";")?;
        }
        let mut imports = Vec::new();
        while self.eat_kw("import") {
            let is_static = self.eat_kw("static");
            let path = Symbol::from_dynamic(&self.qualified_name()?);
            let wildcard = self.eat(".") && {
                self.expect("*")?;
                true
            };
            self.expect(";")?;
            imports.push(self.create(NodeBuilder::new(NodeKind::Import {
                path,
                is_static,
                wildcard,
            }))?);
        }
        let imports = self.create(NodeBuilder::new(NodeKind::ImportList).items(imports))?;
        let mut members = Vec::new();
        while !self.at_end() {
            members.push(self.member(None)?);
        }
        self.create(
            NodeBuilder::new(NodeKind::CompilationUnit { package })
                .slot(imports)
                .items(members),
        )
    }

    fn modifiers(&mut self) -> PResult<NodeRef> {
        let mut modifiers = Vec::new();
        while let Some(Tok::Ident(id)) = self.peek_at(0) {
            let Some(&(_, keyword)) = MODIFIERS.iter().find(|(text, _)| *text == id.as_str()) else {
                break;
            };
            self.pos += 1;
            modifiers.push(self.create(NodeBuilder::new(NodeKind::Modifier { keyword }))?);
        }
        self.create(NodeBuilder::new(NodeKind::Modifiers).items(modifiers))
    }

    fn member(&mut self, class: Option<Symbol>) -> PResult<NodeRef> {
        let modifiers = self.modifiers()?;
        let class_kind = if self.eat_kw("class") {
            Some(ClassKind::Class)
        } else if self.eat_kw("interface") {
            Some(ClassKind::Interface)
        } else {
            None
        };
        if let Some(class_kind) = class_kind {
            let name = self.ident()?;
            self.expect("{")?;
            let mut members = Vec::new();
            while !self.eat("}") {
                members.push(self.member(Some(name))?);
            }
            return self.create(
                NodeBuilder::new(NodeKind::ClassDecl { name, class_kind })
                    .slot(modifiers)
                    .items(members),
            );
        }

        let is_constructor = matches!(
            (self.peek_at(0), class),
            (Some(Tok::Ident(id)), Some(class)) if class == id.as_str()
        ) && self.is_punct_at(1, "(");
        if is_constructor {
            let name = self.ident()?;
            let params = self.params()?;
            let body = self.block()?;
            return self.create(
                NodeBuilder::new(NodeKind::ConstructorDecl { name })
                    .slot(modifiers)
                    .slot(body)
                    .items(params),
            );
        }

        let ty = self.ty()?;
        let name = self.ident()?;
        if self.at("(") {
            let params = self.params()?;
            let body = if self.eat(";") {
                None
            } else {
                Some(self.block()?)
            };
            return self.create(
                NodeBuilder::new(NodeKind::MethodDecl { name })
                    .slot(modifiers)
                    .slot(ty)
                    .opt_slot(body)
                    .items(params),
            );
        }
        let init = if self.eat("=") {
            Some(self.expr()?)
        } else {
            None
        };
        self.expect(";")?;
        self.create(
            NodeBuilder::new(NodeKind::FieldDecl { name })
                .slot(modifiers)
                .slot(ty)
                .opt_slot(init),
        )
    }

    fn params(&mut self) -> PResult<Vec<NodeRef>> {
        self.expect("(")?;
        let mut params = Vec::new();
        if !self.eat(")") {
            loop {
                let ty = self.ty()?;
                let name = self.ident()?;
                params.push(self.create(NodeBuilder::new(NodeKind::Param { name }).slot(ty))?);
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        Ok(params)
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Index after a type starting at `at`, without building anything.
    fn scan_type(&self, at: usize) -> Option<usize> {
        let mut i = at;
        match self.tokens.get(i)? {
            Tok::Ident(id) if !KEYWORDS.contains(&id.as_str()) || id == "var" => i += 1,
            _ => return None,
        }
        while matches!(self.tokens.get(i), Some(Tok::Punct("."))) {
            match self.tokens.get(i + 1) {
                Some(Tok::Ident(id)) if !KEYWORDS.contains(&id.as_str()) => i += 2,
                _ => return None,
            }
        }
        if matches!(self.tokens.get(i), Some(Tok::Punct("<"))) {
            let mut depth: i32 = 0;
            loop {
                match self.tokens.get(i)? {
                    Tok::Punct("<") => depth += 1,
                    Tok::Punct(">") => depth -= 1,
                    Tok::Punct(">>") => depth -= 2,
                    Tok::Punct(">>>") => depth -= 3,
                    Tok::Punct("," | "." | "?" | "[" | "]") | Tok::Ident(_) => {}
                    _ => return None,
                }
                i += 1;
                if depth <= 0 {
                    break;
                }
            }
        }
        while matches!(self.tokens.get(i), Some(Tok::Punct("[")))
            && matches!(self.tokens.get(i + 1), Some(Tok::Punct("]")))
        {
            i += 2;
        }
        Some(i)
    }

    fn close_angle(&mut self) -> PResult<()> {
        match self.peek_at(0) {
            Some(Tok::Punct(">")) => {
                self.pos += 1;
                Ok(())
            }
            Some(Tok::Punct(">>")) => {
                self.tokens[self.pos] = Tok::Punct(">");
                Ok(())
            }
            Some(Tok::Punct(">>>")) => {
                self.tokens[self.pos] = Tok::Punct(">>");
                Ok(())
            }
            _ => Err(self.error("`>`")),
        }
    }

    fn ty(&mut self) -> PResult<NodeRef> {
        let mut ty = match self.peek_at(0) {
            Some(Tok::Ident(id)) if PrimitiveKind::from_keyword(id).is_some() => {
                let primitive = PrimitiveKind::from_keyword(id).ok_or("primitive")?;
                self.pos += 1;
                self.create(NodeBuilder::new(NodeKind::PrimitiveType { primitive }))?
            }
            Some(Tok::Ident(id)) if id == "var" => {
                self.pos += 1;
                self.create(NodeBuilder::new(NodeKind::VarType))?
            }
            _ => {
                let name = Symbol::from_dynamic(&self.qualified_name()?);
                let mut args = Vec::new();
                let mut diamond = false;
                if self.eat("<") {
                    if self.at(">") || self.at(">>") || self.at(">>>") {
                        diamond = true;
                    } else {
                        loop {
                            args.push(self.ty()?);
                            if !self.eat(",") {
                                break;
                            }
                        }
                    }
                    self.close_angle()?;
                }
                self.create(NodeBuilder::new(NodeKind::ClassType { name, diamond }).items(args))?
            }
        };
        while self.is_punct_at(0, "[") && self.is_punct_at(1, "]") {
            self.pos += 2;
            ty = self.create(NodeBuilder::new(NodeKind::ArrayType).slot(ty))?;
        }
        Ok(ty)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn block(&mut self) -> PResult<NodeRef> {
        self.expect("{")?;
        let mut stmts = Vec::new();
        while !self.eat("}") {
            stmts.push(self.stmt()?);
        }
        self.create(NodeBuilder::new(NodeKind::Block).items(stmts))
    }

    fn paren_expr(&mut self) -> PResult<NodeRef> {
        self.expect("(")?;
        let expr = self.expr()?;
        self.expect(")")?;
        Ok(expr)
    }

    fn is_local_decl(&self) -> bool {
        let Some(after) = self.scan_type(self.pos) else {
            return false;
        };
        matches!(self.tokens.get(after), Some(Tok::Ident(id)) if !KEYWORDS.contains(&id.as_str()))
            && matches!(
                self.tokens.get(after + 1),
                Some(Tok::Punct("=" | ";"))
            )
    }

    fn stmt(&mut self) -> PResult<NodeRef> {
        if self.at("{") {
            return self.block();
        }
        if self.eat(";") {
            return self.create(NodeBuilder::new(NodeKind::Empty));
        }
        if self.eat_kw("if") {
            let cond = self.paren_expr()?;
            let then = self.stmt()?;
            let otherwise = if self.eat_kw("else") {
                Some(self.stmt()?)
            } else {
                None
            };
            return self.create(
                NodeBuilder::new(NodeKind::If)
                    .slot(cond)
                    .slot(then)
                    .opt_slot(otherwise),
            );
        }
        if self.eat_kw("while") {
            let cond = self.paren_expr()?;
            let body = self.stmt()?;
            return self.create(NodeBuilder::new(NodeKind::While).slot(cond).slot(body));
        }
        if self.eat_kw("for") {
            self.expect("(")?;
            let ty = self.ty()?;
            let name = self.ident()?;
            self.expect(":")?;
            let iterable = self.expr()?;
            self.expect(")")?;
            let body = self.stmt()?;
            return self.create(
                NodeBuilder::new(NodeKind::ForEach { name })
                    .slot(ty)
                    .slot(iterable)
                    .slot(body),
            );
        }
        if self.eat_kw("return") {
            let value = if self.at(";") {
                None
            } else {
                Some(self.expr()?)
            };
            self.expect(";")?;
            return self.create(NodeBuilder::new(NodeKind::Return).opt_slot(value));
        }
        if self.eat_kw("throw") {
            let value = self.expr()?;
            self.expect(";")?;
            return self.create(NodeBuilder::new(NodeKind::Throw).slot(value));
        }
        if self.eat_kw("break") {
            self.expect(";")?;
            return self.create(NodeBuilder::new(NodeKind::Break));
        }
        if self.eat_kw("continue") {
            self.expect(";")?;
            return self.create(NodeBuilder::new(NodeKind::Continue));
        }
        if (self.at_kw("super") || self.at_kw("this")) && self.is_punct_at(1, "(") {
            let is_super = self.at_kw("super");
            self.pos += 1;
            let args = self.args()?;
            self.expect(";")?;
            return self.create(
                NodeBuilder::new(NodeKind::ExplicitConstructorCall { is_super }).items(args),
            );
        }
        self.eat_kw("final");
        if self.is_local_decl() {
            let ty = self.ty()?;
            let name = self.ident()?;
            let init = if self.eat("=") {
                Some(self.expr()?)
            } else {
                None
            };
            self.expect(";")?;
            return self.create(
                NodeBuilder::new(NodeKind::LocalVar { name })
                    .slot(ty)
                    .opt_slot(init),
            );
        }
        let expr = self.expr()?;
        self.expect(";")?;
        self.create(NodeBuilder::new(NodeKind::ExprStmt).slot(expr))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr(&mut self) -> PResult<NodeRef> {
        if let Some(lambda) = self.try_lambda()? {
            return Ok(lambda);
        }
        let lhs = self.conditional()?;
        let op = match self.peek_at(0) {
            Some(Tok::Punct(p)) => assign_op(p),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        self.pos += 1;
        let rhs = self.expr()?;
        self.create(NodeBuilder::new(NodeKind::Assign { op }).slot(lhs).slot(rhs))
    }

    fn try_lambda(&mut self) -> PResult<Option<NodeRef>> {
        let (params, parenthesized) = if matches!(self.peek_at(0), Some(Tok::Ident(_)))
            && self.is_punct_at(1, "->")
        {
            let name = self.ident()?;
            (vec![self.create(NodeBuilder::new(NodeKind::Param { name }))?], false)
        } else if self.at("(") {
            // Find the matching `)` and require `->` after it.
            let mut depth = 0;
            let mut i = self.pos;
            loop {
                match self.tokens.get(i) {
                    Some(Tok::Punct("(")) => depth += 1,
                    Some(Tok::Punct(")")) => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    None => return Ok(None),
                    _ => {}
                }
                i += 1;
            }
            if !matches!(self.tokens.get(i + 1), Some(Tok::Punct("->"))) {
                return Ok(None);
            }
            self.pos += 1;
            let mut params = Vec::new();
            while !self.eat(")") {
                let typed = matches!(self.peek_at(1), Some(Tok::Ident(_)) | Some(Tok::Punct("<" | "[" | ".")));
                let ty = if typed { Some(self.ty()?) } else { None };
                let name = self.ident()?;
                params.push(self.create(NodeBuilder::new(NodeKind::Param { name }).opt_slot(ty))?);
                self.eat(",");
            }
            (params, true)
        } else {
            return Ok(None);
        };
        self.expect("->")?;
        let body = if self.at("{") {
            self.block()?
        } else {
            self.expr()?
        };
        self.create(
            NodeBuilder::new(NodeKind::Lambda { parenthesized })
                .slot(body)
                .items(params),
        )
        .map(Some)
    }

    fn conditional(&mut self) -> PResult<NodeRef> {
        let cond = self.binary(1)?;
        if !self.eat("?") {
            return Ok(cond);
        }
        let then = self.expr()?;
        self.expect(":")?;
        let otherwise = match self.try_lambda()? {
            Some(lambda) => lambda,
            None => self.conditional()?,
        };
        self.create(
            NodeBuilder::new(NodeKind::Conditional)
                .slot(cond)
                .slot(then)
                .slot(otherwise),
        )
    }

    fn binary(&mut self, min: u8) -> PResult<NodeRef> {
        let mut lhs = self.unary()?;
        loop {
            if self.at_kw("instanceof") && BinaryOp::Lt.precedence() >= min {
                self.pos += 1;
                let ty = self.ty()?;
                lhs = self.create(NodeBuilder::new(NodeKind::InstanceOf).slot(lhs).slot(ty))?;
                continue;
            }
            let op = match self.peek_at(0) {
                Some(Tok::Punct(p)) => binary_op(p),
                _ => None,
            };
            let Some(op) = op.filter(|op| op.precedence() >= min) else {
                break;
            };
            self.pos += 1;
            let rhs = self.binary(op.precedence() + 1)?;
            lhs = self.create(NodeBuilder::new(NodeKind::Binary { op }).slot(lhs).slot(rhs))?;
        }
        Ok(lhs)
    }

    fn is_cast(&self) -> bool {
        if !self.at("(") {
            return false;
        }
        let Some(after) = self.scan_type(self.pos + 1) else {
            return false;
        };
        if !matches!(self.tokens.get(after), Some(Tok::Punct(")"))) {
            return false;
        }
        let primitive = matches!(
            self.tokens.get(self.pos + 1),
            Some(Tok::Ident(id)) if PrimitiveKind::from_keyword(id).is_some()
        );
        match self.tokens.get(after + 1) {
            Some(Tok::Ident(id)) => id != "instanceof",
            Some(
                Tok::Int(_) | Tok::Long(_) | Tok::Double(_) | Tok::Str(_) | Tok::Char(_),
            ) => true,
            Some(Tok::Punct("(" | "!" | "~")) => true,
            Some(Tok::Punct("-" | "+")) => primitive,
            _ => false,
        }
    }

    fn unary(&mut self) -> PResult<NodeRef> {
        let op = match self.peek_at(0) {
            Some(Tok::Punct("!")) => Some(UnaryOp::Not),
            Some(Tok::Punct("~")) => Some(UnaryOp::BitNot),
            Some(Tok::Punct("-")) => Some(UnaryOp::Neg),
            Some(Tok::Punct("+")) => Some(UnaryOp::Plus),
            Some(Tok::Punct("++")) => Some(UnaryOp::PreInc),
            Some(Tok::Punct("--")) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.unary()?;
            return self.create(NodeBuilder::new(NodeKind::Unary { op }).slot(operand));
        }
        if self.is_cast() {
            self.pos += 1;
            let ty = self.ty()?;
            self.expect(")")?;
            let operand = self.unary()?;
            return self.create(NodeBuilder::new(NodeKind::Cast).slot(ty).slot(operand));
        }
        self.postfix()
    }

    fn args(&mut self) -> PResult<Vec<NodeRef>> {
        self.expect("(")?;
        let mut args = Vec::new();
        if !self.eat(")") {
            loop {
                args.push(self.expr()?);
                if self.eat(")") {
                    break;
                }
                self.expect(",")?;
            }
        }
        Ok(args)
    }

    fn postfix(&mut self) -> PResult<NodeRef> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                let name = self.ident()?;
                expr = if self.at("(") {
                    let args = self.args()?;
                    self.create(
                        NodeBuilder::new(NodeKind::MethodCall { name })
                            .slot(expr)
                            .items(args),
                    )?
                } else {
                    self.create(NodeBuilder::new(NodeKind::FieldAccess { name }).slot(expr))?
                };
            } else if self.eat("[") {
                let index = self.expr()?;
                self.expect("]")?;
                expr = self.create(NodeBuilder::new(NodeKind::ArrayAccess).slot(expr).slot(index))?;
            } else if self.eat("::") {
                let name = if self.eat_kw("new") {
                    Symbol::new("new")
                } else {
                    self.ident()?
                };
                expr = self.create(NodeBuilder::new(NodeKind::MethodRef { name }).slot(expr))?;
            } else if self.at("++") || self.at("--") {
                let op = if self.at("++") {
                    UnaryOp::PostInc
                } else {
                    UnaryOp::PostDec
                };
                self.pos += 1;
                expr = self.create(NodeBuilder::new(NodeKind::Unary { op }).slot(expr))?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> PResult<NodeRef> {
        let token = self.peek_at(0).cloned().ok_or_else(|| self.error("expression"))?;
        let literal = |literal, text: String| {
            NodeBuilder::new(NodeKind::Literal {
                literal,
                text: Symbol::from_dynamic(&text),
            })
        };
        let builder = match token {
            Tok::Int(text) => literal(LiteralKind::Int, text),
            Tok::Long(text) => literal(LiteralKind::Long, text),
            Tok::Double(text) => literal(LiteralKind::Double, text),
            Tok::Str(text) => literal(LiteralKind::String, text),
            Tok::Char(text) => literal(LiteralKind::Char, text),
            Tok::Punct("(") => {
                let inner = self.paren_expr()?;
                return self.create(NodeBuilder::new(NodeKind::Paren).slot(inner));
            }
            Tok::Punct(_) => return Err(self.error("expression")),
            Tok::Ident(id) => match id.as_str() {
                "true" | "false" => literal(LiteralKind::Boolean, id.clone()),
                "null" => literal(LiteralKind::Null, id.clone()),
                "this" => NodeBuilder::new(NodeKind::This),
                "new" => {
                    self.pos += 1;
                    let ty = self.ty()?;
                    let args = self.args()?;
                    return self.create(NodeBuilder::new(NodeKind::New).slot(ty).items(args));
                }
                _ => {
                    let name = self.ident()?;
                    if self.at("(") {
                        let args = self.args()?;
                        return self
                            .create(NodeBuilder::new(NodeKind::MethodCall { name }).items(args));
                    }
                    let is_type = name.with_str(|s| s.starts_with(char::is_uppercase))
                        && (self.at(".") || self.at("::"));
                    let kind = if is_type {
                        NodeKind::TypeName { name }
                    } else {
                        NodeKind::Name { name }
                    };
                    return self.create(NodeBuilder::new(kind));
                }
            },
        };
        self.pos += 1;
        self.create(builder)
    }
}

fn binary_op(punct: &str) -> Option<BinaryOp> {
    Some(match punct {
        "||" => BinaryOp::Or,
        "&&" => BinaryOp::And,
        "|" => BinaryOp::BitOr,
        "^" => BinaryOp::BitXor,
        "&" => BinaryOp::BitAnd,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "<<" => BinaryOp::Shl,
        ">>" => BinaryOp::Shr,
        ">>>" => BinaryOp::UShr,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        _ => return None,
    })
}

fn assign_op(punct: &str) -> Option<AssignOp> {
    Some(match punct {
        "=" => AssignOp::Assign,
        "+=" => AssignOp::Add,
        "-=" => AssignOp::Sub,
        "*=" => AssignOp::Mul,
        "/=" => AssignOp::Div,
        "%=" => AssignOp::Rem,
        "&=" => AssignOp::And,
        "|=" => AssignOp::Or,
        "^=" => AssignOp::Xor,
        "<<=" => AssignOp::Shl,
        ">>=" => AssignOp::Shr,
        ">>>=" => AssignOp::UShr,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn round_trip(source: &str) -> String {
        let mut tree = SyntaxTree::new();
        let root = parse_unit(&mut tree, source).unwrap();
        tree.set_root(root).unwrap();
        print_tree(&tree)
    }

    #[test]
    fn parses_a_small_unit() {
        assert_snapshot!(round_trip(r#"
            package demo;
            import java.util.List;
            public class Demo {
                private int count = 0;
                Demo() { super(); }
                String name(List<String> xs, int i) {
                    String s = xs.get(i);
                    if (s == null || s.length() > 10) { return "long"; } else return s;
                }
            }
        "#), @r#"
        package demo;

        import java.util.List;

        public class Demo {
            private int count = 0;

            Demo() {
                super();
            }

            String name(List<String> xs, int i) {
                String s = xs.get(i);
                if (s == null || s.length() > 10) {
                    return "long";
                } else return s;
            }
        }
        "#);
    }

    #[test]
    fn parses_expressions() {
        let fx = Fixture::expr("(a) -> !(b && c) ? (int) x : y.z[0]");
        assert_snapshot!(print_node(&fx.tree, fx.expr), @"(a) -> !(b && c) ? (int) x : y.z[0]");

        let fx = Fixture::expr("xs.stream().map(String::trim).forEach(s -> s.isEmpty())");
        assert_snapshot!(
            print_node(&fx.tree, fx.expr),
            @"xs.stream().map(String::trim).forEach(s -> s.isEmpty())"
        );
    }

    #[test]
    fn binary_precedence() {
        let fx = Fixture::expr("a + b * c == d");
        let NodeKind::Binary { op } = *fx.tree.kind(fx.expr) else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Eq);
    }
}
