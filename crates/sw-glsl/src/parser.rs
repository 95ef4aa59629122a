use crate::ast::*;
use crate::diagnostics::{DiagnosticSink, SemaErrorKind};
use crate::types::{Precision, Qualifier, TypeDesc};
use sw_pp::token::{Location, Token, TokenKind};

const QUALIFIER_KEYWORDS: &[&str] = &["const", "in", "out", "inout", "uniform", "attribute", "varying"];
const PRECISION_KEYWORDS: &[&str] = &["lowp", "mediump", "highp"];

pub struct Parser<'a, S: DiagnosticSink> {
    tokens: Vec<&'a Token>,
    pos: usize,
    structs: Vec<StructDef>,
    sink: &'a mut S,
}

impl<'a, S: DiagnosticSink> Parser<'a, S> {
    pub fn new(tokens: &'a [Token], sink: &'a mut S) -> Parser<'a, S> {
        let tokens: Vec<&Token> = tokens.iter().filter(|t| t.kind != TokenKind::Newline).collect();
        Parser { tokens, pos: 0, structs: Vec::new(), sink }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_n(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos).copied();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn loc(&self) -> Location {
        self.peek().map(|t| t.loc).unwrap_or(Location::new(0, 0))
    }

    fn error(&mut self, kind: SemaErrorKind) {
        let loc = self.loc();
        self.sink.error(loc, kind);
    }

    fn eat_punct(&mut self, s: &str) -> bool {
        if self.peek().map(|t| t.is_punct(s)).unwrap_or(false) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, s: &str) -> bool {
        if self.eat_punct(s) {
            true
        } else {
            let found = self.peek().map(|t| t.text.clone()).unwrap_or_default();
            self.error(SemaErrorKind::UnexpectedToken(found));
            false
        }
    }

    fn eat_ident(&mut self, s: &str) -> bool {
        if self.peek().map(|t| t.is_ident(s)).unwrap_or(false) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self) -> String {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier => {
                self.pos += 1;
                t.text.clone()
            }
            _ => {
                self.error(SemaErrorKind::UnexpectedEof);
                String::new()
            }
        }
    }

    pub fn parse_translation_unit(&mut self) -> TranslationUnit {
        let mut unit = TranslationUnit::default();
        while self.peek().is_some() {
            if self.eat_ident("precision") {
                self.parse_precision_keyword();
                self.expect_identifier();
                self.expect_punct(";");
                continue;
            }
            if self.peek().map(|t| t.is_ident("struct")).unwrap_or(false) {
                let def = self.parse_struct_def();
                self.structs.push(def.clone());
                unit.structs.push(def);
                self.eat_punct(";");
                continue;
            }
            self.parse_top_level_decl(&mut unit);
        }
        unit
    }

    fn parse_precision_keyword(&mut self) -> Precision {
        for (kw, p) in [("lowp", Precision::Low), ("mediump", Precision::Medium), ("highp", Precision::High)] {
            if self.eat_ident(kw) {
                return p;
            }
        }
        Precision::Unspecified
    }

    fn parse_qualifier(&mut self) -> Qualifier {
        match self.peek().map(|t| t.text.clone()) {
            Some(ref s) if s == "const" => {
                self.bump();
                Qualifier::Const
            }
            Some(ref s) if s == "in" => {
                self.bump();
                Qualifier::In
            }
            Some(ref s) if s == "out" => {
                self.bump();
                Qualifier::Out
            }
            Some(ref s) if s == "inout" => {
                self.bump();
                Qualifier::InOut
            }
            Some(ref s) if s == "uniform" => {
                self.bump();
                Qualifier::Uniform
            }
            Some(ref s) if s == "attribute" => {
                self.bump();
                Qualifier::Attribute
            }
            Some(ref s) if s == "varying" => {
                self.bump();
                Qualifier::Varying
            }
            _ => Qualifier::None,
        }
    }

    fn is_qualifier_ahead(&self) -> bool {
        self.peek().map(|t| QUALIFIER_KEYWORDS.contains(&t.text.as_str())).unwrap_or(false)
    }

    fn is_precision_ahead(&self) -> bool {
        self.peek().map(|t| PRECISION_KEYWORDS.contains(&t.text.as_str())).unwrap_or(false)
    }

    fn struct_type(&self, name: &str) -> Option<TypeDesc> {
        self.structs.iter().find(|s| s.name == name).map(|s| TypeDesc::Struct(s.fields.clone()))
    }

    fn parse_type(&mut self) -> Option<TypeDesc> {
        let tok = self.peek()?;
        if tok.kind != TokenKind::Identifier {
            return None;
        }
        if let Some(t) = TypeDesc::builtin_from_keyword(&tok.text) {
            self.bump();
            return Some(t);
        }
        if let Some(t) = self.struct_type(&tok.text) {
            self.bump();
            return Some(t);
        }
        None
    }

    fn parse_struct_def(&mut self) -> StructDef {
        self.bump(); // `struct`
        let name = self.expect_identifier();
        self.expect_punct("{");
        let mut fields = Vec::new();
        while !self.eat_punct("}") {
            if self.peek().is_none() {
                self.error(SemaErrorKind::UnexpectedEof);
                break;
            }
            if self.is_precision_ahead() {
                self.parse_precision_keyword();
            }
            let Some(ty) = self.parse_type() else {
                let found = self.peek().map(|t| t.text.clone()).unwrap_or_default();
                self.error(SemaErrorKind::UnknownType(found));
                self.bump();
                continue;
            };
            loop {
                let fname = self.expect_identifier();
                let ty = self.parse_array_suffix(ty.clone());
                fields.push((fname, ty));
                if !self.eat_punct(",") {
                    break;
                }
            }
            self.expect_punct(";");
        }
        StructDef { name, fields }
    }

    fn parse_array_suffix(&mut self, ty: TypeDesc) -> TypeDesc {
        if self.eat_punct("[") {
            let size = if self.peek().map(|t| t.kind == TokenKind::IntConstant).unwrap_or(false) {
                let t = self.bump().unwrap();
                t.text.parse::<u32>().ok()
            } else {
                None
            };
            self.expect_punct("]");
            TypeDesc::Array(Box::new(ty), size)
        } else {
            ty
        }
    }

    fn parse_top_level_decl(&mut self, unit: &mut TranslationUnit) {
        let loc = self.loc();
        let qualifier = self.parse_qualifier();
        let precision = self.parse_precision_keyword();
        let Some(ty) = self.parse_type() else {
            let found = self.peek().map(|t| t.text.clone()).unwrap_or_default();
            self.error(SemaErrorKind::UnknownType(found));
            self.bump();
            return;
        };
        let name = self.expect_identifier();

        if self.peek().map(|t| t.is_punct("(")).unwrap_or(false) {
            self.parse_function_tail(name, ty, loc, unit);
            return;
        }

        let mut name = name;
        loop {
            let declared_ty = self.parse_array_suffix(ty.clone());
            let initializer = if self.eat_punct("=") { Some(self.parse_assignment()) } else { None };
            unit.globals.push(GlobalVar {
                name: name.clone(),
                ty: declared_ty,
                qualifier,
                precision,
                location: None,
                initializer,
                loc,
            });
            if !self.eat_punct(",") {
                break;
            }
            name = self.expect_identifier();
        }
        self.expect_punct(";");
    }

    fn parse_function_tail(&mut self, name: String, return_ty: TypeDesc, loc: Location, unit: &mut TranslationUnit) {
        self.expect_punct("(");
        let mut params = Vec::new();
        if !self.eat_punct(")") {
            if self.eat_ident("void") {
                self.expect_punct(")");
            } else {
                loop {
                    let qualifier = self.parse_qualifier();
                    self.parse_precision_keyword();
                    let Some(pty) = self.parse_type() else {
                        self.error(SemaErrorKind::UnknownType("<param>".into()));
                        break;
                    };
                    let pname = if self.peek().map(|t| t.kind == TokenKind::Identifier).unwrap_or(false) {
                        self.expect_identifier()
                    } else {
                        String::new()
                    };
                    let pty = self.parse_array_suffix(pty);
                    params.push(Param { name: pname, ty: pty, qualifier });
                    if !self.eat_punct(",") {
                        break;
                    }
                }
                self.expect_punct(")");
            }
        }

        let body = if self.eat_punct(";") {
            None
        } else {
            Some(self.parse_block_stmts())
        };
        unit.functions.push(FunctionDef { name, return_ty, params, body, loc });
    }

    fn parse_block_stmts(&mut self) -> Vec<Stmt> {
        self.expect_punct("{");
        let mut stmts = Vec::new();
        while !self.eat_punct("}") {
            if self.peek().is_none() {
                self.error(SemaErrorKind::UnexpectedEof);
                break;
            }
            stmts.push(self.parse_statement());
        }
        stmts
    }

    fn parse_statement(&mut self) -> Stmt {
        let loc = self.loc();
        if self.peek().map(|t| t.is_punct("{")).unwrap_or(false) {
            return Stmt { kind: StmtKind::Block(self.parse_block_stmts()), loc };
        }
        if self.eat_ident("if") {
            self.expect_punct("(");
            let cond = self.parse_expression();
            self.expect_punct(")");
            let then_branch = Box::new(self.parse_statement());
            let else_branch = if self.eat_ident("else") { Some(Box::new(self.parse_statement())) } else { None };
            return Stmt { kind: StmtKind::If(cond, then_branch, else_branch), loc };
        }
        if self.eat_ident("for") {
            return self.parse_for_statement(loc);
        }
        if self.eat_ident("while") {
            self.expect_punct("(");
            let cond = self.parse_expression();
            self.expect_punct(")");
            let body = Box::new(self.parse_statement());
            return Stmt { kind: StmtKind::While(cond, body), loc };
        }
        if self.eat_ident("return") {
            let value = if self.peek().map(|t| t.is_punct(";")).unwrap_or(false) {
                None
            } else {
                Some(self.parse_expression())
            };
            self.expect_punct(";");
            return Stmt { kind: StmtKind::Return(value), loc };
        }
        if self.eat_ident("break") {
            self.expect_punct(";");
            return Stmt { kind: StmtKind::Break, loc };
        }
        if self.eat_ident("continue") {
            self.expect_punct(";");
            return Stmt { kind: StmtKind::Continue, loc };
        }
        if self.eat_ident("discard") {
            self.expect_punct(";");
            return Stmt { kind: StmtKind::Discard, loc };
        }
        if self.eat_punct(";") {
            return Stmt { kind: StmtKind::Empty, loc };
        }
        if self.looks_like_decl() {
            return self.parse_local_decl(loc);
        }
        let e = self.parse_expression();
        self.expect_punct(";");
        Stmt { kind: StmtKind::Expr(e), loc }
    }

    fn looks_like_decl(&self) -> bool {
        if self.is_qualifier_ahead() || self.is_precision_ahead() {
            return true;
        }
        let Some(t) = self.peek() else { return false };
        if t.kind != TokenKind::Identifier {
            return false;
        }
        if TypeDesc::builtin_from_keyword(&t.text).is_some() || self.struct_type(&t.text).is_some() {
            // `T(...)` with no following identifier is a constructor call,
            // not a declaration.
            return self.peek_n(1).map(|n| n.kind == TokenKind::Identifier).unwrap_or(false);
        }
        false
    }

    fn parse_local_decl(&mut self, loc: Location) -> Stmt {
        let qualifier = self.parse_qualifier();
        self.parse_precision_keyword();
        let ty = self.parse_type().unwrap_or(TypeDesc::Basic(crate::types::Basic::Float));
        let mut declarators = Vec::new();
        loop {
            let name = self.expect_identifier();
            let array_size_tok = if self.eat_punct("[") {
                let e = if self.peek().map(|t| !t.is_punct("]")).unwrap_or(false) {
                    Some(self.parse_assignment())
                } else {
                    None
                };
                self.expect_punct("]");
                e
            } else {
                None
            };
            let initializer = if self.eat_punct("=") { Some(self.parse_assignment()) } else { None };
            declarators.push(Declarator { name, array_size: array_size_tok, initializer });
            if !self.eat_punct(",") {
                break;
            }
        }
        self.expect_punct(";");
        Stmt { kind: StmtKind::Decl { ty, qualifier, declarators }, loc }
    }

    fn parse_for_statement(&mut self, loc: Location) -> Stmt {
        self.expect_punct("(");
        if self.is_precision_ahead() {
            self.parse_precision_keyword();
        }
        let idx_ty = self.parse_type().unwrap_or(TypeDesc::Basic(crate::types::Basic::Int));
        let idx_name = self.expect_identifier();
        self.expect_punct("=");
        let init = self.parse_assignment();
        self.expect_punct(";");
        let cond = self.parse_expression();
        self.expect_punct(";");
        let step = self.parse_expression();
        self.expect_punct(")");
        let body = Box::new(self.parse_statement());
        Stmt {
            kind: StmtKind::For { idx_name, idx_ty, init, cond, step, body, unroll: false },
            loc,
        }
    }

    // --- expressions, lowest to highest precedence ---

    fn parse_expression(&mut self) -> Expr {
        let mut e = self.parse_assignment();
        while self.eat_punct(",") {
            let loc = e.loc;
            let rhs = self.parse_assignment();
            e = Expr::new(ExprKind::Binary(BinOp::Add, Box::new(e), Box::new(rhs)), loc);
        }
        e
    }

    fn parse_assignment(&mut self) -> Expr {
        let lhs = self.parse_conditional();
        const ASSIGN_OPS: &[&str] = &["=", "+=", "-=", "*=", "/="];
        if let Some(t) = self.peek() {
            if t.kind == TokenKind::Punctuator && ASSIGN_OPS.contains(&t.text.as_str()) {
                let op = t.text.clone();
                let loc = t.loc;
                self.bump();
                let rhs = self.parse_assignment();
                let rhs = if op == "=" {
                    rhs
                } else {
                    let binop = match op.as_str() {
                        "+=" => BinOp::Add,
                        "-=" => BinOp::Sub,
                        "*=" => BinOp::Mul,
                        "/=" => BinOp::Div,
                        _ => unreachable!(),
                    };
                    Expr::new(ExprKind::Binary(binop, Box::new(lhs.clone()), Box::new(rhs)), loc)
                };
                return Expr::new(ExprKind::Assign(Box::new(lhs), Box::new(rhs)), loc);
            }
        }
        lhs
    }

    fn parse_conditional(&mut self) -> Expr {
        let cond = self.parse_logical_or();
        if self.eat_punct("?") {
            let loc = cond.loc;
            let then_e = self.parse_assignment();
            self.expect_punct(":");
            let else_e = self.parse_assignment();
            return Expr::new(ExprKind::Conditional(Box::new(cond), Box::new(then_e), Box::new(else_e)), loc);
        }
        cond
    }

    fn parse_logical_or(&mut self) -> Expr {
        let mut lhs = self.parse_logical_and();
        while self.eat_punct("||") {
            let loc = lhs.loc;
            let rhs = self.parse_logical_and();
            lhs = Expr::new(ExprKind::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs)), loc);
        }
        lhs
    }

    fn parse_logical_and(&mut self) -> Expr {
        let mut lhs = self.parse_equality();
        while self.eat_punct("&&") {
            let loc = lhs.loc;
            let rhs = self.parse_equality();
            lhs = Expr::new(ExprKind::Binary(BinOp::And, Box::new(lhs), Box::new(rhs)), loc);
        }
        lhs
    }

    fn parse_equality(&mut self) -> Expr {
        let mut lhs = self.parse_relational();
        loop {
            let op = if self.eat_punct("==") {
                BinOp::Eq
            } else if self.eat_punct("!=") {
                BinOp::Ne
            } else {
                break;
            };
            let loc = lhs.loc;
            let rhs = self.parse_relational();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), loc);
        }
        lhs
    }

    fn parse_relational(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        loop {
            let op = if self.eat_punct("<=") {
                BinOp::Le
            } else if self.eat_punct(">=") {
                BinOp::Ge
            } else if self.eat_punct("<") {
                BinOp::Lt
            } else if self.eat_punct(">") {
                BinOp::Gt
            } else {
                break;
            };
            let loc = lhs.loc;
            let rhs = self.parse_additive();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), loc);
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = if self.eat_punct("+") {
                BinOp::Add
            } else if self.eat_punct("-") {
                BinOp::Sub
            } else {
                break;
            };
            let loc = lhs.loc;
            let rhs = self.parse_multiplicative();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), loc);
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = if self.eat_punct("*") {
                BinOp::Mul
            } else if self.eat_punct("/") {
                BinOp::Div
            } else {
                break;
            };
            let loc = lhs.loc;
            let rhs = self.parse_unary();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), loc);
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let loc = self.loc();
        if self.eat_punct("-") {
            return Expr::new(ExprKind::Unary(UnOp::Neg, Box::new(self.parse_unary())), loc);
        }
        if self.eat_punct("!") {
            return Expr::new(ExprKind::Unary(UnOp::Not, Box::new(self.parse_unary())), loc);
        }
        if self.eat_punct("++") {
            return Expr::new(ExprKind::Unary(UnOp::PreInc, Box::new(self.parse_unary())), loc);
        }
        if self.eat_punct("--") {
            return Expr::new(ExprKind::Unary(UnOp::PreDec, Box::new(self.parse_unary())), loc);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut e = self.parse_primary();
        loop {
            let loc = e.loc;
            if self.eat_punct(".") {
                let field = self.expect_identifier();
                e = if field.len() <= 4 && field.chars().all(|c| "xyzwrgbastpq".contains(c)) {
                    Expr::new(ExprKind::Swizzle(Box::new(e), field), loc)
                } else {
                    Expr::new(ExprKind::Field(Box::new(e), field), loc)
                };
            } else if self.eat_punct("[") {
                let idx = self.parse_expression();
                self.expect_punct("]");
                e = Expr::new(ExprKind::Index(Box::new(e), Box::new(idx)), loc);
            } else if self.eat_punct("++") {
                e = Expr::new(ExprKind::Unary(UnOp::PostInc, Box::new(e)), loc);
            } else if self.eat_punct("--") {
                e = Expr::new(ExprKind::Unary(UnOp::PostDec, Box::new(e)), loc);
            } else {
                break;
            }
        }
        e
    }

    fn parse_primary(&mut self) -> Expr {
        let loc = self.loc();
        if self.eat_punct("(") {
            let e = self.parse_expression();
            self.expect_punct(")");
            return e;
        }
        let Some(tok) = self.peek() else {
            self.error(SemaErrorKind::UnexpectedEof);
            return Expr::new(ExprKind::IntLiteral(0), loc);
        };
        match tok.kind {
            TokenKind::IntConstant => {
                self.bump();
                Expr::new(ExprKind::IntLiteral(tok.text.parse().unwrap_or(0)), loc)
            }
            TokenKind::UintConstant => {
                self.bump();
                let digits: String = tok.text.chars().filter(|c| c.is_ascii_digit()).collect();
                Expr::new(ExprKind::UintLiteral(digits.parse().unwrap_or(0)), loc)
            }
            TokenKind::FloatConstant => {
                self.bump();
                let digits: String = tok.text.chars().filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+' || *c == 'e' || *c == 'E').collect();
                Expr::new(ExprKind::FloatLiteral(digits.parse().unwrap_or(0.0)), loc)
            }
            TokenKind::Identifier if tok.text == "true" || tok.text == "false" => {
                self.bump();
                Expr::new(ExprKind::BoolLiteral(tok.text == "true"), loc)
            }
            TokenKind::Identifier => {
                let name = tok.text.clone();
                self.bump();
                if self.eat_punct("(") {
                    let mut args = Vec::new();
                    if !self.eat_punct(")") {
                        loop {
                            args.push(self.parse_assignment());
                            if !self.eat_punct(",") {
                                break;
                            }
                        }
                        self.expect_punct(")");
                    }
                    if let Some(ty) = TypeDesc::builtin_from_keyword(&name).or_else(|| self.struct_type(&name)) {
                        Expr::new(ExprKind::Construct(ty, args), loc)
                    } else {
                        Expr::new(ExprKind::Call(name, args), loc)
                    }
                } else {
                    Expr::new(ExprKind::Ident(name), loc)
                }
            }
            _ => {
                let found = tok.text.clone();
                self.bump();
                self.error(SemaErrorKind::UnexpectedToken(found));
                Expr::new(ExprKind::IntLiteral(0), loc)
            }
        }
    }
}
