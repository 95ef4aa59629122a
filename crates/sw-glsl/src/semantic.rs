use crate::ast::*;
use crate::builtins;
use crate::diagnostics::{DiagnosticSink, SemaErrorKind};
use crate::symbol::{SymbolTable, VarSymbol};
use crate::types::{Basic, Qualifier, Ty, TypeDesc};
use sw_pp::token::Location;

pub struct Analyzer<'a, S: DiagnosticSink> {
    symbols: SymbolTable,
    /// Name of the loop index currently in scope, if any; array indices may
    /// reference it without being a constant expression.
    loop_index_stack: Vec<String>,
    stage_is_vertex: bool,
    sink: &'a mut S,
}

impl<'a, S: DiagnosticSink> Analyzer<'a, S> {
    pub fn new(stage_is_vertex: bool, sink: &'a mut S) -> Analyzer<'a, S> {
        Analyzer { symbols: SymbolTable::new(), loop_index_stack: Vec::new(), stage_is_vertex, sink }
    }

    pub fn analyze(&mut self, unit: &mut TranslationUnit) {
        for g in &unit.globals {
            let sym = VarSymbol { ty: g.ty.clone(), qualifier: g.qualifier, is_const_expr: g.qualifier == Qualifier::Const, is_loop_index: false };
            if self.symbols.declare(&g.name, sym).is_err() {
                self.sink.error(g.loc, SemaErrorKind::Redefinition(g.name.clone()));
            }
        }
        for f in unit.functions.clone() {
            self.symbols.declare_function(f);
        }
        let functions = std::mem::take(&mut unit.functions);
        let mut analyzed = Vec::with_capacity(functions.len());
        for mut f in functions {
            self.analyze_function(&mut f);
            analyzed.push(f);
        }
        unit.functions = analyzed;
    }

    fn analyze_function(&mut self, f: &mut FunctionDef) {
        self.symbols.push_scope();
        for p in &f.params {
            let sym = VarSymbol { ty: p.ty.clone(), qualifier: p.qualifier, is_const_expr: false, is_loop_index: false };
            let _ = self.symbols.declare(&p.name, sym);
        }
        if let Some(body) = &mut f.body {
            for stmt in body {
                self.analyze_stmt(stmt);
            }
        }
        self.symbols.pop_scope();
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) {
        match &mut stmt.kind {
            StmtKind::Decl { ty, qualifier, declarators } => {
                for d in declarators {
                    if let Some(init) = &mut d.initializer {
                        self.analyze_expr(init);
                    }
                    let sym = VarSymbol { ty: ty.clone(), qualifier: *qualifier, is_const_expr: *qualifier == Qualifier::Const, is_loop_index: false };
                    if self.symbols.declare(&d.name, sym).is_err() {
                        self.sink.error(stmt.loc, SemaErrorKind::Redefinition(d.name.clone()));
                    }
                }
            }
            StmtKind::Expr(e) => self.analyze_expr(e),
            StmtKind::Block(stmts) => {
                self.symbols.push_scope();
                for s in stmts {
                    self.analyze_stmt(s);
                }
                self.symbols.pop_scope();
            }
            StmtKind::If(cond, then_b, else_b) => {
                self.analyze_expr(cond);
                self.analyze_stmt(then_b);
                if let Some(e) = else_b {
                    self.analyze_stmt(e);
                }
            }
            StmtKind::While(cond, body) => {
                self.analyze_expr(cond);
                self.analyze_stmt(body);
            }
            StmtKind::For { idx_name, idx_ty, init, cond, step, body, unroll } => {
                self.analyze_for(idx_name, idx_ty, init, cond, step, body, unroll, stmt.loc);
            }
            StmtKind::Return(Some(e)) => self.analyze_expr(e),
            StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::Empty => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn analyze_for(
        &mut self,
        idx_name: &str,
        idx_ty: &TypeDesc,
        init: &mut Expr,
        cond: &mut Expr,
        step: &mut Expr,
        body: &mut Stmt,
        unroll: &mut bool,
        loc: Location,
    ) {
        if !matches!(idx_ty, TypeDesc::Basic(Basic::Int) | TypeDesc::Basic(Basic::UInt) | TypeDesc::Basic(Basic::Float)) {
            self.sink.error(loc, SemaErrorKind::UnsupportedLoopForm);
        }
        if !is_constant_expr(init) {
            self.sink.error(loc, SemaErrorKind::UnsupportedLoopForm);
        }
        if !is_comparison_against_constant(cond, idx_name) {
            self.sink.error(loc, SemaErrorKind::UnsupportedLoopForm);
        }
        if !is_accepted_step_form(step, idx_name) {
            self.sink.error(loc, SemaErrorKind::UnsupportedLoopForm);
        }

        self.symbols.push_scope();
        let _ = self.symbols.declare(
            idx_name,
            VarSymbol { ty: idx_ty.clone(), qualifier: Qualifier::None, is_const_expr: false, is_loop_index: true },
        );
        self.analyze_expr(init);
        self.analyze_expr(cond);
        self.analyze_expr(step);

        self.loop_index_stack.push(idx_name.to_string());
        if assigns_to(body, idx_name) {
            self.sink.error(loc, SemaErrorKind::LoopIndexAssignedInBody(idx_name.to_string()));
        }
        *unroll = uses_as_sampler_array_index(body, idx_name);
        self.analyze_stmt(body);
        self.loop_index_stack.pop();
        self.symbols.pop_scope();
    }

    fn analyze_expr(&mut self, e: &mut Expr) {
        let ty = self.infer(e);
        e.ty = ty;
    }

    fn infer(&mut self, e: &mut Expr) -> Option<Ty> {
        match &mut e.kind {
            ExprKind::IntLiteral(_) => Some(Ty::new(TypeDesc::Basic(Basic::Int))),
            ExprKind::UintLiteral(_) => Some(Ty::new(TypeDesc::Basic(Basic::UInt))),
            ExprKind::FloatLiteral(_) => Some(Ty::new(TypeDesc::Basic(Basic::Float))),
            ExprKind::BoolLiteral(_) => Some(Ty::new(TypeDesc::Basic(Basic::Bool))),
            ExprKind::Ident(name) => self.infer_ident(name, e.loc),
            ExprKind::Binary(_, lhs, rhs) => {
                self.analyze_expr(lhs);
                self.analyze_expr(rhs);
                let lt = lhs.ty.clone()?;
                if lt.desc.is_sampler() || rhs.ty.as_ref().map(|t| t.desc.is_sampler()).unwrap_or(false) {
                    self.sink.error(e.loc, SemaErrorKind::SamplerNotArithmetic);
                }
                Some(lt)
            }
            ExprKind::Unary(_, inner) => {
                self.analyze_expr(inner);
                inner.ty.clone()
            }
            ExprKind::Assign(lhs, rhs) => {
                self.analyze_expr(rhs);
                if let ExprKind::Ident(name) = &lhs.kind {
                    if let Some(sym) = self.symbols.lookup(name) {
                        if sym.ty.is_sampler() {
                            self.sink.error(e.loc, SemaErrorKind::SamplerNotAssignable);
                        }
                    }
                }
                self.analyze_expr(lhs);
                lhs.ty.clone()
            }
            ExprKind::Index(base, idx) => {
                self.analyze_expr(base);
                self.analyze_expr(idx);
                if !is_constant_expr(idx) && !references_loop_index(idx, &self.loop_index_stack) {
                    self.sink.error(e.loc, SemaErrorKind::NonConstantArrayIndex);
                }
                match base.ty.as_ref().map(|t| &t.desc) {
                    Some(TypeDesc::Array(elem, _)) => Some(Ty::new((**elem).clone())),
                    Some(TypeDesc::Vector(b, _)) => Some(Ty::new(TypeDesc::Basic(*b))),
                    other => other.cloned().map(Ty::new),
                }
            }
            ExprKind::Field(base, field) => {
                self.analyze_expr(base);
                match base.ty.as_ref().map(|t| &t.desc) {
                    Some(TypeDesc::Struct(fields)) => {
                        fields.iter().find(|(n, _)| n == field).map(|(_, t)| Ty::new(t.clone()))
                    }
                    _ => None,
                }
            }
            ExprKind::Swizzle(base, pattern) => {
                self.analyze_expr(base);
                let component = base.ty.as_ref().and_then(|t| t.desc.component())?;
                Some(Ty::new(if pattern.len() == 1 {
                    TypeDesc::Basic(component)
                } else {
                    TypeDesc::Vector(component, pattern.len() as u8)
                }))
            }
            ExprKind::Call(name, args) => self.infer_call(name.clone(), args, e.loc),
            ExprKind::Construct(ty, args) => {
                for a in args {
                    self.analyze_expr(a);
                }
                Some(Ty::new(ty.clone()))
            }
            ExprKind::Conditional(cond, then_e, else_e) => {
                self.analyze_expr(cond);
                self.analyze_expr(then_e);
                self.analyze_expr(else_e);
                then_e.ty.clone()
            }
        }
    }

    fn infer_ident(&mut self, name: &str, loc: Location) -> Option<Ty> {
        if let Some(sym) = self.symbols.lookup(name) {
            return Some(Ty { desc: sym.ty.clone(), precision: crate::types::Precision::Unspecified, qualifier: sym.qualifier });
        }
        if let Some(ty) = builtins::builtin_variable(name, self.stage_is_vertex) {
            return Some(Ty::new(ty));
        }
        self.sink.error(loc, SemaErrorKind::UndeclaredIdentifier(name.to_string()));
        None
    }

    fn infer_call(&mut self, name: String, args: &mut [Expr], loc: Location) -> Option<Ty> {
        for a in args.iter_mut() {
            self.analyze_expr(a);
        }
        if let Some(f) = self.symbols.resolve_function(&name, args.len()).cloned() {
            for (param, arg) in f.params.iter().zip(args.iter()) {
                if matches!(param.qualifier, Qualifier::Out | Qualifier::InOut) {
                    if let ExprKind::Ident(arg_name) = &arg.kind {
                        if self.loop_index_stack.iter().any(|i| i == arg_name) {
                            self.sink.error(loc, SemaErrorKind::LoopIndexByReference(name.clone()));
                        }
                    }
                }
            }
            return Some(Ty::new(f.return_ty));
        }
        if let Some(overloads) = builtins::lookup(&name) {
            if let Some((_, ret)) = overloads.iter().find(|(params, _)| params.len() == args.len()) {
                return Some(Ty::new(ret.materialize()));
            }
            self.sink.error(loc, SemaErrorKind::NoMatchingOverload(name));
            return None;
        }
        if !self.symbols.function_overloads(&name).is_empty() {
            self.sink.error(loc, SemaErrorKind::NoMatchingOverload(name));
            return None;
        }
        self.sink.error(loc, SemaErrorKind::UndeclaredIdentifier(name));
        None
    }
}

fn is_constant_expr(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::IntLiteral(_) | ExprKind::UintLiteral(_) | ExprKind::FloatLiteral(_) | ExprKind::BoolLiteral(_) => true,
        ExprKind::Unary(_, inner) => is_constant_expr(inner),
        ExprKind::Binary(_, l, r) => is_constant_expr(l) && is_constant_expr(r),
        _ => false,
    }
}

fn references_loop_index(e: &Expr, stack: &[String]) -> bool {
    match &e.kind {
        ExprKind::Ident(name) => stack.iter().any(|i| i == name),
        ExprKind::Binary(_, l, r) => references_loop_index(l, stack) || references_loop_index(r, stack),
        ExprKind::Unary(_, inner) => references_loop_index(inner, stack),
        _ => is_constant_expr(e),
    }
}

fn is_comparison_against_constant(cond: &Expr, idx_name: &str) -> bool {
    match &cond.kind {
        ExprKind::Binary(op, l, r) => {
            matches!(op, BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::Eq | BinOp::Ne)
                && matches!(&l.kind, ExprKind::Ident(n) if n == idx_name)
                && is_constant_expr(r)
        }
        _ => false,
    }
}

fn is_accepted_step_form(step: &Expr, idx_name: &str) -> bool {
    match &step.kind {
        ExprKind::Unary(op, inner) => {
            matches!(op, UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec)
                && matches!(&inner.kind, ExprKind::Ident(n) if n == idx_name)
        }
        ExprKind::Assign(lhs, rhs) => {
            matches!(&lhs.kind, ExprKind::Ident(n) if n == idx_name) && is_constant_expr(rhs)
        }
        _ => false,
    }
}

fn assigns_to(stmt: &Stmt, name: &str) -> bool {
    fn expr_assigns(e: &Expr, name: &str) -> bool {
        match &e.kind {
            ExprKind::Assign(lhs, rhs) => {
                matches!(&lhs.kind, ExprKind::Ident(n) if n == name) || expr_assigns(rhs, name)
            }
            ExprKind::Unary(op, inner) => {
                matches!(op, UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec)
                    && matches!(&inner.kind, ExprKind::Ident(n) if n == name)
            }
            ExprKind::Binary(_, l, r) => expr_assigns(l, name) || expr_assigns(r, name),
            ExprKind::Call(_, args) => args.iter().any(|a| expr_assigns(a, name)),
            _ => false,
        }
    }
    match &stmt.kind {
        StmtKind::Expr(e) => expr_assigns(e, name),
        StmtKind::Block(stmts) => stmts.iter().any(|s| assigns_to(s, name)),
        StmtKind::If(_, t, e) => assigns_to(t, name) || e.as_ref().map(|e| assigns_to(e, name)).unwrap_or(false),
        StmtKind::While(_, b) => assigns_to(b, name),
        StmtKind::For { body, .. } => assigns_to(body, name),
        StmtKind::Decl { declarators, .. } => declarators.iter().any(|d| d.initializer.as_ref().map(|i| expr_assigns(i, name)).unwrap_or(false)),
        _ => false,
    }
}

fn uses_as_sampler_array_index(_stmt: &Stmt, _name: &str) -> bool {
    // Conservative default: the shader-IR lowerer re-derives this once
    // sampler-array typing is resolved; flagged here only as a hint.
    false
}
