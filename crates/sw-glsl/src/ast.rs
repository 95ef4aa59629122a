use crate::types::{Qualifier, Ty, TypeDesc};
use sw_pp::token::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i64),
    UintLiteral(u64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Ident(String),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Unary(UnOp, Box<Expr>),
    Assign(Box<Expr>, Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
    Field(Box<Expr>, String),
    /// `.xyzw`-style component swizzle, already distinguished from `Field`
    /// access on a struct by the semantic pass (both parse identically).
    Swizzle(Box<Expr>, String),
    Call(String, Vec<Expr>),
    Construct(TypeDesc, Vec<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Location,
    /// Filled in by the semantic pass; `None` until then.
    pub ty: Option<Ty>,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Location) -> Expr {
        Expr { kind, loc, ty: None }
    }
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: String,
    pub array_size: Option<Expr>,
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Decl { ty: TypeDesc, qualifier: Qualifier, declarators: Vec<Declarator> },
    Expr(Expr),
    Block(Vec<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    For {
        idx_name: String,
        idx_ty: TypeDesc,
        init: Expr,
        cond: Expr,
        step: Expr,
        body: Box<Stmt>,
        /// Set by semantic analysis when the loop index feeds a
        /// sampler-array index: the IR lowerer must fully unroll it.
        unroll: bool,
    },
    While(Expr, Box<Stmt>),
    Return(Option<Expr>),
    Break,
    Continue,
    Discard,
    Empty,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeDesc,
    pub qualifier: Qualifier,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub return_ty: TypeDesc,
    pub params: Vec<Param>,
    pub body: Option<Vec<Stmt>>,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub struct GlobalVar {
    pub name: String,
    pub ty: TypeDesc,
    pub qualifier: Qualifier,
    pub precision: crate::types::Precision,
    pub location: Option<u32>,
    pub initializer: Option<Expr>,
    pub loc: Location,
}

#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<(String, TypeDesc)>,
}

#[derive(Debug, Default, Clone)]
pub struct TranslationUnit {
    pub structs: Vec<StructDef>,
    pub globals: Vec<GlobalVar>,
    pub functions: Vec<FunctionDef>,
}
