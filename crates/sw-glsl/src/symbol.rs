use crate::ast::FunctionDef;
use crate::types::{Qualifier, TypeDesc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct VarSymbol {
    pub ty: TypeDesc,
    pub qualifier: Qualifier,
    pub is_const_expr: bool,
    /// Set while walking the body of a `for` loop whose index this symbol
    /// is; lets expression validation accept it where only constant
    /// expressions would otherwise be allowed.
    pub is_loop_index: bool,
}

/// A stack of lexical scopes; `sw-glsl` has no nested function
/// declarations, so only block scopes are pushed/popped during a single
/// function body walk, with one base scope for globals.
#[derive(Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, VarSymbol>>,
    functions: HashMap<String, Vec<FunctionDef>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable { scopes: vec![HashMap::new()], functions: HashMap::new() }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn declare(&mut self, name: &str, sym: VarSymbol) -> Result<(), ()> {
        let scope = self.scopes.last_mut().expect("at least one scope");
        if scope.contains_key(name) {
            return Err(());
        }
        scope.insert(name.to_string(), sym);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&VarSymbol> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut VarSymbol> {
        self.scopes.iter_mut().rev().find_map(|s| s.get_mut(name))
    }

    pub fn declare_function(&mut self, f: FunctionDef) {
        self.functions.entry(f.name.clone()).or_default().push(f);
    }

    pub fn resolve_function(&self, name: &str, arg_count: usize) -> Option<&FunctionDef> {
        self.functions.get(name)?.iter().find(|f| f.params.len() == arg_count)
    }

    pub fn function_overloads(&self, name: &str) -> &[FunctionDef] {
        self.functions.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }
}
