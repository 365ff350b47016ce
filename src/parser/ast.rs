//! Internal statement forms for the in-memory backend. Covers exactly
//! the shapes the writer emits plus the SELECTs tests read back with.

use crate::core::Value;

#[derive(Debug, Clone)]
pub enum Statement {
    Insert(InsertStmt),
    Update(UpdateStmt),
    Select(SelectStmt),
}

#[derive(Debug, Clone)]
pub struct InsertStmt {
    pub table_name: String,
    pub columns: Vec<String>,
    /// `None` is the DEFAULT VALUES form.
    pub values: Option<Vec<Expr>>,
    pub on_conflict: Option<OnConflictClause>,
    pub returning: bool,
}

#[derive(Debug, Clone)]
pub struct OnConflictClause {
    pub target: Vec<String>,
    pub action: ConflictAction,
}

#[derive(Debug, Clone)]
pub enum ConflictAction {
    DoNothing,
    DoUpdate(Vec<Assignment>),
}

#[derive(Debug, Clone)]
pub struct UpdateStmt {
    pub table_name: String,
    pub assignments: Vec<Assignment>,
    pub selection: Option<Predicate>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct SelectStmt {
    pub table_name: String,
    /// Empty means `*`.
    pub projection: Vec<String>,
    pub selection: Option<Predicate>,
}

/// Single equality comparison; all the writer and its tests ever need.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub column: String,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    /// 1-based positional bind parameter (`$1`).
    Placeholder(usize),
    /// `EXCLUDED.<col>` inside a DO UPDATE assignment.
    Excluded(String),
}
