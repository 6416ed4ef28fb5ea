//! Source-text front end
//!
//! Lowers Rust-syntax expressions, parsed with `syn`, onto lvalue paths and
//! runtime operations:
//!
//! ```text
//! "v[i][\"k\"] += 2"  →  syn::Expr  →  LvaluePath + CompoundOp  →  ThreadContext
//! ```
//!
//! Only the expression forms the value core can act on are accepted:
//! variables, `self.x`, indexing, field access, literals, array literals,
//! unary `-`/`!`, `=`, compound assignment and `let` bindings.

use quote::ToTokens;
use syn::{BinOp, Expr, Lit, Member, Pat, Stmt, UnOp};

use crate::error::{Result, RuntimeError};
use crate::ops::CompoundOp;
use crate::path::LvaluePath;
use crate::runtime::ThreadContext;
use crate::value::{NodeKind, Value};

// ═══════════════════════════════════════════════════════════════════════
// Parsing
// ═══════════════════════════════════════════════════════════════════════

fn parse_error(e: syn::Error) -> RuntimeError {
    RuntimeError::Parse {
        message: e.to_string(),
    }
}

/// Parse a single expression.
pub fn parse_expr(source: &str) -> Result<Expr> {
    syn::parse_str::<Expr>(source).map_err(parse_error)
}

/// Parse a sequence of statements (`a = 1; b += a`).
pub fn parse_statements(source: &str) -> Result<Vec<Stmt>> {
    syn::parse_str::<syn::Block>(&format!("{{ {} }}", source))
        .map(|block| block.stmts)
        .map_err(parse_error)
}

/// Parse an lvalue whose indices are all constants.
///
/// # Example
///
/// ```
/// use ferrule::frontend::parse_lvalue;
/// use ferrule::LvaluePath;
///
/// let path = parse_lvalue("v[2][\"k\"].x").unwrap();
/// assert_eq!(path, LvaluePath::var("v").index(2).key("k").key("x"));
/// ```
pub fn parse_lvalue(source: &str) -> Result<LvaluePath> {
    let expr = parse_expr(source)?;
    lower_lvalue(&expr, &mut |e| {
        eval_rvalue(e, &mut |path| {
            Err(RuntimeError::UnsupportedExpression {
                kind: format!("variable index `{}` outside a running context", path),
            })
        })
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Lowering
// ═══════════════════════════════════════════════════════════════════════

fn render(expr: &Expr) -> String {
    expr.to_token_stream().to_string()
}

fn invalid_lvalue(expr: &Expr) -> RuntimeError {
    RuntimeError::InvalidLvalue { expr: render(expr) }
}

fn unsupported(kind: &str) -> RuntimeError {
    RuntimeError::UnsupportedExpression {
        kind: kind.to_string(),
    }
}

fn is_self(expr: &Expr) -> bool {
    matches!(expr, Expr::Path(p) if p.qself.is_none() && p.path.is_ident("self"))
}

/// Lower an expression to a path. Index expressions are evaluated with
/// `index`; a text index selects a key, anything else a position.
pub fn lower_lvalue(
    expr: &Expr,
    index: &mut dyn FnMut(&Expr) -> Result<Value>,
) -> Result<LvaluePath> {
    match expr {
        Expr::Path(p) if p.qself.is_none() && !is_self(expr) => match p.path.get_ident() {
            Some(ident) => Ok(LvaluePath::var(ident.to_string())),
            None => Err(invalid_lvalue(expr)),
        },
        Expr::Field(field) => {
            let name = match &field.member {
                Member::Named(ident) => ident.to_string(),
                Member::Unnamed(n) => {
                    return Ok(lower_lvalue(&field.base, index)?.index(i64::from(n.index)))
                }
            };
            if is_self(&field.base) {
                Ok(LvaluePath::self_member(name))
            } else {
                Ok(lower_lvalue(&field.base, index)?.key(name))
            }
        }
        Expr::Index(ix) => {
            let base = lower_lvalue(&ix.expr, index)?;
            let selector = index(&ix.index)?;
            Ok(match selector.as_str() {
                Some(key) => base.key(key),
                None => base.index(selector.as_int()),
            })
        }
        Expr::Paren(p) => lower_lvalue(&p.expr, index),
        Expr::Group(g) => lower_lvalue(&g.expr, index),
        _ => Err(invalid_lvalue(expr)),
    }
}

/// Evaluate an expression that cannot change anything. Lvalue-shaped
/// sub-expressions are read through `read`.
pub fn eval_rvalue(
    expr: &Expr,
    read: &mut dyn FnMut(&LvaluePath) -> Result<Value>,
) -> Result<Value> {
    match expr {
        Expr::Lit(lit) => eval_lit(&lit.lit),
        Expr::Array(array) => {
            let mut items = Vec::with_capacity(array.elems.len());
            for elem in &array.elems {
                items.push(eval_rvalue(elem, &mut *read)?);
            }
            Ok(Value::sequence(items))
        }
        Expr::Unary(unary) => {
            let operand = eval_rvalue(&unary.expr, read)?;
            match unary.op {
                UnOp::Neg(_) => {
                    let float = matches!(operand, Value::Float(_))
                        || operand.kind() == Some(NodeKind::Float);
                    Ok(if float {
                        Value::Float(-operand.as_float())
                    } else {
                        Value::Int(operand.as_int().wrapping_neg())
                    })
                }
                UnOp::Not(_) => Ok(Value::Bool(!operand.as_bool())),
                _ => Err(unsupported("dereference")),
            }
        }
        Expr::Paren(p) => eval_rvalue(&p.expr, read),
        Expr::Group(g) => eval_rvalue(&g.expr, read),
        Expr::Path(_) | Expr::Field(_) | Expr::Index(_) => {
            let path = lower_lvalue(expr, &mut |e| eval_rvalue(e, &mut *read))?;
            read(&path)
        }
        Expr::Binary(_) => Err(unsupported("binary operator")),
        Expr::Call(_) | Expr::MethodCall(_) => Err(unsupported("call")),
        Expr::Assign(_) => Err(unsupported("assignment in value position")),
        _ => Err(unsupported(&render(expr))),
    }
}

fn eval_lit(lit: &Lit) -> Result<Value> {
    match lit {
        Lit::Str(s) => Ok(Value::text(s.value())),
        Lit::ByteStr(bs) => Ok(Value::binary(bs.value())),
        Lit::Int(i) => i.base10_parse::<i64>().map(Value::Int).map_err(parse_error),
        Lit::Float(f) => f.base10_parse::<f64>().map(Value::Float).map_err(parse_error),
        Lit::Bool(b) => Ok(Value::Bool(b.value)),
        Lit::Char(c) => Ok(Value::text(c.value().to_string())),
        _ => Err(unsupported("literal")),
    }
}

/// Map a compound-assignment token onto its operator.
pub fn compound_op(op: &BinOp) -> Option<CompoundOp> {
    Some(match op {
        BinOp::AddAssign(_) => CompoundOp::Add,
        BinOp::SubAssign(_) => CompoundOp::Sub,
        BinOp::MulAssign(_) => CompoundOp::Mul,
        BinOp::DivAssign(_) => CompoundOp::Div,
        BinOp::RemAssign(_) => CompoundOp::Rem,
        BinOp::BitAndAssign(_) => CompoundOp::BitAnd,
        BinOp::BitOrAssign(_) => CompoundOp::BitOr,
        BinOp::BitXorAssign(_) => CompoundOp::BitXor,
        BinOp::ShlAssign(_) => CompoundOp::Shl,
        BinOp::ShrAssign(_) => CompoundOp::Shr,
        _ => return None,
    })
}

// ═══════════════════════════════════════════════════════════════════════
// Execution
// ═══════════════════════════════════════════════════════════════════════

impl ThreadContext {
    /// Run source text and return the value of the last statement.
    ///
    /// `let x = e;` defines a local in the current frame. Assignments
    /// evaluate to the stored value, compound assignments to the new value.
    pub fn exec(&mut self, source: &str) -> Result<Value> {
        let mut last = Value::Nothing;
        for stmt in parse_statements(source)? {
            last = match &stmt {
                Stmt::Local(local) => {
                    let Pat::Ident(binding) = &local.pat else {
                        return Err(unsupported("destructuring let"));
                    };
                    let value = match &local.init {
                        Some(init) => self.eval(&init.expr)?,
                        None => Value::Nothing,
                    };
                    self.env_mut().define(binding.ident.to_string(), value);
                    Value::Nothing
                }
                Stmt::Expr(expr, _) => self.eval(expr)?,
                Stmt::Item(_) => return Err(unsupported("item")),
                Stmt::Macro(_) => return Err(unsupported("macro")),
            };
        }
        Ok(last)
    }

    /// Evaluate one expression against this context.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Assign(assign) => {
                let path = self.lvalue(&assign.left)?;
                let value = self.eval(&assign.right)?;
                self.assign(&path, value.clone())?;
                Ok(value)
            }
            Expr::Binary(binary) => match compound_op(&binary.op) {
                Some(op) => {
                    let path = self.lvalue(&binary.left)?;
                    let operand = self.eval(&binary.right)?;
                    self.apply(&path, op, &operand)
                }
                None => Err(unsupported(&format!(
                    "binary operator `{}`",
                    binary.op.to_token_stream()
                ))),
            },
            _ => eval_rvalue(expr, &mut |path| self.get(path)),
        }
    }

    /// Lower an lvalue expression, evaluating its indices in this context.
    pub fn lvalue(&mut self, expr: &Expr) -> Result<LvaluePath> {
        lower_lvalue(expr, &mut |e| self.eval(e))
    }
}
