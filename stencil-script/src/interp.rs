//! Tree-walking interpreter for the stencil script.
//!
//! Execution uses one flat environment — module-scope semantics, so a loop
//! variable stays bound after its loop, matching what generated programs
//! and raw-block authors expect. Each call builds a fresh [`Interpreter`];
//! nothing is shared between runs.

use std::collections::HashMap;
use std::path::Path;

use stencil_core::{Params, Value};

use crate::ast::{BinOp, Expr, FsPart, Stmt, Target, UnaryOp};
use crate::builtins;
use crate::error::ScriptError;

/// Interpreter state for a single program run.
#[derive(Debug, Default)]
pub struct Interpreter {
    env: HashMap<String, Value>,
    emitted: Vec<String>,
    export: Option<Params>,
    /// Program line of the statement currently executing.
    line: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a parsed program.
    pub fn run(&mut self, stmts: &[Stmt]) -> Result<(), ScriptError> {
        self.exec_block(stmts)
    }

    /// The `_render` variable, if the program assigned one.
    pub fn rendered(&self) -> Option<&str> {
        match self.env.get("_render") {
            Some(Value::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// The namespace passed to `export(…)`, if any.
    pub fn exported(&self) -> Option<&Params> {
        self.export.as_ref()
    }

    /// Lines collected by `emit(…)` so far, in emission order.
    pub fn emitted_lines(&self) -> &[String] {
        &self.emitted
    }

    // -- statements ---------------------------------------------------------

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), ScriptError> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<(), ScriptError> {
        self.line = stmt.line();
        match stmt {
            Stmt::Expr { expr, .. } => {
                self.eval(expr)?;
            }
            Stmt::Assign { target, value, .. } => {
                let value = self.eval(value)?;
                self.assign(target, value)?;
            }
            Stmt::If {
                arms, else_body, ..
            } => {
                for (cond, body) in arms {
                    if self.eval(cond)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                if let Some(body) = else_body {
                    self.exec_block(body)?;
                }
            }
            Stmt::While { cond, body, line } => {
                loop {
                    self.line = *line;
                    if !self.eval(cond)?.is_truthy() {
                        break;
                    }
                    self.exec_block(body)?;
                }
            }
            Stmt::For {
                var, iter, body, ..
            } => {
                let items = self.iterable(iter)?;
                for item in items {
                    self.env.insert(var.clone(), item);
                    self.exec_block(body)?;
                }
            }
        }
        Ok(())
    }

    fn iterable(&mut self, iter: &Expr) -> Result<Vec<Value>, ScriptError> {
        match self.eval(iter)? {
            Value::List(items) => Ok(items),
            Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
            Value::Map(m) => Ok(m.keys().map(|k| Value::Str(k.clone())).collect()),
            other => Err(self.rt(format!("{} is not iterable", other.type_name()))),
        }
    }

    // -- assignment ---------------------------------------------------------

    fn assign(&mut self, target: &Target, value: Value) -> Result<(), ScriptError> {
        let line = self.line;
        let (root, segs) = self.flatten_target(target)?;
        if segs.is_empty() {
            self.env.insert(root, value);
            return Ok(());
        }
        if !self.env.contains_key(&root) {
            return Err(ScriptError::Undefined { line, name: root });
        }
        let (last, walk) = segs.split_last().expect("non-empty path");
        let mut slot = self.env.get_mut(&root).expect("key checked above");
        for seg in walk {
            slot = step_into(slot, seg, line)?;
        }
        match (slot, last) {
            (Value::Map(map), Seg::Attr(key) | Seg::Key(key)) => {
                map.insert(key.clone(), value);
                Ok(())
            }
            (Value::List(list), Seg::Pos(idx)) => {
                let i = normalize_index(*idx, list.len()).ok_or(ScriptError::Runtime {
                    line,
                    message: format!("list index {idx} out of range"),
                })?;
                list[i] = value;
                Ok(())
            }
            (other, Seg::Attr(key) | Seg::Key(key)) => Err(ScriptError::Runtime {
                line,
                message: format!("cannot set '{key}' on a {}", other.type_name()),
            }),
            (other, Seg::Pos(_)) => Err(ScriptError::Runtime {
                line,
                message: format!("cannot index into a {}", other.type_name()),
            }),
        }
    }

    /// Reduce a target to its root name plus a path of evaluated segments.
    fn flatten_target(&mut self, target: &Target) -> Result<(String, Vec<Seg>), ScriptError> {
        match target {
            Target::Name(name) => Ok((name.clone(), Vec::new())),
            Target::Attr { base, attr } => {
                let (root, mut segs) = self.flatten_target(base)?;
                segs.push(Seg::Attr(attr.clone()));
                Ok((root, segs))
            }
            Target::Index { base, index } => {
                let idx = self.eval(index)?;
                let (root, mut segs) = self.flatten_target(base)?;
                segs.push(match idx {
                    Value::Str(key) => Seg::Key(key),
                    Value::Int(pos) => Seg::Pos(pos),
                    other => {
                        return Err(self.rt(format!(
                            "index must be a str or int, got {}",
                            other.type_name()
                        )))
                    }
                });
                Ok((root, segs))
            }
        }
    }

    // -- expressions --------------------------------------------------------

    fn eval(&mut self, expr: &Expr) -> Result<Value, ScriptError> {
        match expr {
            Expr::None => Ok(Value::None),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Int(i) => Ok(Value::Int(*i)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::FStr(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        FsPart::Lit(s) => out.push_str(s),
                        FsPart::Expr(e) => out.push_str(&self.eval(e)?.render_to_string()),
                    }
                }
                Ok(Value::Str(out))
            }
            Expr::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item)?);
                }
                Ok(Value::List(out))
            }
            Expr::Map(entries) => {
                let mut map = std::collections::BTreeMap::new();
                for (key, value) in entries {
                    let key = match self.eval(key)? {
                        Value::Str(s) => s,
                        other => {
                            return Err(self.rt(format!(
                                "map keys must be strings, got {}",
                                other.type_name()
                            )))
                        }
                    };
                    map.insert(key, self.eval(value)?);
                }
                Ok(Value::Map(map))
            }
            Expr::Name(name) => match self.env.get(name) {
                Some(v) => Ok(v.clone()),
                None => Err(ScriptError::Undefined {
                    line: self.line,
                    name: name.clone(),
                }),
            },
            Expr::Attr { base, attr } => match self.eval(base)? {
                // Absent map keys read as none — the namespace's
                // default-absent contract.
                Value::Map(m) => Ok(m.get(attr).cloned().unwrap_or(Value::None)),
                other => Err(self.rt(format!("{} has no attributes", other.type_name()))),
            },
            Expr::Index { base, index } => {
                let base = self.eval(base)?;
                let index = self.eval(index)?;
                self.index(base, index)
            }
            Expr::Call { func, args } => {
                let mut vals = Vec::with_capacity(args.len());
                for arg in args {
                    vals.push(self.eval(arg)?);
                }
                self.call(func, vals)
            }
            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
                    UnaryOp::Neg => match v {
                        Value::Int(i) => Ok(Value::Int(-i)),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => {
                            Err(self.rt(format!("cannot negate a {}", other.type_name())))
                        }
                    },
                }
            }
            Expr::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
        }
    }

    fn index(&self, base: Value, index: Value) -> Result<Value, ScriptError> {
        match (base, index) {
            (Value::List(list), Value::Int(i)) => {
                let idx = normalize_index(i, list.len()).ok_or_else(|| {
                    self.rt(format!("list index {i} out of range"))
                })?;
                Ok(list[idx].clone())
            }
            (Value::Str(s), Value::Int(i)) => {
                let chars: Vec<char> = s.chars().collect();
                let idx = normalize_index(i, chars.len()).ok_or_else(|| {
                    self.rt(format!("string index {i} out of range"))
                })?;
                Ok(Value::Str(chars[idx].to_string()))
            }
            // Map reads share the default-absent contract with attributes.
            (Value::Map(m), Value::Str(key)) => Ok(m.get(&key).cloned().unwrap_or(Value::None)),
            (base, index) => Err(self.rt(format!(
                "cannot index {} with {}",
                base.type_name(),
                index.type_name()
            ))),
        }
    }

    // -- calls --------------------------------------------------------------

    fn call(&mut self, func: &str, args: Vec<Value>) -> Result<Value, ScriptError> {
        match func {
            "emit" => {
                let [arg] = self.exact::<1>("emit", args)?;
                self.emitted.push(arg.render_to_string());
                Ok(Value::None)
            }
            "emitted" => {
                self.exact::<0>("emitted", args)?;
                Ok(Value::Str(self.emitted.join("\n")))
            }
            "params" => {
                let [arg] = self.exact::<1>("params", args)?;
                let Value::Str(path) = arg else {
                    return Err(self.rt(format!(
                        "params() expects a path str, got {}",
                        arg.type_name()
                    )));
                };
                let loaded = Params::load(Path::new(&path))
                    .map_err(|e| self.rt(e.to_string()))?;
                Ok(Value::Map(loaded.into_map()))
            }
            "merge" => {
                let [dst, src] = self.exact::<2>("merge", args)?;
                let (Value::Map(mut dst), Value::Map(src)) = (dst, src) else {
                    return Err(self.rt("merge() expects two maps".to_string()));
                };
                dst.extend(src);
                Ok(Value::Map(dst))
            }
            "export" => {
                let [arg] = self.exact::<1>("export", args)?;
                let Value::Map(map) = arg else {
                    return Err(self.rt(format!(
                        "export() expects a map, got {}",
                        arg.type_name()
                    )));
                };
                self.export = Some(Params::from(map));
                Ok(Value::None)
            }
            "dump" => {
                let [arg] = self.exact::<1>("dump", args)?;
                print!("{}", arg.render_to_string());
                Ok(Value::None)
            }
            name => match builtins::lookup(name) {
                Some(f) => f(&args).map_err(|message| ScriptError::Runtime {
                    line: self.line,
                    message,
                }),
                None => Err(ScriptError::UnknownFunction {
                    line: self.line,
                    name: name.to_string(),
                }),
            },
        }
    }

    fn exact<const N: usize>(
        &self,
        name: &str,
        args: Vec<Value>,
    ) -> Result<[Value; N], ScriptError> {
        let got = args.len();
        args.try_into().map_err(|_| {
            self.rt(format!("{name}() takes {N} argument(s), got {got}"))
        })
    }

    // -- operators ----------------------------------------------------------

    fn eval_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr) -> Result<Value, ScriptError> {
        // `and`/`or` short-circuit and yield an operand, not a bool.
        match op {
            BinOp::And => {
                let l = self.eval(lhs)?;
                return if l.is_truthy() { self.eval(rhs) } else { Ok(l) };
            }
            BinOp::Or => {
                let l = self.eval(lhs)?;
                return if l.is_truthy() { Ok(l) } else { self.eval(rhs) };
            }
            _ => {}
        }
        let l = self.eval(lhs)?;
        let r = self.eval(rhs)?;
        match op {
            BinOp::Add => match (l, r) {
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (Value::List(mut a), Value::List(b)) => {
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (l, r) => self.arith(op, l, r),
            },
            BinOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
            BinOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => self.compare(op, l, r),
            _ => self.arith(op, l, r),
        }
    }

    fn arith(&self, op: BinOp, l: Value, r: Value) -> Result<Value, ScriptError> {
        let pair = match (numeric(&l), numeric(&r)) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(self.rt(format!(
                    "unsupported operand types: {} and {}",
                    l.type_name(),
                    r.type_name()
                )))
            }
        };
        match pair {
            (Num::Int(a), Num::Int(b)) => self.int_arith(op, a, b),
            (a, b) => self.float_arith(op, a.as_f64(), b.as_f64()),
        }
    }

    fn int_arith(&self, op: BinOp, a: i64, b: i64) -> Result<Value, ScriptError> {
        let overflow = || self.rt("integer overflow".to_string());
        match op {
            BinOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            BinOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            BinOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
            // `/` is true division and always yields a float.
            BinOp::Div => {
                if b == 0 {
                    Err(self.rt("division by zero".to_string()))
                } else {
                    Ok(Value::Float(a as f64 / b as f64))
                }
            }
            BinOp::FloorDiv => {
                if b == 0 {
                    return Err(self.rt("division by zero".to_string()));
                }
                let q = a / b;
                let r = a % b;
                Ok(Value::Int(if r != 0 && (r < 0) != (b < 0) { q - 1 } else { q }))
            }
            // Remainder takes the sign of the divisor.
            BinOp::Rem => {
                if b == 0 {
                    return Err(self.rt("division by zero".to_string()));
                }
                let r = a % b;
                Ok(Value::Int(if r != 0 && (r < 0) != (b < 0) { r + b } else { r }))
            }
            _ => unreachable!("non-arithmetic op {op:?}"),
        }
    }

    fn float_arith(&self, op: BinOp, a: f64, b: f64) -> Result<Value, ScriptError> {
        match op {
            BinOp::Add => Ok(Value::Float(a + b)),
            BinOp::Sub => Ok(Value::Float(a - b)),
            BinOp::Mul => Ok(Value::Float(a * b)),
            BinOp::Div => {
                if b == 0.0 {
                    Err(self.rt("division by zero".to_string()))
                } else {
                    Ok(Value::Float(a / b))
                }
            }
            BinOp::FloorDiv => {
                if b == 0.0 {
                    Err(self.rt("division by zero".to_string()))
                } else {
                    Ok(Value::Float((a / b).floor()))
                }
            }
            BinOp::Rem => {
                if b == 0.0 {
                    Err(self.rt("division by zero".to_string()))
                } else {
                    Ok(Value::Float(a - (a / b).floor() * b))
                }
            }
            _ => unreachable!("non-arithmetic op {op:?}"),
        }
    }

    fn compare(&self, op: BinOp, l: Value, r: Value) -> Result<Value, ScriptError> {
        let ordering = match (&l, &r) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => match (numeric(&l), numeric(&r)) {
                (Some(a), Some(b)) => a
                    .as_f64()
                    .partial_cmp(&b.as_f64())
                    .ok_or_else(|| self.rt("cannot order NaN".to_string()))?,
                _ => {
                    return Err(self.rt(format!(
                        "cannot order {} and {}",
                        l.type_name(),
                        r.type_name()
                    )))
                }
            },
        };
        let result = match op {
            BinOp::Lt => ordering.is_lt(),
            BinOp::Le => ordering.is_le(),
            BinOp::Gt => ordering.is_gt(),
            BinOp::Ge => ordering.is_ge(),
            _ => unreachable!("non-comparison op {op:?}"),
        };
        Ok(Value::Bool(result))
    }

    fn rt(&self, message: String) -> ScriptError {
        ScriptError::Runtime {
            line: self.line,
            message,
        }
    }
}

/// One evaluated segment of an assignment path.
#[derive(Debug, Clone)]
enum Seg {
    Attr(String),
    Key(String),
    Pos(i64),
}

/// Navigate one segment deeper; intermediate path segments must exist.
fn step_into<'a>(slot: &'a mut Value, seg: &Seg, line: usize) -> Result<&'a mut Value, ScriptError> {
    match (slot, seg) {
        (Value::Map(map), Seg::Attr(key) | Seg::Key(key)) => {
            map.get_mut(key).ok_or_else(|| ScriptError::Runtime {
                line,
                message: format!("no such key '{key}'"),
            })
        }
        (Value::List(list), Seg::Pos(idx)) => {
            let len = list.len();
            let i = normalize_index(*idx, len).ok_or(ScriptError::Runtime {
                line,
                message: format!("list index {idx} out of range"),
            })?;
            Ok(&mut list[i])
        }
        (other, _) => Err(ScriptError::Runtime {
            line,
            message: format!("cannot navigate into a {}", other.type_name()),
        }),
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

fn numeric(v: &Value) -> Option<Num> {
    match v {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f)),
        Value::Bool(b) => Some(Num::Int(i64::from(*b))),
        _ => None,
    }
}

/// Equality with int/float cross-promotion; mismatched shapes are unequal.
fn values_equal(l: &Value, r: &Value) -> bool {
    match (numeric(l), numeric(r)) {
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => l == r,
    }
}

fn normalize_index(idx: i64, len: usize) -> Option<usize> {
    let i = if idx < 0 { idx + len as i64 } else { idx };
    (0..len as i64).contains(&i).then_some(i as usize)
}
