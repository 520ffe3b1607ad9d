//! The fixed builtin function registry available to generated programs.
//!
//! Builtins are pure: they see their arguments and nothing else. Anything
//! that touches execution state (`emit`, `params`, `export`, …) is an
//! interpreter intrinsic instead.

use stencil_core::Value;

/// A registry function. Errors are plain messages; the interpreter wraps
/// them with the failing program line.
pub type Builtin = fn(&[Value]) -> Result<Value, String>;

/// Look up a registry function by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    Some(match name {
        "range" => range,
        "len" => len,
        "str" => to_str,
        "int" => to_int,
        "float" => to_float,
        "upper" => upper,
        "lower" => lower,
        "abs" => abs,
        "min" => min,
        "max" => max,
        "keys" => keys,
        "join" => join,
        _ => return None,
    })
}

fn arity(name: &str, args: &[Value], expected: std::ops::RangeInclusive<usize>) -> Result<(), String> {
    if expected.contains(&args.len()) {
        Ok(())
    } else {
        Err(format!(
            "{name}() takes {} to {} arguments, got {}",
            expected.start(),
            expected.end(),
            args.len()
        ))
    }
}

fn want_int(name: &str, v: &Value) -> Result<i64, String> {
    match v {
        Value::Int(i) => Ok(*i),
        other => Err(format!("{name}() expects an int, got {}", other.type_name())),
    }
}

fn range(args: &[Value]) -> Result<Value, String> {
    arity("range", args, 1..=3)?;
    let (start, stop, step) = match args {
        [stop] => (0, want_int("range", stop)?, 1),
        [start, stop] => (want_int("range", start)?, want_int("range", stop)?, 1),
        [start, stop, step] => (
            want_int("range", start)?,
            want_int("range", stop)?,
            want_int("range", step)?,
        ),
        _ => unreachable!(),
    };
    if step == 0 {
        return Err("range() step must not be zero".to_string());
    }
    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        items.push(Value::Int(i));
        i += step;
    }
    Ok(Value::List(items))
}

fn len(args: &[Value]) -> Result<Value, String> {
    arity("len", args, 1..=1)?;
    let n = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(l) => l.len(),
        Value::Map(m) => m.len(),
        other => return Err(format!("len() expects str, list or map, got {}", other.type_name())),
    };
    Ok(Value::Int(n as i64))
}

fn to_str(args: &[Value]) -> Result<Value, String> {
    arity("str", args, 1..=1)?;
    Ok(Value::Str(args[0].render_to_string()))
}

fn to_int(args: &[Value]) -> Result<Value, String> {
    arity("int", args, 1..=1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("int() cannot convert '{s}'")),
        other => Err(format!("int() cannot convert {}", other.type_name())),
    }
}

fn to_float(args: &[Value]) -> Result<Value, String> {
    arity("float", args, 1..=1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Bool(b) => Ok(Value::Float(f64::from(u8::from(*b)))),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("float() cannot convert '{s}'")),
        other => Err(format!("float() cannot convert {}", other.type_name())),
    }
}

fn upper(args: &[Value]) -> Result<Value, String> {
    arity("upper", args, 1..=1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Str(s.to_uppercase())),
        other => Err(format!("upper() expects a str, got {}", other.type_name())),
    }
}

fn lower(args: &[Value]) -> Result<Value, String> {
    arity("lower", args, 1..=1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::Str(s.to_lowercase())),
        other => Err(format!("lower() expects a str, got {}", other.type_name())),
    }
}

fn abs(args: &[Value]) -> Result<Value, String> {
    arity("abs", args, 1..=1)?;
    match &args[0] {
        Value::Int(i) => Ok(Value::Int(i.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(format!("abs() expects a number, got {}", other.type_name())),
    }
}

fn min(args: &[Value]) -> Result<Value, String> {
    extremum("min", args, |a, b| a < b)
}

fn max(args: &[Value]) -> Result<Value, String> {
    extremum("max", args, |a, b| a > b)
}

/// `min`/`max` over either a single list or two-plus scalar arguments.
fn extremum(name: &str, args: &[Value], wins: fn(f64, f64) -> bool) -> Result<Value, String> {
    let items: &[Value] = match args {
        [Value::List(l)] => l,
        [] | [_] => return Err(format!("{name}() expects a list or at least two arguments")),
        _ => args,
    };
    let mut best: Option<&Value> = None;
    for item in items {
        let key = match item {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            other => return Err(format!("{name}() expects numbers, got {}", other.type_name())),
        };
        let best_key = match best {
            Some(Value::Int(i)) => *i as f64,
            Some(Value::Float(f)) => *f,
            _ => {
                best = Some(item);
                continue;
            }
        };
        if wins(key, best_key) {
            best = Some(item);
        }
    }
    best.cloned()
        .ok_or_else(|| format!("{name}() of an empty sequence"))
}

fn keys(args: &[Value]) -> Result<Value, String> {
    arity("keys", args, 1..=1)?;
    match &args[0] {
        Value::Map(m) => Ok(Value::List(
            m.keys().map(|k| Value::Str(k.clone())).collect(),
        )),
        other => Err(format!("keys() expects a map, got {}", other.type_name())),
    }
}

fn join(args: &[Value]) -> Result<Value, String> {
    arity("join", args, 2..=2)?;
    let (Value::List(items), Value::Str(sep)) = (&args[0], &args[1]) else {
        return Err(format!(
            "join() expects a list and a separator str, got {} and {}",
            args[0].type_name(),
            args[1].type_name()
        ));
    };
    let rendered: Vec<String> = items.iter().map(Value::render_to_string).collect();
    Ok(Value::Str(rendered.join(sep)))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value, String> {
        lookup(name).expect(name)(args)
    }

    #[test]
    fn registry_is_closed() {
        assert!(lookup("range").is_some());
        assert!(lookup("eval").is_none());
        assert!(lookup("open").is_none());
    }

    #[rstest]
    #[case(&[Value::Int(3)], vec![0, 1, 2])]
    #[case(&[Value::Int(1), Value::Int(4)], vec![1, 2, 3])]
    #[case(&[Value::Int(5), Value::Int(1), Value::Int(-2)], vec![5, 3])]
    #[case(&[Value::Int(0)], vec![])]
    fn range_produces_int_lists(#[case] args: &[Value], #[case] expected: Vec<i64>) {
        let got = call("range", args).expect("range");
        let expected: Vec<Value> = expected.into_iter().map(Value::Int).collect();
        assert_eq!(got, Value::List(expected));
    }

    #[test]
    fn range_rejects_zero_step() {
        let err = call("range", &[Value::Int(0), Value::Int(3), Value::Int(0)]).unwrap_err();
        assert!(err.contains("step"), "{err}");
    }

    #[test]
    fn len_counts_chars_items_and_entries() {
        assert_eq!(call("len", &[Value::Str("héllo".into())]).unwrap(), Value::Int(5));
        assert_eq!(
            call("len", &[Value::List(vec![Value::Int(1), Value::Int(2)])]).unwrap(),
            Value::Int(2)
        );
        assert!(call("len", &[Value::Int(3)]).is_err());
    }

    #[test]
    fn conversions_follow_int_then_float_then_error() {
        assert_eq!(call("int", &[Value::Str(" 42 ".into())]).unwrap(), Value::Int(42));
        assert_eq!(call("int", &[Value::Float(2.9)]).unwrap(), Value::Int(2));
        assert!(call("int", &[Value::Str("4x".into())]).is_err());
        assert_eq!(call("float", &[Value::Int(2)]).unwrap(), Value::Float(2.0));
        assert_eq!(call("str", &[Value::Int(7)]).unwrap(), Value::Str("7".into()));
    }

    #[test]
    fn min_max_accept_a_list_or_varargs() {
        let list = Value::List(vec![Value::Int(3), Value::Float(1.5), Value::Int(2)]);
        assert_eq!(call("min", &[list.clone()]).unwrap(), Value::Float(1.5));
        assert_eq!(call("max", &[list]).unwrap(), Value::Int(3));
        assert_eq!(
            call("max", &[Value::Int(1), Value::Int(9), Value::Int(4)]).unwrap(),
            Value::Int(9)
        );
        assert!(call("min", &[Value::List(vec![])]).is_err());
    }

    #[test]
    fn keys_are_sorted_and_join_renders_items() {
        let map: std::collections::BTreeMap<String, Value> = [
            ("b".to_string(), Value::Int(1)),
            ("a".to_string(), Value::Int(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            call("keys", &[Value::Map(map)]).unwrap(),
            Value::List(vec![Value::Str("a".into()), Value::Str("b".into())])
        );
        assert_eq!(
            call(
                "join",
                &[
                    Value::List(vec![Value::Int(1), Value::Str("two".into())]),
                    Value::Str(", ".into())
                ]
            )
            .unwrap(),
            Value::Str("1, two".into())
        );
    }
}
