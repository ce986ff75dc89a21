//! Built-in Functions
//!
//! The language's standard library: a fixed table of named functions, each
//! with a declared arity, called from the `factor` level of the expression
//! evaluator via `Builtins::call`. Arity is checked in one place here rather
//! than inside each function, matching the original's `CallBuiltin` (it
//! looks up `Functions[name]`, checks `len(args) == builtin.Arity`, then
//! calls `builtin.Call(args...)`).
//!
//! All arguments are `f64` — there is no other value type in the language
//! (strings only ever appear as print literals, never as expression
//! operands). Functions return `Result<f64>` rather than a bare `f64`
//! because `mod` can fail (a zero right operand is a runtime error per the
//! error taxonomy, not a silently propagated `NaN`).

use crate::error::{BasicError, Result};

type Func = fn(&[f64]) -> Result<f64>;

struct Builtin {
    arity: usize,
    call: Func,
}

/// The built-in function table, keyed by lower-cased name.
pub struct Builtins {
    table: Vec<(&'static str, Builtin)>,
}

impl Builtins {
    pub fn new() -> Self {
        Self {
            table: vec![
                ("timer", Builtin { arity: 0, call: timer }),
                ("rnd", Builtin { arity: 0, call: rnd }),
                ("pi", Builtin { arity: 0, call: pi }),
                ("int", Builtin { arity: 1, call: int }),
                ("abs", Builtin { arity: 1, call: abs }),
                ("sqr", Builtin { arity: 1, call: sqr }),
                ("sin", Builtin { arity: 1, call: sin }),
                ("cos", Builtin { arity: 1, call: cos }),
                ("rad", Builtin { arity: 1, call: rad }),
                ("deg", Builtin { arity: 1, call: deg }),
                ("min", Builtin { arity: 2, call: min }),
                ("max", Builtin { arity: 2, call: max }),
                ("mod", Builtin { arity: 2, call: modulo }),
                ("hypot2", Builtin { arity: 2, call: hypot2 }),
                ("hypot3", Builtin { arity: 3, call: hypot3 }),
                ("iif", Builtin { arity: 3, call: iif }),
            ],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.iter().any(|(n, _)| *n == name)
    }

    /// Looks up `name`, checks `args.len()` against its declared arity, and
    /// calls it. `rnd` and `timer` ignore the (empty) arg slice but still
    /// go through this path so arity is enforced uniformly.
    pub fn call(&self, name: &str, args: &[f64]) -> Result<f64> {
        let (_, builtin) = self
            .table
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| BasicError::RuntimeError(format!("Undefined function: {}", name)))?;
        if args.len() != builtin.arity {
            return Err(BasicError::RuntimeError(format!(
                "{} expects {} argument(s), got {}",
                name,
                builtin.arity,
                args.len()
            )));
        }
        (builtin.call)(args)
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

fn timer(_args: &[f64]) -> Result<f64> {
    use std::time::{SystemTime, UNIX_EPOCH};
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0))
}

fn rnd(_args: &[f64]) -> Result<f64> {
    Ok(rand::random::<f64>())
}

fn pi(_args: &[f64]) -> Result<f64> {
    Ok(std::f64::consts::PI)
}

fn int(args: &[f64]) -> Result<f64> {
    Ok(args[0].trunc())
}

fn abs(args: &[f64]) -> Result<f64> {
    Ok(args[0].abs())
}

fn sqr(args: &[f64]) -> Result<f64> {
    Ok(args[0].sqrt())
}

fn sin(args: &[f64]) -> Result<f64> {
    Ok(args[0].sin())
}

fn cos(args: &[f64]) -> Result<f64> {
    Ok(args[0].cos())
}

fn rad(args: &[f64]) -> Result<f64> {
    Ok(args[0].to_radians())
}

fn deg(args: &[f64]) -> Result<f64> {
    Ok(args[0].to_degrees())
}

fn min(args: &[f64]) -> Result<f64> {
    Ok(args[0].min(args[1]))
}

fn max(args: &[f64]) -> Result<f64> {
    Ok(args[0].max(args[1]))
}

/// Truncated-integer remainder, matching the original's `int(a) % int(b)`.
/// A zero right operand is a runtime error (spec section 7), not `NaN`.
fn modulo(args: &[f64]) -> Result<f64> {
    let a = args[0].trunc() as i64;
    let b = args[1].trunc() as i64;
    if b == 0 {
        return Err(BasicError::RuntimeError("mod by zero".to_string()));
    }
    Ok((a % b) as f64)
}

fn hypot2(args: &[f64]) -> Result<f64> {
    Ok(args[0].hypot(args[1]))
}

fn hypot3(args: &[f64]) -> Result<f64> {
    Ok((args[0] * args[0] + args[1] * args[1] + args[2] * args[2]).sqrt())
}

/// Both branches are evaluated eagerly by the caller before `iif` is
/// invoked — this is not short-circuiting, matching the original, where
/// `ParseArgs` evaluates every argument expression before `CallBuiltin`
/// runs.
fn iif(args: &[f64]) -> Result<f64> {
    if args[0] != 0.0 {
        Ok(args[1])
    } else {
        Ok(args[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_mismatch_errors() {
        let b = Builtins::new();
        assert!(b.call("abs", &[]).is_err());
        assert!(b.call("abs", &[1.0, 2.0]).is_err());
    }

    #[test]
    fn unknown_function_errors() {
        let b = Builtins::new();
        assert!(b.call("nope", &[]).is_err());
    }

    #[test]
    fn mod_truncates_before_remainder() {
        let b = Builtins::new();
        assert_eq!(b.call("mod", &[7.9, 2.0]).unwrap(), 1.0);
        assert_eq!(b.call("mod", &[-7.0, 2.0]).unwrap(), -1.0);
    }

    #[test]
    fn mod_by_zero_errors_instead_of_nan() {
        let b = Builtins::new();
        assert!(b.call("mod", &[5.0, 0.0]).is_err());
    }

    #[test]
    fn iif_selects_branch_without_short_circuit_semantics() {
        let b = Builtins::new();
        assert_eq!(b.call("iif", &[-1.0, 10.0, 20.0]).unwrap(), 10.0);
        assert_eq!(b.call("iif", &[0.0, 10.0, 20.0]).unwrap(), 20.0);
    }

    #[test]
    fn hypot3_matches_pythagorean_extension() {
        let b = Builtins::new();
        assert_eq!(b.call("hypot3", &[2.0, 3.0, 6.0]).unwrap(), 7.0);
    }

    #[test]
    fn rad_deg_round_trip() {
        let b = Builtins::new();
        let d = b.call("deg", &[std::f64::consts::PI]).unwrap();
        assert!((d - 180.0).abs() < 1e-9);
        let r = b.call("rad", &[180.0]).unwrap();
        assert!((r - std::f64::consts::PI).abs() < 1e-9);
    }
}
