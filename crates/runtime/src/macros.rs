//! Argument-checking macros shared by the builtins
//!
//! A failed check releases the argument list and returns a fresh error
//! value from the enclosing builtin, so every guard is a single line at
//! the top of the function.

/// Bail out of a builtin with an error value unless `cond` holds.
macro_rules! ensure {
    ($interp:expr, $args:expr, $cond:expr, $($fmt:tt)+) => {
        if !($cond) {
            let msg = format!($($fmt)+);
            $interp.heap.release($args);
            return $interp.heap.err(msg);
        }
    };
}

/// The argument list must hold exactly `want` values.
macro_rules! ensure_arity {
    ($interp:expr, $name:expr, $args:expr, $want:expr) => {{
        let got = $interp.heap.list_len($args);
        ensure!(
            $interp,
            $args,
            got == $want,
            "Function '{}' passed incorrect number of arguments. Got {}, expected {}.",
            $name,
            got,
            $want
        );
    }};
}

/// The argument at `idx` must have kind `want`.
macro_rules! ensure_type {
    ($interp:expr, $name:expr, $args:expr, $idx:expr, $want:expr) => {{
        let got = $interp.heap.kind($interp.heap.list_child($args, $idx));
        ensure!(
            $interp,
            $args,
            got == $want,
            "Function '{}' passed incorrect type for argument {}. Got {}, expected {}.",
            $name,
            $idx,
            got.name(),
            $want.name()
        );
    }};
}

/// The list argument at `idx` must be non-empty.
macro_rules! ensure_not_empty {
    ($interp:expr, $name:expr, $args:expr, $idx:expr) => {{
        let child = $interp.heap.list_child($args, $idx);
        ensure!(
            $interp,
            $args,
            $interp.heap.list_len(child) != 0,
            "Function '{}' passed {{}} for argument {}.",
            $name,
            $idx
        );
    }};
}
