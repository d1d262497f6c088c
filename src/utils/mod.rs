pub mod diagnostics;
pub mod styles;

pub use diagnostics::*;
pub use styles::*;

pub fn require<E>(predicate: bool, err: E) -> Result<(), E> {
    if predicate { Ok(()) } else { Err(err) }
}

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// Like writeln! but ignores errors (we only write to stdout or to buffers in tests).
macro_rules! uwriteln {
    ($out:expr) => {
        let _ = writeln!($out);
    };
    ($out:expr, $($arg:tt)*) => {
        let _ = writeln!($out, $($arg)*);
    };
}
pub(crate) use uwriteln;

/// Parses decimal or 0x prefixed hex numbers.
pub fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|_| format!("`{s}` isn't a hex or decimal number"))
}

/// Remove escape sequences from the string (e.g. for colors).
#[cfg(test)]
pub fn strip_escapes(s: &str) -> String {
    // Even with Style::empty() the tabled crate adds escape sequences to the ends of
    // lines so it's simpler to strip them than to turn styling off.
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}
