//! # Element type code queries
//!
//! Three ways to learn a matrix's element type from the inferior:
//!
//! - **method**: evaluate `(<expr>).type()`; the host answers with a bare
//!   integer. Needs a live process since it calls a function in the inferior.
//! - **console**: run `print <expr>.type()` on the console and take the
//!   integer after `=` in the `$N = K` reply. Kept for hosts whose structured
//!   evaluation is unavailable.
//! - **flags**: read `(<expr>).flags` and mask the low twelve bits. Works on
//!   core files.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{MdvError, Result};
use crate::host::DebuggerHost;
use crate::types::TYPE_MASK;

/// How to obtain the element type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeCodeStrategy
{
    /// `method`, falling back to `flags` when the call fails
    #[default]
    Auto,
    Method,
    Console,
    Flags,
}

impl FromStr for TypeCodeStrategy
{
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "method" | "call" => Ok(Self::Method),
            "console" | "print" => Ok(Self::Console),
            "flags" | "header" => Ok(Self::Flags),
            _ => Err(format!("Unknown type-code strategy: {s}. Use 'auto', 'method', 'console' or 'flags'")),
        }
    }
}

impl fmt::Display for TypeCodeStrategy
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self {
            Self::Auto => "auto",
            Self::Method => "method",
            Self::Console => "console",
            Self::Flags => "flags",
        };
        f.write_str(name)
    }
}

/// Extract the type code from a `print` reply of the form `$N = K`
///
/// ```rust
/// use mdv_core::typecode::parse_type_code_reply;
///
/// assert_eq!(parse_type_code_reply("$2 = 42").unwrap(), 42);
/// assert_eq!(parse_type_code_reply("$17 = 16\n").unwrap(), 16);
/// ```
///
/// ## Errors
///
/// `TypeCodeParse` when the reply has no `=` or the last token after it is
/// not an integer.
pub fn parse_type_code_reply(reply: &str) -> Result<i64>
{
    let parse_error = || MdvError::TypeCodeParse(reply.to_string());
    let (_, value) = reply.split_once('=').ok_or_else(parse_error)?;
    let token = value.split_whitespace().last().ok_or_else(parse_error)?;
    token.parse().map_err(|_| parse_error())
}

/// Parse the leading integer of a structured evaluation result
///
/// gdb may decorate integral values (`16 '\020'` for char-typed results), so
/// only the first token is considered.
///
/// ## Errors
///
/// `TypeCodeParse` when the value does not start with a decimal integer.
pub fn parse_integer_value(value: &str) -> Result<i64>
{
    value
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| MdvError::TypeCodeParse(value.to_string()))
}

/// Query the type code of `expression` with `strategy`
///
/// ## Errors
///
/// Whatever the chosen query returns; with `Auto`, the error of the `flags`
/// fallback when both queries fail.
pub fn query_type_code(host: &mut dyn DebuggerHost, expression: &str, strategy: TypeCodeStrategy) -> Result<i64>
{
    let code = match strategy {
        TypeCodeStrategy::Method => by_method(host, expression),
        TypeCodeStrategy::Console => by_console(host, expression),
        TypeCodeStrategy::Flags => by_flags(host, expression),
        TypeCodeStrategy::Auto => by_method(host, expression).or_else(|e| {
            warn!(error = %e, "type() call failed, reading the flags field instead");
            by_flags(host, expression)
        }),
    }?;
    debug!(expression, code, %strategy, "Resolved type code");
    Ok(code)
}

fn by_method(host: &mut dyn DebuggerHost, expression: &str) -> Result<i64>
{
    parse_integer_value(&host.evaluate(&format!("({expression}).type()"))?)
}

fn by_console(host: &mut dyn DebuggerHost, expression: &str) -> Result<i64>
{
    parse_type_code_reply(&host.console(&format!("print {expression}.type()"))?)
}

fn by_flags(host: &mut dyn DebuggerHost, expression: &str) -> Result<i64>
{
    Ok(parse_integer_value(&host.evaluate(&format!("({expression}).flags"))?)? & TYPE_MASK)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_parse_reply_takes_trailing_integer()
    {
        for (n, k) in [(1, 0), (2, 42), (123, 4095), (9, -3)] {
            assert_eq!(parse_type_code_reply(&format!("${n} = {k}")).unwrap(), k);
        }
    }

    #[test]
    fn test_parse_reply_tolerates_whitespace()
    {
        assert_eq!(parse_type_code_reply("  $3 =   24 \n").unwrap(), 24);
    }

    #[test]
    fn test_parse_reply_rejects_other_shapes()
    {
        assert!(parse_type_code_reply("42").is_err());
        assert!(parse_type_code_reply("$1 = ").is_err());
        assert!(parse_type_code_reply("$1 = {rows = 2}").is_err());
        assert!(parse_type_code_reply("Cannot evaluate function -- may be inlined").is_err());
    }

    #[test]
    fn test_parse_integer_value()
    {
        assert_eq!(parse_integer_value("16").unwrap(), 16);
        assert_eq!(parse_integer_value("16 '\\020'").unwrap(), 16);
        assert_eq!(parse_integer_value("-1").unwrap(), -1);
        assert!(parse_integer_value("0x10").is_err());
        assert!(parse_integer_value("").is_err());
    }

    #[test]
    fn test_strategy_from_str()
    {
        assert_eq!("auto".parse::<TypeCodeStrategy>().unwrap(), TypeCodeStrategy::Auto);
        assert_eq!("Flags".parse::<TypeCodeStrategy>().unwrap(), TypeCodeStrategy::Flags);
        assert_eq!("print".parse::<TypeCodeStrategy>().unwrap(), TypeCodeStrategy::Console);
        assert!("guess".parse::<TypeCodeStrategy>().is_err());
    }
}
