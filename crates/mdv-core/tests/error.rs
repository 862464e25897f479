//! Tests for error handling

use mdv_core::error::{MdvError, Result};
use mdv_core::Address;

#[test]
fn test_evaluation_error_keeps_host_message()
{
    let error = MdvError::Evaluation {
        expression: "img".to_string(),
        message: "No symbol \"img\" in current context.".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("`img`"));
    assert!(message.contains("No symbol"));
}

#[test]
fn test_memory_read_error_shows_address()
{
    let error = MdvError::MemoryRead {
        address: Address::new(0x7fff_0000),
        len: 64,
        reason: "Cannot access memory".to_string(),
    };
    let message = format!("{}", error);
    assert!(message.contains("0x000000007fff0000"));
    assert!(message.contains("64 bytes"));
}

#[test]
fn test_timeout_error()
{
    let error = MdvError::Timeout {
        command: "-data-evaluate-expression img".to_string(),
        seconds: 30,
    };
    let message = format!("{}", error);
    assert!(message.contains("30s"));
    assert!(message.contains("-data-evaluate-expression"));
}

#[test]
fn test_type_code_parse_error_quotes_reply()
{
    let message = format!("{}", MdvError::TypeCodeParse("$1 = {...}".to_string()));
    assert!(message.contains("\"$1 = {...}\""));
}

#[test]
fn test_io_error_conversion()
{
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "matrix-viewer");
    let error: MdvError = io.into();
    assert!(matches!(error, MdvError::Io(_)));
    assert!(format!("{}", error).contains("matrix-viewer"));
}

#[test]
fn test_result_type_alias()
{
    fn missing() -> Result<()>
    {
        Err(MdvError::MissingExpression)
    }
    assert!(missing().is_err());
    assert!(format!("{}", missing().unwrap_err()).contains("mdv <expression>"));
}
