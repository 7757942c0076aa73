//! Built-in functions and session variables
//!
//! Both tables are immutable and shared by every analysis run. The function
//! table is built on first use.

use crate::error::{ErrorKind, Rejection};
use kw_core::{DataType, TypeName};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Validates argument types and returns the function's result type
pub type ArgCheck = fn(&[DataType]) -> Result<DataType, Rejection>;

#[derive(Debug, Clone, Copy)]
pub struct FunctionDefinition {
    pub name: &'static str,
    pub validate_args: ArgCheck,
    pub is_aggregate: bool,
    /// Result type of `name(*)`; `None` if the star form is not accepted
    pub star_return: Option<DataType>,
}

/// Result type of `sum` over integers
const SUM_INT: DataType = DataType::decimal_unchecked(1000, 0);

/// Unix timestamps in seconds with microsecond precision
const UNIX_TIMESTAMP: DataType = DataType::decimal_unchecked(16, 6);

/// Contextual `@` variables available to every action and procedure
pub const SESSION_VARIABLES: &[(&str, DataType)] = &[
    ("@caller", DataType::TEXT),
    ("@txid", DataType::TEXT),
    ("@signer", DataType::BLOB),
    ("@height", DataType::INT),
    ("@foreign_caller", DataType::TEXT),
    ("@block_timestamp", DataType::INT),
    ("@authenticator", DataType::TEXT),
];

static BUILTIN_FUNCTIONS: OnceLock<HashMap<&'static str, FunctionDefinition>> = OnceLock::new();

/// Look up a built-in function by (lowercase) name
pub fn builtin_function(name: &str) -> Option<&'static FunctionDefinition> {
    BUILTIN_FUNCTIONS
        .get_or_init(build_functions)
        .get(name.to_ascii_lowercase().as_str())
}

fn scalar(name: &'static str, validate_args: ArgCheck) -> FunctionDefinition {
    FunctionDefinition {
        name,
        validate_args,
        is_aggregate: false,
        star_return: None,
    }
}

fn aggregate(
    name: &'static str,
    validate_args: ArgCheck,
    star_return: Option<DataType>,
) -> FunctionDefinition {
    FunctionDefinition {
        name,
        validate_args,
        is_aggregate: true,
        star_return,
    }
}

fn build_functions() -> HashMap<&'static str, FunctionDefinition> {
    let defs = vec![
        scalar("abs", |args| {
            arg_count(args, 1)?;
            match args[0].name {
                TypeName::Int | TypeName::Decimal | TypeName::Null | TypeName::Unknown
                    if !args[0].is_array =>
                {
                    Ok(args[0])
                }
                _ => Err(arg_type("int or decimal", &args[0])),
            }
        }),
        scalar("error", |args| {
            arg_count(args, 1)?;
            expect(&args[0], &DataType::TEXT)?;
            Ok(DataType::NULL)
        }),
        scalar("notice", |args| {
            arg_count(args, 1)?;
            expect(&args[0], &DataType::TEXT)?;
            Ok(DataType::NULL)
        }),
        scalar("parse_unix_timestamp", |args| {
            arg_count(args, 2)?;
            expect(&args[0], &DataType::TEXT)?;
            expect(&args[1], &DataType::TEXT)?;
            Ok(UNIX_TIMESTAMP)
        }),
        scalar("format_unix_timestamp", |args| {
            arg_count(args, 2)?;
            if !args[0].is_null() && !args[0].equals_strict(&UNIX_TIMESTAMP) {
                return Err(arg_type(&UNIX_TIMESTAMP.to_string(), &args[0]));
            }
            expect(&args[1], &DataType::TEXT)?;
            Ok(DataType::TEXT)
        }),
        scalar("uuid_generate_v5", |args| {
            arg_count(args, 2)?;
            expect(&args[0], &DataType::UUID)?;
            expect(&args[1], &DataType::TEXT)?;
            Ok(DataType::UUID)
        }),
        scalar("encode", |args| {
            arg_count(args, 2)?;
            expect(&args[0], &DataType::BLOB)?;
            expect(&args[1], &DataType::TEXT)?;
            Ok(DataType::TEXT)
        }),
        scalar("decode", |args| {
            arg_count(args, 2)?;
            expect(&args[0], &DataType::TEXT)?;
            expect(&args[1], &DataType::TEXT)?;
            Ok(DataType::BLOB)
        }),
        scalar("digest", |args| {
            arg_count(args, 2)?;
            if !args[0].equals(&DataType::TEXT) && !args[0].equals(&DataType::BLOB) {
                return Err(arg_type("text or blob", &args[0]));
            }
            expect(&args[1], &DataType::TEXT)?;
            Ok(DataType::BLOB)
        }),
        scalar("generate_dbid", |args| {
            arg_count(args, 2)?;
            expect(&args[0], &DataType::TEXT)?;
            expect(&args[1], &DataType::BLOB)?;
            Ok(DataType::TEXT)
        }),
        scalar("array_append", |args| {
            arg_count(args, 2)?;
            expect_array(&args[0])?;
            expect_element_of(&args[1], &args[0])?;
            Ok(args[0])
        }),
        scalar("array_prepend", |args| {
            arg_count(args, 2)?;
            expect_array(&args[1])?;
            expect_element_of(&args[0], &args[1])?;
            Ok(args[1])
        }),
        scalar("array_cat", |args| {
            arg_count(args, 2)?;
            expect_array(&args[0])?;
            expect_array(&args[1])?;
            expect(&args[1], &args[0])?;
            Ok(args[0])
        }),
        scalar("array_length", |args| {
            arg_count(args, 1)?;
            expect_array(&args[0])?;
            Ok(DataType::INT)
        }),
        scalar("bit_length", text_to_int),
        scalar("char_length", text_to_int),
        scalar("character_length", text_to_int),
        scalar("length", text_to_int),
        scalar("octet_length", text_to_int),
        scalar("lower", text_to_text),
        scalar("upper", text_to_text),
        scalar("lpad", pad),
        scalar("rpad", pad),
        scalar("ltrim", trim),
        scalar("rtrim", trim),
        scalar("trim", trim),
        scalar("overlay", |args| {
            arg_range(args, 3, 4)?;
            expect(&args[0], &DataType::TEXT)?;
            expect(&args[1], &DataType::TEXT)?;
            expect(&args[2], &DataType::INT)?;
            if let Some(len) = args.get(3) {
                expect(len, &DataType::INT)?;
            }
            Ok(DataType::TEXT)
        }),
        scalar("position", |args| {
            arg_count(args, 2)?;
            expect(&args[0], &DataType::TEXT)?;
            expect(&args[1], &DataType::TEXT)?;
            Ok(DataType::INT)
        }),
        scalar("substring", |args| {
            arg_range(args, 2, 3)?;
            expect(&args[0], &DataType::TEXT)?;
            expect(&args[1], &DataType::INT)?;
            if let Some(len) = args.get(2) {
                expect(len, &DataType::INT)?;
            }
            Ok(DataType::TEXT)
        }),
        scalar("format", |args| {
            let Some(first) = args.first() else {
                return Err(Rejection::new(
                    ErrorKind::FunctionSignature,
                    "expected at least 1 argument, received 0",
                ));
            };
            expect(first, &DataType::TEXT)?;
            Ok(DataType::TEXT)
        }),
        aggregate(
            "count",
            |args| {
                arg_range(args, 0, 1)?;
                Ok(DataType::INT)
            },
            Some(DataType::INT),
        ),
        aggregate(
            "sum",
            |args| {
                arg_count(args, 1)?;
                let arg = args[0];
                if !arg.is_numeric() {
                    return Err(arg_type("numeric", &arg));
                }
                Ok(match (arg.name, arg.precision_scale()) {
                    (TypeName::Unknown, _) => DataType::UNKNOWN,
                    (TypeName::Decimal, Some((_, scale))) => {
                        DataType::decimal_unchecked(1000, scale)
                    }
                    _ => SUM_INT,
                })
            },
            None,
        ),
        aggregate("min", min_max, None),
        aggregate("max", min_max, None),
    ];

    defs.into_iter().map(|d| (d.name, d)).collect()
}

fn text_to_int(args: &[DataType]) -> Result<DataType, Rejection> {
    arg_count(args, 1)?;
    expect(&args[0], &DataType::TEXT)?;
    Ok(DataType::INT)
}

fn text_to_text(args: &[DataType]) -> Result<DataType, Rejection> {
    arg_count(args, 1)?;
    expect(&args[0], &DataType::TEXT)?;
    Ok(DataType::TEXT)
}

fn pad(args: &[DataType]) -> Result<DataType, Rejection> {
    arg_range(args, 2, 3)?;
    expect(&args[0], &DataType::TEXT)?;
    expect(&args[1], &DataType::INT)?;
    if let Some(fill) = args.get(2) {
        expect(fill, &DataType::TEXT)?;
    }
    Ok(DataType::TEXT)
}

fn trim(args: &[DataType]) -> Result<DataType, Rejection> {
    arg_range(args, 1, 2)?;
    for arg in args {
        expect(arg, &DataType::TEXT)?;
    }
    Ok(DataType::TEXT)
}

fn min_max(args: &[DataType]) -> Result<DataType, Rejection> {
    arg_count(args, 1)?;
    if !args[0].is_numeric() && !args[0].equals(&DataType::TEXT) {
        return Err(arg_type("numeric or text", &args[0]));
    }
    Ok(args[0])
}

fn arg_count(args: &[DataType], want: usize) -> Result<(), Rejection> {
    if args.len() != want {
        return Err(Rejection::new(
            ErrorKind::FunctionSignature,
            format!("expected {want} arguments, received {}", args.len()),
        ));
    }
    Ok(())
}

fn arg_range(args: &[DataType], min: usize, max: usize) -> Result<(), Rejection> {
    if args.len() < min || args.len() > max {
        return Err(Rejection::new(
            ErrorKind::FunctionSignature,
            format!(
                "expected between {min} and {max} arguments, received {}",
                args.len()
            ),
        ));
    }
    Ok(())
}

fn arg_type(want: &str, got: &DataType) -> Rejection {
    Rejection::new(
        ErrorKind::Type,
        format!("expected argument of type {want}, received {got}"),
    )
}

fn expect(got: &DataType, want: &DataType) -> Result<(), Rejection> {
    if !got.equals(want) {
        return Err(arg_type(&want.to_string(), got));
    }
    Ok(())
}

fn expect_array(got: &DataType) -> Result<(), Rejection> {
    if !got.is_array && !got.is_null() && !got.is_unknown() {
        return Err(arg_type("array", got));
    }
    Ok(())
}

fn expect_element_of(elem: &DataType, array: &DataType) -> Result<(), Rejection> {
    if elem.is_array {
        return Err(arg_type("scalar", elem));
    }
    expect(elem, &array.element())
}

#[cfg(test)]
#[path = "builtins_test.rs"]
mod tests;
