//! Interactive input for values not given on the command line.

use std::io::{BufRead, Write};

use fitroom_core::{Category, RoomConfig};

use crate::error::SimError;

/// Values given on the command line; missing ones are prompted for.
#[derive(Debug, Clone, Copy, Default)]
pub struct GivenValues {
    /// Number of slots.
    pub slots: Option<i64>,
    /// Number of blue workers.
    pub blue: Option<i64>,
    /// Number of green workers.
    pub green: Option<i64>,
}

/// Ask for an integer on `output`, read one line from `input`.
///
/// # Errors
///
/// `SimError::MissingInput` at end of input, `SimError::InvalidInput` if the
/// line is not an integer, `SimError::Io` on terminal failure.
pub fn prompt_i64<R, W>(
    input: &mut R,
    output: &mut W,
    question: &str,
    field: &'static str,
) -> Result<i64, SimError>
where
    R: BufRead,
    W: Write,
{
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(SimError::MissingInput { field });
    }

    let trimmed = line.trim();
    trimmed.parse().map_err(|_| SimError::InvalidInput { field, input: trimmed.to_string() })
}

/// Use `given` if present, otherwise prompt for it.
///
/// # Errors
///
/// See [`prompt_i64`].
pub fn value_or_prompt<R, W>(
    given: Option<i64>,
    input: &mut R,
    output: &mut W,
    question: &str,
    field: &'static str,
) -> Result<i64, SimError>
where
    R: BufRead,
    W: Write,
{
    match given {
        Some(value) => Ok(value),
        None => prompt_i64(input, output, question, field),
    }
}

/// Collect a room configuration, checking each value as soon as it is known
/// so a bad slot count is reported before any worker count is asked for.
///
/// # Errors
///
/// `SimError::InvalidConfiguration` for the first value that fails, or any
/// error from [`prompt_i64`].
pub fn collect_config<R, W>(
    given: GivenValues,
    input: &mut R,
    output: &mut W,
) -> Result<RoomConfig, SimError>
where
    R: BufRead,
    W: Write,
{
    let slots = value_or_prompt(
        given.slots,
        input,
        output,
        "Enter the number of slots inside the fitting room: ",
        "slots",
    )?;
    RoomConfig::check_capacity(slots)?;

    let blue = value_or_prompt(
        given.blue,
        input,
        output,
        "Enter the number of blue threads: ",
        "blue workers",
    )?;
    RoomConfig::check_workers(Category::Blue, blue)?;

    let green = value_or_prompt(
        given.green,
        input,
        output,
        "Enter the number of green threads: ",
        "green workers",
    )?;
    RoomConfig::check_workers(Category::Green, green)?;

    Ok(RoomConfig::new(slots, blue, green)?)
}
