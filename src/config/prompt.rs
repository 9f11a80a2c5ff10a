//! Interactive configuration prompts.
//!
//! Asks for m, TV, T, the source mode and (table mode) the file path,
//! re-prompting until each answer parses. Generic over the reader and
//! writer so the dialogue can be driven from tests.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use super::{InspectionConfig, SourceMode};

/// Run the prompt dialogue, starting from `base` for everything not asked.
///
/// Returns `UnexpectedEof` if input ends before every answer is collected.
/// The cycle time is clamped afterwards, exactly as a file load would.
pub fn prompt_config<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    base: InspectionConfig,
) -> io::Result<InspectionConfig> {
    let mut config = base;

    config.source.columns = ask_parsed(
        input,
        output,
        "Enter number of columns (m, for table mode, 0 for every cell): ",
        "Please enter a non-negative whole number.",
    )?;

    config.pipeline.threshold_value = loop {
        let tv: f64 = ask_parsed(
            input,
            output,
            "Enter threshold value (TV): ",
            "Please enter a valid number.",
        )?;
        if tv.is_finite() {
            break tv;
        }
        writeln!(output, "Threshold must be a finite number.")?;
    };

    config.pipeline.cycle_time_ns = ask_parsed(
        input,
        output,
        "Enter process time T (in nanoseconds, >= 500): ",
        "Please enter a non-negative whole number.",
    )?;
    if config.clamp_cycle_time() {
        writeln!(output, "T is less than 500 ns, using 500 ns.")?;
    }

    config.source.mode = loop {
        match ask_line(input, output, "Select mode (random/table): ")?.as_str() {
            "random" => break SourceMode::Random,
            "table" | "csv" => break SourceMode::Table,
            _ => writeln!(output, "Invalid mode. Please enter 'random' or 'table'.")?,
        }
    };

    if config.source.mode == SourceMode::Table {
        let path = loop {
            let line = ask_line(input, output, "Enter table file path: ")?;
            if !line.is_empty() {
                break line;
            }
            writeln!(output, "Table file path cannot be empty.")?;
        };
        config.source.path = Some(PathBuf::from(path));
    }

    Ok(config)
}

/// Print `prompt`, read one trimmed line.
fn ask_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input closed before configuration was complete",
        ));
    }
    Ok(line.trim().to_string())
}

/// Ask until the answer parses as `T`.
fn ask_parsed<T: FromStr, R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    complaint: &str,
) -> io::Result<T> {
    loop {
        match ask_line(input, output, prompt)?.parse::<T>() {
            Ok(v) => return Ok(v),
            Err(_) => writeln!(output, "Invalid input. {complaint}")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::MIN_CYCLE_TIME_NS;

    fn run(script: &str) -> (io::Result<InspectionConfig>, String) {
        let mut input = io::Cursor::new(script.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = prompt_config(&mut input, &mut output, InspectionConfig::default());
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_random_mode_dialogue() {
        let (result, _) = run("0\n50.5\n2000\nrandom\n");
        let config = result.unwrap();
        assert_eq!(config.source.columns, 0);
        assert_eq!(config.pipeline.threshold_value, 50.5);
        assert_eq!(config.pipeline.cycle_time_ns, 2000);
        assert_eq!(config.source.mode, SourceMode::Random);
        assert!(config.source.path.is_none());
    }

    #[test]
    fn test_table_mode_dialogue_reprompts_on_bad_input() {
        let (result, transcript) = run("-3\nseven\n7\nabc\n1275\n100\nfile\ntable\n\nrows.csv\n");
        let config = result.unwrap();
        assert_eq!(config.source.columns, 7);
        assert_eq!(config.pipeline.threshold_value, 1275.0);
        assert_eq!(config.pipeline.cycle_time_ns, MIN_CYCLE_TIME_NS);
        assert_eq!(config.source.mode, SourceMode::Table);
        assert_eq!(config.source.path, Some(PathBuf::from("rows.csv")));
        assert!(transcript.contains("Invalid input"));
        assert!(transcript.contains("Invalid mode"));
        assert!(transcript.contains("using 500 ns"));
        assert!(transcript.contains("cannot be empty"));
    }

    #[test]
    fn test_non_finite_threshold_reprompts() {
        let (result, transcript) = run("0\ninf\n3.5\n1000\nrandom\n");
        assert_eq!(result.unwrap().pipeline.threshold_value, 3.5);
        assert!(transcript.contains("finite"));
    }

    #[test]
    fn test_eof_is_an_error() {
        let (result, _) = run("4\n");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }
}
