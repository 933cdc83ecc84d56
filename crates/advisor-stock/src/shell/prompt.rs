//! Line-oriented prompting and input validation

use crate::alert::AlertDirection;
use crate::model::Period;
use std::io::{self, BufRead, Write};

/// Reads answers from `input`, writing prompts to `output`
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Write one line and flush
    pub fn say(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.output, "{}", text.as_ref())?;
        self.output.flush()
    }

    /// Show `prompt` and read one trimmed line; `None` at end of input
    pub fn line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut buf = String::new();
        if self.input.read_line(&mut buf)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(buf.trim().to_string()))
    }

    /// Re-prompt until `parse` accepts the answer; `None` at end of input
    pub fn ask<T>(
        &mut self,
        prompt: &str,
        retry: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.line(prompt)? else {
                return Ok(None);
            };
            if let Some(value) = parse(&answer) {
                return Ok(Some(value));
            }
            self.say(retry)?;
        }
    }
}

/// 1 to 5 ASCII letters, upper-cased
pub fn parse_ticker(input: &str) -> Option<String> {
    let ticker = input.trim();
    let valid = (1..=5).contains(&ticker.len()) && ticker.chars().all(|c| c.is_ascii_alphabetic());
    valid.then(|| ticker.to_ascii_uppercase())
}

/// `y` or `n`, any case
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" => Some(true),
        "n" => Some(false),
        _ => None,
    }
}

/// Any finite number
pub fn parse_number(input: &str) -> Option<f64> {
    input.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A finite number that is not negative
pub fn parse_amount(input: &str) -> Option<f64> {
    parse_number(input).filter(|v| *v >= 0.0)
}

/// A finite number above zero
pub fn parse_positive(input: &str) -> Option<f64> {
    parse_number(input).filter(|v| *v > 0.0)
}

/// Risk percentage in `(0, 100]`
pub fn parse_risk_pct(input: &str) -> Option<f64> {
    parse_number(input).filter(|v| *v > 0.0 && *v <= 100.0)
}

pub fn parse_period(input: &str) -> Option<Period> {
    input.parse().ok()
}

pub fn parse_direction(input: &str) -> Option<AlertDirection> {
    input.parse().ok()
}
