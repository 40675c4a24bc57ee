use std::io::{BufRead, IsTerminal};

use anyhow::{Context, Result};
use dialoguer::Input;

pub const RESET_PROMPT: &str =
    "WARNING: this drops the migration ledger and re-runs every migration. Are you sure? (y/N)";

/// Ask before a destructive reset. Only a literal `y` (any case) proceeds.
///
/// On a terminal the question goes through `dialoguer`; otherwise one line
/// is read from stdin so `echo y | stepladder reset` works in scripts.
pub fn confirm_reset() -> Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        return confirm_from(stdin.lock());
    }
    let answer = Input::<String>::new()
        .with_prompt(RESET_PROMPT)
        .allow_empty(true)
        .interact_text()
        .context("reset confirmation cancelled")?;
    Ok(is_confirmed(&answer))
}

/// Print the prompt and take the answer from one line of `input`.
pub fn confirm_from(input: impl BufRead) -> Result<bool> {
    println!("{RESET_PROMPT}");
    Ok(is_confirmed(&read_answer(input)?))
}

pub fn read_answer(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    Ok(line)
}

pub fn is_confirmed(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_y_confirms() {
        assert!(is_confirmed("y"));
        assert!(is_confirmed("Y\n"));
        assert!(is_confirmed("  y  "));

        assert!(!is_confirmed(""));
        assert!(!is_confirmed("yes"));
        assert!(!is_confirmed("n"));
        assert!(!is_confirmed("sure"));
    }

    #[test]
    fn reads_a_single_line() {
        let answer = read_answer("y\nignored\n".as_bytes()).unwrap();
        assert_eq!(answer, "y\n");
        assert!(is_confirmed(&answer));
    }

    #[test]
    fn closed_input_is_not_a_confirmation() {
        let answer = read_answer("".as_bytes()).unwrap();
        assert!(!is_confirmed(&answer));
    }

    #[test]
    fn piped_answer_decides_the_reset() {
        assert!(confirm_from("y\n".as_bytes()).unwrap());
        assert!(confirm_from("Y".as_bytes()).unwrap());
        assert!(!confirm_from("n\n".as_bytes()).unwrap());
        assert!(!confirm_from("".as_bytes()).unwrap());
    }
}
