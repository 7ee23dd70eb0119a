//! Terminal implementation of the recovery decision port.
//!
//! Questions go to the writer (stderr in the binary) and answers are read a
//! line at a time. End of input never changes anything: it answers no to a
//! yes/no question, cancels a choice, and gives an empty string for text.

use std::io::{BufRead, Write};

use tether::ops::DecisionPort;

pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        TerminalPrompt { input, output }
    }

    /// Print `prompt` and read one trimmed line; `None` on end of input.
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        let _ = write!(self.output, "{}", prompt);
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => {
                let _ = writeln!(self.output);
                None
            }
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl<R: BufRead, W: Write> DecisionPort for TerminalPrompt<R, W> {
    fn ask_yes_no(&mut self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            let Some(answer) = self.read_line(&format!("{} {} ", question, hint)) else {
                return false;
            };
            match answer.to_lowercase().as_str() {
                "" => return default,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => {
                    let _ = writeln!(self.output, "Please answer y or n.");
                }
            }
        }
    }

    fn ask_choice(&mut self, question: &str, options: &[String]) -> usize {
        let _ = writeln!(self.output, "{}", question);
        for (i, option) in options.iter().enumerate() {
            let _ = writeln!(self.output, "  {}) {}", i + 1, option);
        }

        loop {
            let Some(answer) = self.read_line(&format!("Choice [1-{}]: ", options.len())) else {
                return options.len();
            };
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return n - 1,
                _ => {
                    let _ = writeln!(
                        self.output,
                        "Enter a number between 1 and {}.",
                        options.len()
                    );
                }
            }
        }
    }

    fn ask_text(&mut self, question: &str) -> String {
        self.read_line(&format!("{}: ", question))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(input: &str) -> TerminalPrompt<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompt::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_yes_no() {
        assert!(prompt("y\n").ask_yes_no("Update?", false));
        assert!(!prompt("NO\n").ask_yes_no("Update?", true));
        assert!(prompt("\n").ask_yes_no("Update?", true));
        assert!(prompt("maybe\nyes\n").ask_yes_no("Update?", false));
        assert!(!prompt("").ask_yes_no("Update?", false));
    }

    #[test]
    fn test_yes_no_eof_declines_even_with_yes_default() {
        let mut p = prompt("");
        assert!(!p.ask_yes_no("Update the binding?", true));
        assert!(String::from_utf8(p.output).unwrap().contains("[Y/n]"));
    }

    #[test]
    fn test_choice_is_one_based() {
        let options = vec!["Create".to_string(), "Cancel".to_string()];
        let mut p = prompt("0\nabc\n2\n");
        assert_eq!(p.ask_choice("What now?", &options), 1);

        let shown = String::from_utf8(p.output).unwrap();
        assert!(shown.contains("  1) Create\n  2) Cancel\n"));
        assert!(shown.contains("Enter a number between 1 and 2."));
    }

    #[test]
    fn test_choice_eof_cancels() {
        let options = vec!["Create".to_string(), "Cancel".to_string()];
        assert_eq!(prompt("").ask_choice("What now?", &options), 2);
    }

    #[test]
    fn test_text() {
        assert_eq!(prompt("  DB \n").ask_text("Binding"), "DB");
        assert_eq!(prompt("").ask_text("Binding"), "");
    }
}
