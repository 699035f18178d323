use std::env;
use std::fs;
use std::io::{self, BufRead, IsTerminal};
use std::process::ExitCode;

use coral::engine::diagnostics::*;
use coral::engine::lexer::*;
use coral::engine::rule::*;
use coral::engine::term::*;
use coral::repl::Repl;

/// The engine itself never stops a divergent reduction, so the front end
/// drives single steps under this budget and gives up loudly.
const STEP_LIMIT: usize = 1_000_000;

struct Session {
    rules: Ruleset,
    library_paths: Vec<String>,
}

enum Outcome {
    Continue,
    Quit,
}

impl Session {
    fn new(library_paths: Vec<String>) -> Self {
        Self {
            rules: Ruleset::default(),
            library_paths,
        }
    }

    fn load_libraries(&mut self, diag: &mut impl Diagnoster) -> Option<()> {
        for path in self.library_paths.clone() {
            self.load_library(&path, diag)?;
        }
        Some(())
    }

    fn load_library(&mut self, path: &str, diag: &mut impl Diagnoster) -> Option<()> {
        let path = if path.ends_with(".coral") {
            path.to_string()
        } else {
            format!("{}.coral", path)
        };
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("coral: could not load library {}: {}", path, err);
                return None;
            }
        };
        let mut lexer = Lexer::new(source.chars().collect(), Some(path.clone()));
        let count = self.rules.load(&mut lexer, diag)?;
        eprintln!("loaded {} rules from {}", count, path);
        Some(())
    }

    /// Drops every loaded rule and loads the startup libraries again, so
    /// edited library files take effect without restarting the session.
    fn reload(&mut self, diag: &mut impl Diagnoster) {
        self.rules.clear();
        if self.load_libraries(diag).is_none() {
            eprintln!("coral: reload failed, the session keeps the rules loaded before the error");
        }
    }

    fn eval(&self, line: &str, diag: &mut impl Diagnoster) -> Option<Term> {
        let mut lexer = Lexer::new(line.chars().collect(), None);
        let mut term = Term::parse(&mut lexer, diag)?;
        lexer.expect_token(TokenKind::End).map_err(|(_, actual_token)| {
            diag.report(&actual_token.loc, Severity::Error, &format!("unexpected {} after the term", actual_token.report()));
        }).ok()?;

        for _ in 0..STEP_LIMIT {
            match self.rules.step(&term) {
                Some(next) => term = next,
                None => return Some(term),
            }
        }
        eprintln!("coral: no normal form within {} steps, giving up on {}", STEP_LIMIT, line.trim());
        None
    }

    fn process_line(&mut self, line: &str, diag: &mut impl Diagnoster) -> Outcome {
        match line.trim() {
            "" => {}
            "quit" | "exit" => return Outcome::Quit,
            "reload" => self.reload(diag),
            "list" => {
                for rule in self.rules.iter() {
                    println!("{}", rule);
                }
            }
            line => {
                if let Some(term) = self.eval(line, diag) {
                    println!("{}", term);
                }
            }
        }
        Outcome::Continue
    }
}

fn main() -> ExitCode {
    let library_paths: Vec<String> = env::args().skip(1).collect();
    let mut diag = StdoutDiagnoster {};

    let mut session = Session::new(library_paths);
    if session.load_libraries(&mut diag).is_none() {
        return ExitCode::FAILURE;
    }

    if io::stdin().is_terminal() {
        let mut repl = Repl::new();
        loop {
            match repl.read_line("coral> ") {
                Ok(Some(line)) => {
                    if let Outcome::Quit = session.process_line(&line, &mut diag) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    eprintln!("coral: could not read the input line: {}", err);
                    return ExitCode::FAILURE;
                }
            }
        }
    } else {
        // Not a terminal: read terms line by line, print one normal form
        // per line. This is what makes `echo '+ one two' | coral std/std`
        // usable in scripts and tests.
        for line in io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if let Outcome::Quit = session.process_line(&line, &mut diag) {
                        break;
                    }
                }
                Err(err) => {
                    eprintln!("coral: could not read the input line: {}", err);
                    return ExitCode::FAILURE;
                }
            }
        }
    }
    ExitCode::SUCCESS
}
