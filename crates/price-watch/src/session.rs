//! Interactive session: watchlist edits and check triggers read from the terminal.

use std::io::BufRead;
use std::sync::Arc;

use watch_core::{DisplaySurface, StyleHint};
use watchlist::{CheckCycleOrchestrator, WatchlistStore};

use crate::console::{parse_bound, ConsoleInput, ConsoleSurface};

const HELP: &str = "Commands: add [SYMBOL UPPER LOWER] | check | list | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `add` alone prompts for each field; `add SYM UP LOW` is the one-line form.
    Add(Option<AddArgs>),
    Check,
    List,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddArgs {
    pub symbol: String,
    pub upper: f64,
    pub lower: f64,
}

pub fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Command::Empty;
    };

    match head.to_ascii_lowercase().as_str() {
        "add" | "a" => {
            let rest: Vec<&str> = parts.collect();
            if rest.is_empty() {
                return Command::Add(None);
            }
            let upper = rest.get(1).map_or(Some(0.0), |s| parse_bound(s));
            let lower = rest.get(2).map_or(Some(0.0), |s| parse_bound(s));
            match (upper, lower) {
                (Some(upper), Some(lower)) if rest.len() <= 3 => Command::Add(Some(AddArgs {
                    symbol: rest[0].to_string(),
                    upper,
                    lower,
                })),
                _ => Command::Unknown(line.trim().to_string()),
            }
        }
        "check" | "c" => Command::Check,
        "list" | "l" => Command::List,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.trim().to_string()),
    }
}

/// Zero means "no threshold".
fn bound(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}

pub struct Session<R: BufRead> {
    surface: Arc<ConsoleSurface>,
    input: ConsoleInput<R>,
    store: WatchlistStore,
    orchestrator: CheckCycleOrchestrator,
}

impl<R: BufRead> Session<R> {
    pub fn new(
        surface: Arc<ConsoleSurface>,
        input: ConsoleInput<R>,
        store: WatchlistStore,
        orchestrator: CheckCycleOrchestrator,
    ) -> Self {
        Self {
            surface,
            input,
            store,
            orchestrator,
        }
    }

    pub fn store(&self) -> &WatchlistStore {
        &self.store
    }

    /// Process commands until `quit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.surface.write_line(HELP, StyleHint::Plain);

        loop {
            let Some(line) = self.input.read_text(&self.surface, ">")? else {
                break;
            };

            match parse_command(&line) {
                Command::Add(args) => self.add(args)?,
                Command::Check => {
                    self.orchestrator.run_check(&self.store).await;
                }
                Command::List => self.surface.write_table(self.store.all()),
                Command::Help => self.surface.write_line(HELP, StyleHint::Plain),
                Command::Quit => break,
                Command::Empty => {}
                Command::Unknown(text) => self.surface.write_line(
                    &format!("Unrecognized command '{}'. {}", text, HELP),
                    StyleHint::Warning,
                ),
            }
        }

        tracing::info!("Session ended with {} watched symbols", self.store.len());
        Ok(())
    }

    fn add(&mut self, args: Option<AddArgs>) -> anyhow::Result<()> {
        let args = match args {
            Some(args) => args,
            None => match self.prompt_add()? {
                Some(args) => args,
                None => return Ok(()),
            },
        };

        match self.store.upsert(&args.symbol, bound(args.upper), bound(args.lower)) {
            Ok(entry) => {
                let text = format!("Added {}, upper {}, lower {}", entry.symbol, args.upper, args.lower);
                self.surface.write_line(&text, StyleHint::Success);
                self.surface.write_table(self.store.all());
            }
            Err(e) => self.surface.write_line(&e.to_string(), StyleHint::Warning),
        }
        Ok(())
    }

    fn prompt_add(&mut self) -> anyhow::Result<Option<AddArgs>> {
        let Some(symbol) = self
            .input
            .read_text(&self.surface, "Ticker symbol (e.g. 2330.TW):")?
        else {
            return Ok(None);
        };
        let Some(upper) = self
            .input
            .read_number(&self.surface, "Upper bound (blank or 0 = none):")?
        else {
            return Ok(None);
        };
        let Some(lower) = self
            .input
            .read_number(&self.surface, "Lower bound (blank or 0 = none):")?
        else {
            return Ok(None);
        };
        Ok(Some(AddArgs { symbol, upper, lower }))
    }
}
