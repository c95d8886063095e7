//! One interactive session: configuration, history and variables, and the
//! lex → split → record → expand run for each input line.

use serde::Serialize;

use crate::config::Config;
use crate::error::ShellError;
use crate::expand::{Expander, ResolvedCommand};
use crate::history::History;
use crate::input::InputSource;
use crate::parse::{self, CommandTree};
use crate::vars::ShellVars;

/// The outcome of one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Processed {
    /// One expanded tree per top-level entry, in order.
    pub commands: Vec<CommandTree<ResolvedCommand>>,
    /// The line as recorded in history.
    pub text: String,
    pub history_expanded: bool,
}

pub struct Session {
    config: Config,
    history: History,
    vars: ShellVars,
    recorded: Option<String>,
}

impl Session {
    /// A session whose variables are seeded from the process environment.
    pub fn new(config: Config) -> Self {
        Self::with_vars(config, ShellVars::from_env())
    }

    pub fn with_vars(config: Config, vars: ShellVars) -> Self {
        let history = History::new(config.history.max_entries);
        Self {
            config,
            history,
            vars,
            recorded: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Add a line to history without running it.
    pub fn record(&mut self, line: &str) -> bool {
        self.history.push(line)
    }

    /// The entry the last `process` call added to history, if any.
    pub fn recorded(&self) -> Option<&str> {
        self.recorded.as_deref()
    }

    pub fn vars(&self) -> &ShellVars {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut ShellVars {
        &mut self.vars
    }

    /// Run one line through the pipeline. `input` answers continuation
    /// requests. A line that lexes and splits cleanly is recorded in
    /// history even when expansion then fails.
    pub fn process(
        &mut self,
        line: &str,
        input: &mut dyn InputSource,
    ) -> Result<Processed, ShellError> {
        self.recorded = None;
        let parsed = parse::parse(
            line,
            input,
            &self.history,
            self.config.history.event_window,
        )?;
        if self.history.push(&parsed.text) {
            log::debug!("history: recorded entry {}", self.history.len());
            self.recorded = Some(parsed.text.clone());
        }

        let mut expander =
            Expander::new(&mut self.vars).with_options(self.config.expansion.options());
        let commands = parsed
            .commands
            .into_iter()
            .map(|tree| expander.expand_tree(tree))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Processed {
            commands,
            text: parsed.text,
            history_expanded: parsed.history_expanded,
        })
    }
}
