//! Bot commands and their registry.
//!
//! A command turns arguments into reply text. Sending the reply, and any
//! follow-up message, is the route handler's job.

mod help;
mod info;
mod servers;
mod start;
mod stop;

pub use help::HelpCommand;
pub use info::InfoCommand;
pub use servers::ServersCommand;
pub use start::StartCommand;
pub use stop::StopCommand;

use crate::error::{BotError, BotResult};
use crate::service::{PollOptions, ServerSettingsService};
use async_trait::async_trait;
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

/// Header line of a paginated reply, followed by a blank line.
pub(crate) fn page_header(name: &str, current: usize, total: usize) -> String {
    format!("(/{name}) showing page {current} out of {total}\n\n")
}

/// Parse the mandatory server index argument.
pub(crate) fn parse_index(args: &[String]) -> BotResult<usize> {
    let raw = args.first().ok_or(BotError::MissingArgument)?;
    raw.parse()
        .map_err(|_| BotError::InvalidArgument(raw.clone()))
}

/// What a command can see besides its arguments.
pub struct CommandContext<'a> {
    pub registry: &'a Registry,
}

/// Result of a command.
pub struct CommandOutput {
    /// Sent right away.
    pub text: String,
    /// Background work whose result is sent as a second message.
    pub follow_up: Option<BoxFuture<'static, String>>,
}

impl CommandOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            follow_up: None,
        }
    }

    pub fn with_follow_up(mut self, follow_up: BoxFuture<'static, String>) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

impl std::fmt::Debug for CommandOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandOutput")
            .field("text", &self.text)
            .field("follow_up", &self.follow_up.is_some())
            .finish()
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Unique name, without the leading slash.
    fn name(&self) -> &'static str;

    /// One-line description for the help listing.
    fn help(&self) -> &'static str;

    fn usage(&self) -> &'static str;

    /// Must return promptly; long work goes into [`CommandOutput::follow_up`].
    async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<CommandOutput>;
}

/// Fixed set of commands, written once at startup.
#[derive(Default)]
pub struct Registry {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in command.
    pub fn with_defaults(settings: Arc<ServerSettingsService>, poll: PollOptions) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(HelpCommand));
        registry.register(Box::new(ServersCommand::new(Arc::clone(&settings))));
        registry.register(Box::new(StartCommand::new(Arc::clone(&settings), poll)));
        registry.register(Box::new(StopCommand::new(Arc::clone(&settings))));
        registry.register(Box::new(InfoCommand::new(settings)));
        registry
    }

    /// Add `cmd`.
    ///
    /// # Panics
    ///
    /// Panics if a command with the same name is already registered. The
    /// command set is fixed at startup, so a collision is a programming error.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        let name = cmd.name();
        if self.commands.contains_key(name) {
            panic!("command name must be unique: {name}");
        }
        self.commands.insert(name, cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Every command, in no particular order.
    pub fn list(&self) -> Vec<&dyn Command> {
        self.commands.values().map(|c| c.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run command `name` with `args`.
    pub async fn execute(&self, name: &str, args: &[String]) -> BotResult<CommandOutput> {
        let cmd = self.get(name).ok_or(BotError::CommandNotFound)?;
        let ctx = CommandContext { registry: self };
        cmd.execute(&ctx, args).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{Echo, args};
    use super::*;

    #[test]
    #[should_panic(expected = "command name must be unique")]
    fn duplicate_registration_panics() {
        let mut registry = Registry::new();
        registry.register(Box::new(Echo("echo")));
        registry.register(Box::new(Echo("echo")));
    }

    #[tokio::test]
    async fn execute_unknown_command() {
        let registry = Registry::new();
        assert!(matches!(
            registry.execute("nope", &[]).await,
            Err(BotError::CommandNotFound)
        ));
    }

    #[tokio::test]
    async fn execute_passes_arguments() {
        let mut registry = Registry::new();
        registry.register(Box::new(Echo("echo")));

        let out = registry.execute("echo", &args(&["a", "b"])).await.unwrap();
        assert_eq!(out.text, "a b");
        assert!(out.follow_up.is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn index_argument_parsing() {
        assert!(matches!(parse_index(&[]), Err(BotError::MissingArgument)));
        assert!(matches!(
            parse_index(&args(&["x"])),
            Err(BotError::InvalidArgument(a)) if a == "x"
        ));
        assert!(matches!(parse_index(&args(&["-1"])), Err(BotError::InvalidArgument(_))));
        assert_eq!(parse_index(&args(&["3", "extra"])).unwrap(), 3);
    }
}
