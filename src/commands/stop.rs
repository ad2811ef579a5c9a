use super::{Command, CommandContext, CommandOutput, parse_index};
use crate::error::BotResult;
use crate::service::ServerSettingsService;
use async_trait::async_trait;
use std::sync::Arc;

pub const STOPPING: &str = "Server is stopping :)";

/// `stop <index>`
pub struct StopCommand {
    settings: Arc<ServerSettingsService>,
}

impl StopCommand {
    pub fn new(settings: Arc<ServerSettingsService>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Command for StopCommand {
    fn name(&self) -> &'static str {
        "stop"
    }

    fn help(&self) -> &'static str {
        "Stop a server by its ID"
    }

    fn usage(&self) -> &'static str {
        "/stop [id]"
    }

    async fn execute(&self, _ctx: &CommandContext<'_>, args: &[String]) -> BotResult<CommandOutput> {
        let index = parse_index(args)?;
        self.settings.stop_server(index).await?;
        Ok(CommandOutput::text(STOPPING))
    }
}
