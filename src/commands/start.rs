use super::{Command, CommandContext, CommandOutput, parse_index};
use crate::error::BotResult;
use crate::hosting::ServerStatus;
use crate::service::{PollOptions, ServerSettingsService};
use async_trait::async_trait;
use futures_util::FutureExt;
use std::sync::Arc;

pub const STARTING: &str = "Server is starting";

pub fn start_finished(index: usize, status: ServerStatus) -> String {
    format!("Server {index} start finished with status: {status}")
}

/// `start <index>`
///
/// Replies right away; the final status follows once polling ends.
pub struct StartCommand {
    settings: Arc<ServerSettingsService>,
    poll: PollOptions,
}

impl StartCommand {
    pub fn new(settings: Arc<ServerSettingsService>, poll: PollOptions) -> Self {
        Self { settings, poll }
    }
}

#[async_trait]
impl Command for StartCommand {
    fn name(&self) -> &'static str {
        "start"
    }

    fn help(&self) -> &'static str {
        "Start a server by its ID"
    }

    fn usage(&self) -> &'static str {
        "/start [id]"
    }

    async fn execute(&self, _ctx: &CommandContext<'_>, args: &[String]) -> BotResult<CommandOutput> {
        let index = parse_index(args)?;
        let stream = self.settings.start_server(index, self.poll).await?;

        let follow_up = async move {
            let status = stream.last().await.unwrap_or(ServerStatus::Starting);
            start_finished(index, status)
        }
        .boxed();

        Ok(CommandOutput::text(STARTING).with_follow_up(follow_up))
    }
}
