use super::{Command, CommandContext, CommandOutput, parse_index};
use crate::error::BotResult;
use crate::hosting::ServerInfo;
use crate::service::ServerSettingsService;
use async_trait::async_trait;
use std::sync::Arc;

/// `info <index>`
pub struct InfoCommand {
    settings: Arc<ServerSettingsService>,
}

impl InfoCommand {
    pub fn new(settings: Arc<ServerSettingsService>) -> Self {
        Self { settings }
    }
}

/// Host and port are empty while the server is offline.
fn format_info(index: usize, server: &ServerInfo) -> String {
    let (software, version) = server.software_label();
    let host = server.host.as_deref().unwrap_or_default();
    let port = server.port.map(|p| p.to_string()).unwrap_or_default();
    format!(
        "ID: {index} [{}] \nName: {}\nAddress: {}\nMotd: {}\nStatus: {}\nHost: {host}\nPort: {port}\nPlayers:{}/{}\nSoftware: {software} {version}\nShared: {}",
        server.id,
        server.name,
        server.address,
        server.motd,
        server.status,
        server.players.count,
        server.players.max,
        server.shared,
    )
}

#[async_trait]
impl Command for InfoCommand {
    fn name(&self) -> &'static str {
        "info"
    }

    fn help(&self) -> &'static str {
        "Check a server info by its ID"
    }

    fn usage(&self) -> &'static str {
        "/info [id]"
    }

    async fn execute(&self, _ctx: &CommandContext<'_>, args: &[String]) -> BotResult<CommandOutput> {
        let index = parse_index(args)?;
        let server = self.settings.server_info(index).await?;
        Ok(CommandOutput::text(format_info(index, &server)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosting::ServerStatus;
    use crate::hosting::fake::server;

    #[test]
    fn offline_server_has_empty_host_and_port() {
        let srv = server("a1", "alpha", ServerStatus::Offline);
        assert_eq!(
            format_info(0, &srv),
            "ID: 0 [a1] \nName: alpha\nAddress: alpha.example.net\nMotd: Welcome to alpha\n\
             Status: offline\nHost: \nPort: \nPlayers:0/20\nSoftware: Vanilla 1.20.4\nShared: false"
        );
    }

    #[test]
    fn online_server_shows_host_and_port() {
        let mut srv = server("a1", "alpha", ServerStatus::Online);
        srv.host = Some("node7.example.net".into());
        srv.port = Some(25565);
        srv.players.count = 3;
        srv.shared = true;

        let text = format_info(1, &srv);
        assert!(text.contains("Host: node7.example.net\nPort: 25565\n"));
        assert!(text.contains("Players:3/20\n"));
        assert!(text.ends_with("Shared: true"));
    }
}
