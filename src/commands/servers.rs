use super::{Command, CommandContext, CommandOutput, page_header};
use crate::error::{BotError, BotResult};
use crate::hosting::ServerInfo;
use crate::pagination::Pagination;
use crate::service::ServerSettingsService;
use async_trait::async_trait;
use std::sync::Arc;

const PAGE_SIZE: usize = 4;

/// `servers [page]`
pub struct ServersCommand {
    settings: Arc<ServerSettingsService>,
}

impl ServersCommand {
    pub fn new(settings: Arc<ServerSettingsService>) -> Self {
        Self { settings }
    }
}

/// One listing entry. `index` is what `start`, `stop` and `info` accept.
fn format_entry(index: usize, server: &ServerInfo) -> String {
    let (software, version) = server.software_label();
    format!(
        "ID: {index} [{}]\nName: {}\nAddress: {}\nStatus: {}\nSoftware: {software} {version}\n",
        server.id, server.name, server.address, server.status,
    )
}

#[async_trait]
impl Command for ServersCommand {
    fn name(&self) -> &'static str {
        "servers"
    }

    fn help(&self) -> &'static str {
        "Show available servers"
    }

    fn usage(&self) -> &'static str {
        "/servers [page]"
    }

    async fn execute(&self, _ctx: &CommandContext<'_>, args: &[String]) -> BotResult<CommandOutput> {
        let page = match args.first() {
            None => 1,
            Some(arg) => arg
                .parse::<i64>()
                .map_err(|_| BotError::InvalidArgument(arg.clone()))?,
        };

        let servers = self.settings.list_servers().await?;
        let pag = Pagination::new(page, PAGE_SIZE, servers.len());

        let mut text = page_header(self.name(), pag.current_page, pag.total_page);
        if pag.range().is_empty() {
            text.push_str("No servers found");
        }
        for (index, server) in servers.iter().enumerate().skip(pag.start()).take(pag.end() - pag.start()) {
            text.push_str(&format_entry(index, server));
            text.push('\n');
        }

        Ok(CommandOutput::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Registry;
    use crate::commands::testing::args;
    use crate::db::{API_KEY, Database};
    use crate::hosting::ServerStatus;
    use crate::hosting::fake::{FakeHosting, VALID_KEY, server};

    async fn registry(count: usize) -> Registry {
        let servers = (0..count)
            .map(|i| server(&format!("id{i}"), &format!("srv{i}"), ServerStatus::Offline))
            .collect();
        let fake = Arc::new(FakeHosting::with_servers(servers));
        let db = Database::new(":memory:").await.unwrap();
        db.settings().upsert(API_KEY, VALID_KEY).await.unwrap();

        let mut registry = Registry::new();
        registry.register(Box::new(ServersCommand::new(Arc::new(
            ServerSettingsService::new(db, fake, false),
        ))));
        registry
    }

    #[test]
    fn entry_format() {
        let srv = server("tgkm", "alpha", ServerStatus::Online);
        assert_eq!(
            format_entry(2, &srv),
            "ID: 2 [tgkm]\nName: alpha\nAddress: alpha.example.net\nStatus: online\nSoftware: Vanilla 1.20.4\n"
        );
    }

    #[tokio::test]
    async fn second_page_shows_absolute_indexes() {
        let registry = registry(6).await;
        let text = registry.execute("servers", &args(&["2"])).await.unwrap().text;

        assert!(text.starts_with("(/servers) showing page 2 out of 2\n\nID: 4 [id4]\n"));
        assert!(text.contains("ID: 5 [id5]"));
        assert!(!text.contains("ID: 3 "));
    }

    #[tokio::test]
    async fn empty_listing() {
        let registry = registry(0).await;
        let text = registry.execute("servers", &[]).await.unwrap().text;
        assert_eq!(text, "(/servers) showing page 1 out of 0\n\nNo servers found");
    }

    #[tokio::test]
    async fn non_numeric_page_is_invalid() {
        let registry = registry(1).await;
        assert!(matches!(
            registry.execute("servers", &args(&["two"])).await,
            Err(BotError::InvalidArgument(_))
        ));
    }
}
