use super::{Command, CommandContext, CommandOutput, page_header};
use crate::error::{BotError, BotResult};
use crate::pagination::Pagination;
use async_trait::async_trait;
use std::fmt::Write;

const PAGE_SIZE: usize = 7;

/// `help [page|command]`
pub struct HelpCommand;

impl HelpCommand {
    fn page(&self, ctx: &CommandContext<'_>, page: i64) -> String {
        let mut cmds = ctx.registry.list();
        cmds.sort_by_key(|c| c.name());

        let pag = Pagination::new(page, PAGE_SIZE, cmds.len());
        let mut text = page_header(self.name(), pag.current_page, pag.total_page);
        for cmd in &cmds[pag.range()] {
            let _ = writeln!(text, "/{:<10} {}", cmd.name(), cmd.help());
        }
        text
    }

    fn detail(&self, ctx: &CommandContext<'_>, name: &str) -> BotResult<String> {
        let cmd = ctx.registry.get(name).ok_or(BotError::CommandNotFound)?;
        Ok(format!("{}\n\n{}\n\nUsage:\n{}", cmd.name(), cmd.help(), cmd.usage()))
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn help(&self) -> &'static str {
        "Show available commands"
    }

    fn usage(&self) -> &'static str {
        "/help [page|command]"
    }

    async fn execute(&self, ctx: &CommandContext<'_>, args: &[String]) -> BotResult<CommandOutput> {
        let text = match args.first() {
            None => self.page(ctx, 1),
            Some(arg) => match arg.parse::<i64>() {
                Ok(page) => self.page(ctx, page),
                Err(_) => self.detail(ctx, arg)?,
            },
        };
        Ok(CommandOutput::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Registry;
    use crate::commands::testing::{Echo, args};

    fn registry(extra: &[&'static str]) -> Registry {
        let mut registry = Registry::new();
        registry.register(Box::new(HelpCommand));
        for name in extra {
            registry.register(Box::new(Echo(name)));
        }
        registry
    }

    #[tokio::test]
    async fn first_page_lists_sorted_commands() {
        let registry = registry(&["stop", "info"]);
        let out = registry.execute("help", &[]).await.unwrap();

        assert_eq!(
            out.text,
            "(/help) showing page 1 out of 1\n\n\
             /help       Show available commands\n\
             /info       Echo the arguments\n\
             /stop       Echo the arguments\n"
        );
    }

    #[tokio::test]
    async fn pages_hold_seven_commands() {
        let registry = registry(&["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8"]);

        let page1 = registry.execute("help", &args(&["1"])).await.unwrap().text;
        assert!(page1.starts_with("(/help) showing page 1 out of 2\n\n"));
        assert_eq!(page1.lines().filter(|l| l.starts_with('/')).count(), 7);

        let page2 = registry.execute("help", &args(&["99"])).await.unwrap().text;
        assert!(page2.starts_with("(/help) showing page 2 out of 2\n\n"));
        assert!(page2.contains("/help "));
        assert_eq!(page2.lines().filter(|l| l.starts_with('/')).count(), 2);
    }

    #[tokio::test]
    async fn detail_for_named_command() {
        let registry = registry(&[]);
        let out = registry.execute("help", &args(&["help"])).await.unwrap();
        assert_eq!(
            out.text,
            "help\n\nShow available commands\n\nUsage:\n/help [page|command]"
        );
    }

    #[tokio::test]
    async fn detail_for_unknown_command() {
        let registry = registry(&[]);
        assert!(matches!(
            registry.execute("help", &args(&["nope"])).await,
            Err(BotError::CommandNotFound)
        ));
    }
}
