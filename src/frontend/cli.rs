//! Line-oriented terminal front-end.
//!
//! ```text
//! faction elyos            select the faction (elyos, asmodian, 1 or 2)
//! set Iron Ore 1,500       set a base price; the price is the last word
//! price ^iron              estimate every item whose name matches the expression
//! how Iron Ingot           shopping list and craft order for an item
//! help                     this text
//! quit                     leave this session
//! shutdown                 stop the service for every front-end
//! ```

use log::{debug, trace};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::catalog::Faction;
use crate::dispatch::{replies, DispatchError, DispatcherHandle};
use crate::logutil::escape_log;
use crate::metrics;
use crate::validation::parse_price;

pub const GREETING: &str = "Let's begin\n------\n";
pub const SELECT_FACTION_FIRST: &str = "Select the faction first (faction elyos | faction asmodian)";
pub const WRONG_FORMAT: &str = "Wrong command format. Type help for the command list.";
pub const DISPATCHER_GONE: &str = "Service is shutting down.";
pub const NOT_UTF8: &str = "Input is not valid UTF-8; line ignored.";

pub const HELP_TEXT: &str = "Commands:\n\
  faction <elyos|asmodian|1|2>  select the faction\n\
  set <item name> <price>       set the price of an item\n\
  price <expression>            estimate crafting prices of matching items\n\
  how <item name>               show what to buy and what to craft\n\
  help                          show this text\n\
  quit                          leave this session\n\
  shutdown                      stop the service";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Faction(Faction),
    Set { name: String, price: String },
    Price(String),
    How(String),
    Help,
    Quit,
    Shutdown,
    Empty,
    Invalid(String),
}

#[derive(Debug, Default)]
pub struct CliCommandParser;

impl CliCommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &str) -> CliCommand {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CliCommand::Empty;
        }
        let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (trimmed, ""),
        };
        let verb = verb.to_lowercase();
        trace!("Parsed verb '{}' from '{}'", verb, escape_log(raw));
        match verb.as_str() {
            "help" | "?" => CliCommand::Help,
            "quit" | "exit" => CliCommand::Quit,
            "shutdown" => CliCommand::Shutdown,
            "faction" | "race" => match Faction::from_name(rest) {
                Some(faction) => CliCommand::Faction(faction),
                None if rest.is_empty() => CliCommand::Invalid(WRONG_FORMAT.to_string()),
                None => CliCommand::Invalid(format!("Unknown faction: {}", rest)),
            },
            "set" => match rest.rsplit_once(char::is_whitespace) {
                Some((name, price)) if !name.trim().is_empty() => CliCommand::Set {
                    name: name.trim().to_string(),
                    price: price.to_string(),
                },
                _ => CliCommand::Invalid(WRONG_FORMAT.to_string()),
            },
            "price" if !rest.is_empty() => CliCommand::Price(rest.to_string()),
            "how" | "plan" if !rest.is_empty() => CliCommand::How(rest.to_string()),
            "price" | "how" | "plan" => CliCommand::Invalid(WRONG_FORMAT.to_string()),
            _ => CliCommand::Invalid(format!("Unknown command: {}", verb)),
        }
    }
}

/// Why a CLI session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliExit {
    /// `quit`: this session detached, the service keeps running.
    Quit,
    /// `shutdown`: the dispatcher was stopped for everyone.
    Shutdown,
    /// Input closed.
    Eof,
    /// The dispatcher stopped while this session was still open.
    DispatcherClosed,
}

/// Run one CLI session over any line reader and writer.
///
/// A line that is not valid UTF-8 is answered with [`NOT_UTF8`] and skipped; only
/// failures of the reader or writer themselves end the session with an error.
pub async fn run_cli<R, W>(handle: DispatcherHandle, mut reader: R, mut writer: W) -> std::io::Result<CliExit>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let parser = CliCommandParser::new();
    let mut faction: Option<Faction> = None;
    let mut buf: Vec<u8> = Vec::new();

    writer.write_all(GREETING.as_bytes()).await?;
    writer.flush().await?;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let cmd = match std::str::from_utf8(&buf) {
            Ok(line) => parser.parse(line),
            Err(e) => {
                metrics::inc_malformed();
                debug!("discarding input line: {}", e);
                write_reply(&mut writer, NOT_UTF8).await?;
                continue;
            }
        };
        debug!("cli command: {:?}", cmd);

        let outcome: Result<Option<String>, DispatchError> = match cmd {
            CliCommand::Empty => Ok(None),
            CliCommand::Help => Ok(Some(HELP_TEXT.to_string())),
            CliCommand::Invalid(message) => Ok(Some(message)),
            CliCommand::Quit => return Ok(CliExit::Quit),
            CliCommand::Shutdown => {
                let reply = handle.shutdown().await.unwrap_or_else(|_| DISPATCHER_GONE.to_string());
                write_reply(&mut writer, &reply).await?;
                return Ok(CliExit::Shutdown);
            }
            CliCommand::Faction(selected) => {
                faction = Some(selected);
                Ok(Some(format!("Faction set to {}", selected)))
            }
            request => match faction {
                None => Ok(Some(SELECT_FACTION_FIRST.to_string())),
                Some(selected) => forward(&handle, selected, request).await,
            },
        };

        match outcome {
            Ok(Some(reply)) => write_reply(&mut writer, &reply).await?,
            Ok(None) => {}
            Err(DispatchError::Closed) => {
                write_reply(&mut writer, DISPATCHER_GONE).await?;
                return Ok(CliExit::DispatcherClosed);
            }
        }
    }
    Ok(CliExit::Eof)
}

/// Send a faction-scoped request to the dispatcher.
async fn forward(
    handle: &DispatcherHandle,
    faction: Faction,
    request: CliCommand,
) -> Result<Option<String>, DispatchError> {
    match request {
        CliCommand::Set { name, price } => match parse_price(&price) {
            Ok(value) => handle.set_price(faction, &name, value).await.map(Some),
            Err(e) => {
                metrics::inc_malformed();
                Ok(Some(replies::invalid_price(&name, &e)))
            }
        },
        CliCommand::Price(pattern) => handle.price(faction, &pattern).await.map(Some),
        CliCommand::How(name) => handle.plan(faction, &name).await.map(Some),
        _ => Ok(None),
    }
}

async fn write_reply<W: AsyncWrite + Unpin>(writer: &mut W, reply: &str) -> std::io::Result<()> {
    writer.write_all(reply.trim_end().as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
