use anyhow::{bail, Context};
use bearychat::{BearychatConfig, Incoming, IncomingWebhookClient, RtmMessage, User};
use bearychat_mock::IncomingServer;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "bearychat", version, about = "BearyChat Incoming webhooks and RTM helpers")]
struct Cli {
    /// Config file (default: $BEARYCHAT_CONFIG, then ./bearychat.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send an Incoming message through a webhook.
    Send {
        #[arg(long)]
        text: String,
        /// Overrides incoming.webhook from the config.
        #[arg(long)]
        webhook: Option<String>,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        markdown: bool,
        #[arg(long)]
        notification: Option<String>,
    },
    /// Run the mock Incoming server until Ctrl-C.
    Mock {
        #[arg(long)]
        webhook: Option<String>,
        /// Answer every request with this application error.
        #[arg(long)]
        fail: Option<String>,
    },
    /// Classify an RTM frame, or derive a reply / refer from it.
    Rtm {
        /// The frame as JSON.
        message: String,
        #[arg(long, conflicts_with = "refer")]
        reply: Option<String>,
        #[arg(long)]
        refer: Option<String>,
        /// Your user id, to report whether the frame is from or mentions you.
        #[arg(long)]
        me: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bearychat=info,bearychat_mock=info,tower_http=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // explicit --config > BEARYCHAT_CONFIG env > ./bearychat.toml
    let config_path = cli.config.or_else(|| std::env::var("BEARYCHAT_CONFIG").ok());
    let config = BearychatConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        BearychatConfig::default()
    });

    match cli.command {
        Command::Send {
            text,
            webhook,
            channel,
            user,
            markdown,
            notification,
        } => {
            let mut incoming = Incoming::new(text).with_markdown(markdown || config.incoming.markdown);
            incoming.channel = channel.or(config.incoming.channel.clone());
            incoming.user = user.or(config.incoming.user.clone());
            incoming.notification = notification;

            let mut client = IncomingWebhookClient::from_config(&config.incoming);
            if let Some(webhook) = webhook {
                client.set_webhook(webhook);
            }

            let resp = client
                .send_incoming(&incoming)
                .await
                .context("sending incoming message")?;
            if !resp.is_ok() {
                bail!(
                    "webhook rejected message (code {}): {}",
                    resp.code,
                    resp.error.unwrap_or_default()
                );
            }
            info!("message delivered");
            println!("{}", serde_json::to_string(&resp)?);
        }
        Command::Mock { webhook, fail } => {
            let webhook = webhook.unwrap_or(config.mock.webhook);
            let server = IncomingServer::new().with_webhook(&webhook)?;
            let server = match fail.or(config.mock.fail) {
                Some(message) => server.with_error_response(message),
                None => server.with_ok_response(),
            };

            server
                .listen_and_serve(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
        }
        Command::Rtm {
            message,
            reply,
            refer,
            me,
        } => {
            let frame = RtmMessage::parse(&message).context("parsing RTM frame")?;
            let out = match (reply, refer) {
                (Some(text), _) => serde_json::to_value(frame.reply(&text))?,
                (_, Some(text)) => serde_json::to_value(frame.refer(&text))?,
                (None, None) => describe(&frame, me.map(User::new).as_ref()),
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }

    Ok(())
}

fn describe(frame: &RtmMessage, me: Option<&User>) -> serde_json::Value {
    let mut out = json!({
        "type": frame.message_type(),
        "is_p2p": frame.is_p2p(),
        "is_chat_message": frame.is_chat_message(),
        "mentions": frame.mentioned_uids(),
    });
    if let Some(user) = me {
        out["is_from_me"] = json!(frame.is_from_me(user));
        out["mentions_me"] = json!(frame.is_mention_user(user));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reply_and_refer_conflict() {
        let parsed = Cli::try_parse_from(["bearychat", "rtm", "{}", "--reply", "a", "--refer", "b"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn describe_reports_classification() {
        let frame = RtmMessage::new()
            .with("type", "message")
            .with("uid", "u1")
            .with("text", "hi @<=u2=>");
        let out = describe(&frame, Some(&User::new("u2")));
        assert_eq!(out["type"], "message");
        assert_eq!(out["is_p2p"], true);
        assert_eq!(out["is_from_me"], false);
        assert_eq!(out["mentions_me"], true);
    }
}
