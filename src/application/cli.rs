use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::Arg;
use clap::ArgAction;
use clap::Command;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Session;
use crate::infrastructure::api::AssistantApi;

fn format_session(session: &Session) -> String {
    let mut res = format!("- (ID: {}) {}", session.session_id, session.title);
    if !session.last_time.is_empty() {
        res = format!("{res}, {}", session.last_time);
    }

    return res;
}

async fn print_sessions_list() -> Result<()> {
    let api = AssistantApi::default();
    let sessions = api
        .session_list(
            1,
            Config::get_u64(ConfigKey::PageSize, 10),
            &Config::get(ConfigKey::UserId),
        )
        .await?
        .iter()
        .map(|session| {
            return format_session(session);
        })
        .collect::<Vec<String>>();

    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
    } else {
        println!("{}", sessions.join("\n"));
    }

    return Ok(());
}

pub fn build() -> Command {
    return Command::new("wayfarer")
        .about("Terminal travel assistant with streaming chat, geocoding, and route planning")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("sessions")
                .long("sessions")
                .help("List your chat sessions and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .long("config-file")
                .help("Path to the configuration file")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::ApiUrl.to_string())
                .long("api-url")
                .help("Assistant API base URL")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::UserId.to_string())
                .long("user-id")
                .help("User id sent with chat and session requests")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .long("username")
                .help("Display name used in the prompt")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::SessionId.to_string())
                .long("session-id")
                .help("Session to resume on startup")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::MapProvider.to_string())
                .long("map-provider")
                .help("Map provider used for route planning")
                .num_args(1)
                .value_parser(PossibleValuesParser::new(["amap", "osm"])),
        )
        .arg(
            Arg::new(ConfigKey::AuthToken.to_string())
                .long("auth-token")
                .env("WAYFARER_AUTH_TOKEN")
                .help("Access token for the assistant API")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::AuthRefreshToken.to_string())
                .long("auth-refresh-token")
                .env("WAYFARER_AUTH_REFRESH_TOKEN")
                .help("Refresh token for the assistant API")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::AmapWebApiKey.to_string())
                .long("amap-web-api-key")
                .env("WAYFARER_AMAP_WEB_API_KEY")
                .help("Amap web service API key")
                .num_args(1),
        )
        .arg(
            Arg::new(ConfigKey::PageSize.to_string())
                .long("page-size")
                .help("Number of sessions per page")
                .num_args(1),
        );
}

/// Parses flags and loads configuration. Returns false when the invocation was
/// fully handled here and the REPL should not start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();
    Config::load(&matches).await?;

    if matches.get_flag("sessions") {
        print_sessions_list().await?;
        return Ok(false);
    }

    return Ok(true);
}
