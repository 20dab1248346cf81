use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use tokio::fs;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Author;
use crate::domain::models::Conversation;
use crate::domain::models::Message;
use crate::domain::models::Route;
use crate::domain::models::Session;
use crate::domain::models::Waypoint;
use crate::domain::services::markdown;
use crate::domain::services::ChatService;
use crate::domain::services::TurnResult;
use crate::infrastructure::api::AssistantApi;
use crate::infrastructure::geocoding::Geocoder;
use crate::infrastructure::map::MapProviderKind;
use crate::infrastructure::map::MapServiceManager;

const HELP: &str = r#"Commands:
  /sessions            List your chat sessions
  /history             Reprint the current conversation
  /new                 Start a fresh session
  /route A;B;C         Plan a route through waypoints (keyword[,city[,province]])
  /map amap|osm        Switch the active map provider
  /export FILE         Export the conversation as HTML
  /help                Show this help
  /quit                Exit

Anything else is sent to the assistant. Ctrl-C stops a streaming reply."#;

fn print_message(message: &Message) {
    let label = match message.author {
        Author::User => Config::get(ConfigKey::Username),
        Author::Assistant => "Assistant".to_string(),
    };
    println!("{label}: {}", message.text.trim_end());
}

fn print_sessions(sessions: &[Session]) {
    if sessions.is_empty() {
        println!("There are no sessions available. You should start your first one!");
        return;
    }

    for session in sessions {
        let mut line = format!("- (ID: {}) {}", session.session_id, session.title);
        if !session.last_time.is_empty() {
            line = format!("{line}, {}", session.last_time);
        }
        println!("{line}");
    }
}

fn print_route(route: &Route) {
    println!(
        "总距离 {:.1} 公里，预计 {:.0} 分钟",
        route.distance / 1000.0,
        route.duration / 60.0
    );

    for (idx, step) in route.steps.iter().enumerate() {
        let mut line = format!("{}. {}", idx + 1, step.instruction);
        if !step.road.is_empty() {
            line = format!("{line} ({})", step.road);
        }
        println!("{line}");
    }
}

async fn export_html(conversation: &Conversation, path: &str) -> Result<()> {
    let mut body = String::new();
    for message in conversation.messages() {
        let class = message.author.role();
        body.push_str(&format!(
            "<div class=\"{class}\">{}</div>\n",
            markdown::render(&message.text)
        ));
    }

    let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M");
    let html = format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>wayfarer</title></head>\n<body>\n{body}<footer>{stamp}</footer>\n</body>\n</html>\n"
    );
    fs::write(path, html).await?;
    println!("Exported conversation to {path}");

    return Ok(());
}

struct Repl {
    api: Arc<AssistantApi>,
    chat: ChatService,
    map: MapServiceManager,
    conversation: Conversation,
    session_id: String,
}

impl Repl {
    async fn init() -> Repl {
        let api = Arc::new(AssistantApi::default());
        let chat = ChatService::default();
        let mut map = MapServiceManager::new(Arc::new(Geocoder::default()));

        match MapProviderKind::parse(&Config::get(ConfigKey::MapProvider)) {
            Ok(kind) => {
                if let Err(err) = map.init_map_service(kind).await {
                    tracing::warn!(error = %err, "Map provider failed to initialize");
                    println!("Map provider unavailable: {err}");
                }
            }
            Err(err) => println!("{err}"),
        }

        let mut session_id = Config::get(ConfigKey::SessionId);
        let mut conversation = Conversation::new();
        if session_id.is_empty() {
            session_id = uuid::Uuid::new_v4().to_string();
        } else {
            match api.get_history(&session_id).await {
                Ok(history) => conversation = Conversation::from_history(history),
                Err(err) => {
                    tracing::warn!(error = %err, session_id, "Could not load session history");
                    println!("Could not load session history: {err}");
                }
            }
        }

        return Repl {
            api,
            chat,
            map,
            conversation,
            session_id,
        };
    }

    async fn chat_turn(&mut self, text: &str) {
        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                watcher.cancel();
            }
        });

        let result = self
            .chat
            .send(&mut self.conversation, &self.session_id, text, &cancel)
            .await;
        ctrl_c.abort();

        match result {
            Ok(TurnResult::Completed { .. }) | Ok(TurnResult::Failed) => {
                if let Some(reply) = self.conversation.last() {
                    print_message(reply);
                }
            }
            Ok(TurnResult::RefreshFailed) => {
                if let Some(reply) = self.conversation.last() {
                    print_message(reply);
                }
                println!("会话列表刷新失败，稍后可用 /sessions 重试。");
            }
            Ok(TurnResult::Cancelled) => println!("已停止生成。"),
            Err(err) => println!("{err}"),
        }
    }

    async fn route(&self, input: &str) {
        let waypoints = match Waypoint::parse_list(input) {
            Ok(waypoints) => waypoints,
            Err(err) => {
                println!("{err}");
                return;
            }
        };

        let routing = match self.map.routing_service() {
            Ok(routing) => routing,
            Err(err) => {
                println!("{err}");
                return;
            }
        };

        match routing.search(&waypoints).await {
            Ok(route) => print_route(&route),
            Err(err) => println!("路线规划失败: {err}"),
        }
    }

    async fn switch_map(&mut self, input: &str) {
        let kind = match MapProviderKind::parse(input) {
            Ok(kind) => kind,
            Err(err) => {
                println!("{err}");
                return;
            }
        };

        if self.map.current_provider() == Some(kind) {
            println!("Map provider {kind} is already active");
            return;
        }

        self.map.destroy();
        match self.map.init_map_service(kind).await {
            Ok(()) => println!("Switched map provider to {kind}"),
            Err(err) => println!("Could not switch map provider: {err}"),
        }
    }

    async fn handle(&mut self, line: &str) -> Result<bool> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(true);
        }

        if line == "/quit" || line == "/exit" {
            return Ok(false);
        } else if line == "/help" {
            println!("{HELP}");
        } else if line == "/new" {
            self.session_id = uuid::Uuid::new_v4().to_string();
            self.conversation.clear();
            println!("Started a new session: {}", self.session_id);
        } else if line == "/sessions" {
            match self
                .api
                .session_list(
                    1,
                    Config::get_u64(ConfigKey::PageSize, 10),
                    &Config::get(ConfigKey::UserId),
                )
                .await
            {
                Ok(sessions) => print_sessions(&sessions),
                Err(err) => println!("{err}"),
            }
        } else if line == "/history" {
            for message in self.conversation.messages() {
                print_message(message);
            }
        } else if let Some(rest) = line.strip_prefix("/route ") {
            self.route(rest).await;
        } else if let Some(rest) = line.strip_prefix("/map ") {
            self.switch_map(rest.trim()).await;
        } else if let Some(rest) = line.strip_prefix("/export ") {
            if let Err(err) = export_html(&self.conversation, rest.trim()).await {
                println!("{err}");
            }
        } else if line.starts_with('/') {
            println!("Unknown command, try /help");
        } else {
            self.chat_turn(line).await;
        }

        return Ok(true);
    }
}

pub async fn start() -> Result<()> {
    let mut repl = Repl::init().await;
    println!("wayfarer {} — type /help for commands", env!("CARGO_PKG_VERSION"));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}> ", Config::get(ConfigKey::Username));
        std::io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        if !repl.handle(&line).await? {
            break;
        }
    }

    repl.map.destroy();
    return Ok(());
}
