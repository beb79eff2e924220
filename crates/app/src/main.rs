use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use services::game::{PageRequest, PlaySession};
use services::reference::{default_source_language, filter_topics, target_languages_for};
use services::{ApiConfig, AppServices, Clock, SubmitError, TopicFilter};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;
use vocab_core::model::{
    LanguageId, LevelId, LoginDraft, OptionLabel, RegisterDraft, SearchQuery, SessionConfigDraft,
    SessionId, TopicId, WordId,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument(&'static str),
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument(what) => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id<T: FromStr>(flag: &'static str, raw: &str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId {
        flag,
        raw: raw.to_string(),
    })
}

fn parse_id_list<T: FromStr>(flag: &'static str, raw: &str) -> Result<Vec<T>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_id(flag, part))
        .collect()
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  vocab login <email-or-username> <password>");
    eprintln!(
        "  vocab register [--email <email>] [--username <name>] --password <pw> [--display-name <name>]"
    );
    eprintln!("  vocab logout | whoami");
    eprintln!("  vocab languages [--source <id>]");
    eprintln!("  vocab topics [--search <text>]");
    eprintln!("  vocab levels [--language <id>]");
    eprintln!("  vocab search <text> --language <id> [--limit <n>] [--offset <n>]");
    eprintln!("  vocab word <id>");
    eprintln!("  vocab play [--source <id>] --target <id> (--level <id> [--topics 1,2] | --topic <id>)");
    eprintln!("  vocab stats <session-id>");
    eprintln!("  vocab history [--page <n>] [--page-size <n>]");
    eprintln!();
    eprintln!("Every command accepts --db <sqlite_url> (default sqlite://vocab.sqlite3).");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  VOCAB_API_BASE_URL, VOCAB_API_TIMEOUT_MS, VOCAB_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Login,
    Register,
    Logout,
    Whoami,
    Languages,
    Topics,
    Levels,
    Search,
    Word,
    Play,
    Stats,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "login" => Some(Self::Login),
            "register" => Some(Self::Register),
            "logout" => Some(Self::Logout),
            "whoami" => Some(Self::Whoami),
            "languages" => Some(Self::Languages),
            "topics" => Some(Self::Topics),
            "levels" => Some(Self::Levels),
            "search" => Some(Self::Search),
            "word" => Some(Self::Word),
            "play" => Some(Self::Play),
            "stats" => Some(Self::Stats),
            "history" => Some(Self::History),
            _ => None,
        }
    }
}

/// Flags and positionals shared by every command.
#[derive(Debug, Default)]
struct Args {
    db_url: String,
    positionals: Vec<String>,
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    display_name: Option<String>,
    search: Option<String>,
    language: Option<LanguageId>,
    source: Option<LanguageId>,
    target: Option<LanguageId>,
    level: Option<LevelId>,
    topic: Option<TopicId>,
    topics: Vec<TopicId>,
    limit: Option<u32>,
    offset: Option<u32>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("VOCAB_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://vocab.sqlite3".into(), normalize_sqlite_url),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--username" => parsed.username = Some(require_value(args, "--username")?),
                "--password" => parsed.password = Some(require_value(args, "--password")?),
                "--display-name" => {
                    parsed.display_name = Some(require_value(args, "--display-name")?);
                }
                "--search" => parsed.search = Some(require_value(args, "--search")?),
                "--language" => {
                    parsed.language = Some(parse_id("--language", &require_value(args, "--language")?)?);
                }
                "--source" => {
                    parsed.source = Some(parse_id("--source", &require_value(args, "--source")?)?);
                }
                "--target" => {
                    parsed.target = Some(parse_id("--target", &require_value(args, "--target")?)?);
                }
                "--level" => {
                    parsed.level = Some(parse_id("--level", &require_value(args, "--level")?)?);
                }
                "--topic" => {
                    parsed.topic = Some(parse_id("--topic", &require_value(args, "--topic")?)?);
                }
                "--topics" => {
                    parsed.topics = parse_id_list("--topics", &require_value(args, "--topics")?)?;
                }
                "--limit" => {
                    parsed.limit = Some(parse_id("--limit", &require_value(args, "--limit")?)?);
                }
                "--offset" => {
                    parsed.offset = Some(parse_id("--offset", &require_value(args, "--offset")?)?);
                }
                "--page" => {
                    parsed.page = Some(parse_id("--page", &require_value(args, "--page")?)?);
                }
                "--page-size" => {
                    parsed.page_size =
                        Some(parse_id("--page-size", &require_value(args, "--page-size")?)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => parsed.positionals.push(arg),
            }
        }

        Ok(parsed)
    }

    fn positional(&self, index: usize, what: &'static str) -> Result<&str, ArgsError> {
        self.positionals
            .get(index)
            .map(String::as_str)
            .ok_or(ArgsError::MissingArgument(what))
    }

    /// Game configuration from `--level`/`--topic`; the source falls back to
    /// `default_source` when `--source` is absent.
    fn session_draft(&self, default_source: Option<LanguageId>) -> Result<SessionConfigDraft, ArgsError> {
        let source = self
            .source
            .or(default_source)
            .ok_or(ArgsError::MissingArgument("--source"))?;
        let target = self.target.ok_or(ArgsError::MissingArgument("--target"))?;
        match (self.level, self.topic) {
            (Some(level), None) => Ok(SessionConfigDraft::level(source, target, level)
                .with_topics(self.topics.iter().copied())),
            (None, Some(topic)) => Ok(SessionConfigDraft::topic(source, target, topic)),
            // Both or neither: let validation report the mode problem.
            (level, topic) => Ok(SessionConfigDraft {
                source_language_id: Some(source),
                target_language_id: Some(target),
                mode: None,
                topic_id: topic,
                level_id: level,
                topic_ids: self.topics.clone(),
            }),
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h" | "help") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    // The auth session lives in SQLite; the API location comes from the environment.
    let config = ApiConfig::from_env()?;
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    let app = AppServices::connect(&config, storage, Clock::system()).await?;

    match cmd {
        Command::Login => {
            let identifier = parsed.positional(0, "<email-or-username>")?;
            let password = parsed.positional(1, "<password>")?;
            let user = app.auth().login(&LoginDraft::new(identifier, password)).await?;
            println!("signed in as {}", user.handle());
        }
        Command::Register => {
            let password = parsed
                .password
                .clone()
                .ok_or(ArgsError::MissingArgument("--password"))?;
            let draft = RegisterDraft {
                display_name: parsed.display_name.clone(),
                email: parsed.email.clone(),
                username: parsed.username.clone(),
                confirm_password: password.clone(),
                password,
            };
            let registered = app.auth().register(&draft).await?;
            println!("registered user {}", registered.user_id);
        }
        Command::Logout => {
            app.auth().logout().await?;
            println!("signed out");
        }
        Command::Whoami => match app.session().current_user() {
            Some(user) => {
                let profile = app.auth().profile().await?;
                let display = profile.display_name.unwrap_or_else(|| user.handle());
                println!("{display} (user {})", user.id);
            }
            None => println!("not signed in"),
        },
        Command::Languages => {
            let languages = app.reference().languages().await?;
            let listed = match parsed.source {
                Some(source) => target_languages_for(&languages, source),
                None => languages.iter().collect(),
            };
            let default = default_source_language(&languages).map(|language| language.id);
            for language in listed {
                let marker = if Some(language.id) == default { "*" } else { " " };
                println!("{marker}{:>4}  {:<6} {}", language.id, language.code, language.name);
            }
        }
        Command::Topics => {
            let topics = app.reference().topics().await?;
            let search = parsed.search.as_deref().unwrap_or("");
            for topic in filter_topics(&topics, search, TopicFilter::All, &BTreeSet::new()) {
                println!("{:>4}  {}", topic.id, topic.name);
            }
        }
        Command::Levels => {
            for level in app.reference().levels(parsed.language).await? {
                println!("{:>4}  {:<4} {}", level.id, level.code, level.name);
            }
        }
        Command::Search => {
            let text = parsed.positional(0, "<text>")?;
            let language = parsed
                .language
                .ok_or(ArgsError::MissingArgument("--language"))?;
            let mut query = SearchQuery::new(text, language)?;
            if parsed.limit.is_some() || parsed.offset.is_some() {
                let limit = parsed.limit.unwrap_or(query.limit());
                query = query.with_page(limit, parsed.offset.unwrap_or(0));
            }
            let results = app.dictionary().search(&query).await?;
            println!("{} match(es)", results.total);
            for word in &results.words {
                println!("{:>6}  {}", word.id, word.lemma);
            }
        }
        Command::Word => {
            let id: WordId = parse_id("<id>", parsed.positional(0, "<id>")?)?;
            let detail = app.dictionary().word_detail(id).await?;
            println!("{}", detail.word.lemma);
            for pronunciation in &detail.pronunciations {
                if let Some(ipa) = &pronunciation.ipa {
                    println!("  /{ipa}/");
                }
            }
            for sense in &detail.senses {
                println!("  {}. {}", sense.sense_order, sense.definition);
                let translations: Vec<&str> = sense
                    .translations
                    .iter()
                    .map(|word| word.lemma.as_str())
                    .collect();
                if !translations.is_empty() {
                    println!("     = {}", translations.join(", "));
                }
            }
        }
        Command::Play => {
            let default_source = if parsed.source.is_none() {
                let languages = app.reference().languages().await?;
                default_source_language(&languages).map(|language| language.id)
            } else {
                None
            };
            let draft = parsed.session_draft(default_source)?;
            play(&app, &draft).await?;
        }
        Command::Stats => {
            let id: SessionId = parse_id("<session-id>", parsed.positional(0, "<session-id>")?)?;
            let stats = app.games().statistics_for(id).await?;
            println!(
                "session {}: {}/{} correct ({:.0}%)",
                stats.session_id, stats.correct_answers, stats.total_questions, stats.accuracy
            );
            if let Some(average) = stats.average_response_time_ms {
                println!("average response {average:.0}ms");
            }
        }
        Command::History => {
            let defaults = PageRequest::default();
            let page = PageRequest::new(
                parsed.page.unwrap_or(defaults.page()),
                parsed.page_size.unwrap_or(defaults.page_size()),
            );
            let sessions = app.games().history(page).await?;
            for session in &sessions.data {
                println!(
                    "{:>6}  {:<5} {}/{}  {}",
                    session.id,
                    session.mode.as_str(),
                    session.correct_questions,
                    session.total_questions,
                    session.started_at.format("%Y-%m-%d %H:%M")
                );
            }
            println!(
                "page {} of {}",
                sessions.pagination.page,
                sessions.pagination.total_pages.max(1)
            );
        }
    }

    Ok(())
}

async fn play(app: &AppServices, draft: &SessionConfigDraft) -> Result<(), Box<dyn std::error::Error>> {
    let games = app.games();
    let mut session = games.create(draft).await?;
    println!(
        "session {} with {} question(s)",
        session.session_id(),
        session.questions().len()
    );
    session.begin(games.clock().now())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while !session.is_complete() {
        print_question(&session);
        let Some(line) = read_line(&mut lines).await? else {
            println!("input closed; session {} left unfinished", session.session_id());
            return Ok(());
        };
        let Some(label) = OptionLabel::parse(&line) else {
            println!("choose one of A, B, C or D");
            continue;
        };
        let Some(option_id) = session
            .current_question()
            .and_then(|question| question.option_by_label(label))
            .map(|option| option.id)
        else {
            println!("option {label} is not available");
            continue;
        };

        match games.submit(&mut session, option_id).await {
            Ok(outcome) => {
                println!(
                    "{} ({}ms)",
                    if outcome.answer.is_correct { "correct" } else { "incorrect" },
                    outcome.answer.response_time_ms.unwrap_or_default()
                );
                games.advance_after_feedback(&mut session).await?;
            }
            Err(err @ SubmitError::Diverged { .. }) => {
                println!("{}", err.user_message());
                return Err(err.into());
            }
            // The question stays open; the player may try again.
            Err(err) => println!("{}", err.user_message()),
        }
    }

    let summary = session.summary()?;
    println!();
    println!(
        "{}/{} correct ({}%)",
        summary.correct, summary.total, summary.accuracy_percent
    );
    if let Some(average) = summary.average_response_time_ms {
        println!("average response {average:.0}ms");
    }
    match games.statistics(&session).await {
        Ok(stats) => println!("server accuracy {:.0}%", stats.accuracy),
        Err(err) => tracing::warn!(error = %err, "statistics unavailable"),
    }
    Ok(())
}

fn print_question(session: &PlaySession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let progress = session.progress();
    println!();
    println!(
        "[{}/{}] {}",
        progress.current_index + 1,
        progress.total,
        question.source_word_text
    );
    for option in &question.options {
        println!("  {}) {}", option.label, option.word_text);
    }
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> std::io::Result<Option<String>> {
    use std::io::Write;
    print!("> ");
    std::io::stdout().flush()?;
    lines.next_line().await
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
