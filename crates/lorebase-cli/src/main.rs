use std::io::{self, Write};

use clap::{Parser, Subcommand};
use colored::Colorize;

use lorebase_client::{
    Credentials, DirectSubmission, LorebaseClient, Role, Session, UrlSubmission,
};

#[derive(Parser)]
#[command(name = "lorebase")]
#[command(about = "Terminal client for a Lorebase backend")]
#[command(version)]
struct Cli {
    #[arg(long, default_value = "http://localhost:8080", env = "LOREBASE_SERVER_URL")]
    server_url: String,

    /// Fixed access token (fake login); bypasses the auth provider.
    #[arg(long, env = "LOREBASE_ACCESS_TOKEN")]
    access_token: Option<String>,

    /// Refresh token from a previous interactive login.
    #[arg(long, env = "LOREBASE_REFRESH_TOKEN")]
    refresh_token: Option<String>,

    /// Enable debug mode
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive chat
    Chat,
    /// Send a single message
    Send {
        /// Message content
        message: String,
    },
    /// Add text directly to the knowledge base
    Add {
        title: String,
        content: String,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Queue a URL (optionally a whole site) for ingestion
    AddUrl {
        url: String,
        title: String,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Crawl the entire site instead of the single page
        #[arg(long)]
        crawl_site: bool,
        #[arg(long, default_value_t = 3)]
        crawl_depth: u32,
    },
    /// Show the current session state
    Whoami,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.debug {
        eprintln!("{}", "[DEBUG] Debug mode enabled".dimmed());
        eprintln!(
            "{}",
            format!("[DEBUG] Server URL: {}", cli.server_url).dimmed()
        );
    }

    let client = LorebaseClient::connect(
        &cli.server_url,
        Credentials {
            refresh_token: cli.refresh_token.clone(),
            access_token: cli.access_token.clone(),
        },
    )
    .await?;

    let session = client.session();
    if cli.debug {
        eprintln!(
            "{}",
            format!(
                "[DEBUG] Session: authenticated={}, admin={}",
                session.is_authenticated, session.is_admin
            )
            .dimmed()
        );
    }
    if !session.is_authenticated && !matches!(cli.command, Commands::Whoami) {
        println!(
            "{}",
            "⚠ Not authenticated; the server will reject requests.".yellow()
        );
    }

    match cli.command {
        Commands::Chat => run_interactive_chat(&client).await,
        Commands::Send { message } => stream_message(&client, &message).await,
        Commands::Add {
            title,
            content,
            tags,
        } => add_direct(&client, title, content, tags).await,
        Commands::AddUrl {
            url,
            title,
            tags,
            crawl_site,
            crawl_depth,
        } => add_url(&client, url, title, tags, crawl_site, crawl_depth).await,
        Commands::Whoami => {
            print_session(&client.session());
            Ok(())
        }
    }
}

async fn stream_message(client: &LorebaseClient, message: &str) -> anyhow::Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(32);

    let printer = tokio::spawn(async move {
        while let Some(fragment) = rx.recv().await {
            print!("{}", fragment.green());
            let _ = io::stdout().flush();
        }
    });

    let result = client.chat().send_message_watched(message, Some(&tx)).await;
    drop(tx);
    let _ = printer.await;

    match result {
        Ok(Some(_)) => {
            println!();
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            println!("{}", format!("❌ Error: {err}").red());
            Ok(())
        }
    }
}

async fn run_interactive_chat(client: &LorebaseClient) -> anyhow::Result<()> {
    println!("{}", "🔎 Lorebase Interactive Chat".cyan().bold());
    println!("{}", "Type 'exit' or 'quit' to leave".dimmed());
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }

        if input.is_empty() {
            continue;
        }

        println!("{}", "Assistant:".green().bold());
        stream_message(client, input).await?;
        println!();
    }

    // Leave a compact transcript summary behind for scrollback.
    let errors = client
        .chat()
        .conversation()
        .iter()
        .filter(|m| m.role == Role::Error)
        .count();
    if errors > 0 {
        println!(
            "{}",
            format!("{errors} message(s) failed this session").dimmed()
        );
    }

    Ok(())
}

async fn add_direct(
    client: &LorebaseClient,
    title: String,
    content: String,
    tags: Vec<String>,
) -> anyhow::Result<()> {
    let submission = DirectSubmission::new(title, content).with_tags(tags);
    match client.knowledge().add_direct(&submission).await {
        Ok(receipt) => {
            println!("{}", format!("✅ {}", receipt.message).green());
            if let Some(chunks) = receipt.chunks {
                println!("{}", format!("   Stored as {chunks} chunk(s)").dimmed());
            }
        }
        Err(err) => println!("{}", format!("❌ Error: {err}").red()),
    }
    Ok(())
}

async fn add_url(
    client: &LorebaseClient,
    url: String,
    title: String,
    tags: Vec<String>,
    crawl_site: bool,
    crawl_depth: u32,
) -> anyhow::Result<()> {
    if !client.session().is_admin {
        // Client-side hint only; the server makes the actual call.
        println!(
            "{}",
            "⚠ URL ingestion is an admin affordance; the server may reject this.".yellow()
        );
    }

    let mut submission = UrlSubmission::new(url, title).with_tags(tags);
    if crawl_site {
        submission = submission.crawl_site(crawl_depth);
    }

    match client.knowledge().add_from_url(&submission).await {
        Ok(receipt) => println!("{}", format!("✅ {}", receipt.message).green()),
        Err(err) => println!("{}", format!("❌ Error: {err}").red()),
    }
    Ok(())
}

fn print_session(session: &Session) {
    println!(
        "authenticated: {}",
        if session.is_authenticated {
            "yes".green()
        } else {
            "no".red()
        }
    );
    println!(
        "admin:         {}",
        if session.is_admin {
            "yes".green()
        } else {
            "no".normal()
        }
    );
    match session
        .expires_at
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
    {
        Some(expiry) => println!("expires:       {}", expiry.to_rfc3339().normal()),
        None => println!("expires:       {}", "unknown".dimmed()),
    }
}
