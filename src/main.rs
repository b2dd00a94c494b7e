use newsdesk::app::App;
use newsdesk::config::Config;
use newsdesk::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Load configuration
    let config = Config::load()?;

    let app = App::new(&config).await?;

    let result = match args.get(1).map(String::as_str) {
        Some("headlines") => app.news(None).await,
        Some("search") => {
            let query = args[2..].join(" ");
            if query.trim().is_empty() {
                usage();
                return Ok(());
            }
            app.news(Some(query)).await
        }
        Some("show") => match args.get(2) {
            Some(url) => app.show(url).await,
            None => {
                usage();
                return Ok(());
            }
        },
        Some("save") => match args.get(2) {
            Some(url) => app.save(url).await,
            None => {
                usage();
                return Ok(());
            }
        },
        Some("delete") => match args.get(2) {
            Some(url) => app.delete(url).await,
            None => {
                usage();
                return Ok(());
            }
        },
        Some("saved") => {
            let watch = args.iter().any(|a| a == "--watch");
            app.saved(watch).await
        }
        Some("check") => match args.get(2) {
            Some(url) => app.check(url).await,
            None => {
                usage();
                return Ok(());
            }
        },
        Some("export") => app.export().await,
        _ => {
            usage();
            return Ok(());
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn usage() {
    eprintln!("Usage: newsdesk <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  headlines          Fetch top headlines");
    eprintln!("  search <query>     Search articles");
    eprintln!("  show <url>         Show details for one article");
    eprintln!("  save <url>         Save an article locally");
    eprintln!("  delete <url>       Delete a saved article");
    eprintln!("  saved [--watch]    List saved articles (optionally follow changes)");
    eprintln!("  check <url>        Check whether an article is saved");
    eprintln!("  export             Print saved articles as JSON");
}
