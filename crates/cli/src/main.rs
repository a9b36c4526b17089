//! # docfield: A CLI for `docfield-server`
//!
//! This is the main entry point for the `docfield` command-line interface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use docfield::{fields::parse_field_list, PageResult};
use docfield_cli::{
    api_client::{ApiClient, DocumentView},
    app::{App, InputMode},
    ui,
    view_state::{ConfidenceLevel, ViewState},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::File, io, path::PathBuf, time::Duration};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Base URL of the docfield server
    #[arg(long, global = true, env = "DOCFIELD_SERVER", default_value = "http://localhost:8000")]
    server: String,
    /// Request timeout in seconds. Uploads wait for every page to be extracted.
    #[arg(long, global = true, default_value_t = 300)]
    timeout: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a PDF and extract the given fields from every page
    Upload(UploadArgs),
    /// Print the stored results of a document
    Show(ShowArgs),
    /// Re-extract a single page with a new field list
    Reextract(ReextractArgs),
    /// Save the rendered image of a page as PNG
    Image(ImageArgs),
    /// Browse a document page by page in the terminal
    View(ShowArgs),
}

#[derive(Parser, Debug)]
struct UploadArgs {
    /// Path of the PDF to upload
    file: PathBuf,
    /// Comma-separated field names, e.g. "invoice_number, date, amount"
    #[arg(long, short)]
    fields: String,
    /// Open the viewer once the upload is processed
    #[arg(long)]
    view: bool,
}

#[derive(Parser, Debug)]
struct ShowArgs {
    doc_id: String,
}

#[derive(Parser, Debug)]
struct ReextractArgs {
    doc_id: String,
    page: u32,
    /// Comma-separated field names
    #[arg(long, short)]
    fields: String,
}

#[derive(Parser, Debug)]
struct ImageArgs {
    doc_id: String,
    page: u32,
    /// Output file. Defaults to `page-<n>.png`.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    // Parse first so `--help` and usage errors leave no log file behind.
    let cli = Cli::parse();

    // Setup logging to a file so the TUI stays clean.
    let log_file = File::create("docfield-cli.log")?;
    let subscriber = fmt::Subscriber::builder()
        .with_writer(log_file)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = ApiClient::new(&cli.server, Duration::from_secs(cli.timeout))?;
    info!("Using server at {}", client.base_url());

    let (action, result) = match cli.command {
        Commands::Upload(args) => ("Upload", handle_upload(&client, args).await),
        Commands::Show(args) => ("Show", handle_show(&client, args).await),
        Commands::Reextract(args) => ("Re-extract", handle_reextract(&client, args).await),
        Commands::Image(args) => ("Image", handle_image(&client, args).await),
        Commands::View(args) => ("View", handle_view(&client, args).await),
    };

    if let Err(e) = result {
        eprintln!("{action} failed: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

// --- Command Handlers ---

async fn handle_upload(client: &ApiClient, args: UploadArgs) -> Result<()> {
    let fields = parse_field_list(&args.fields)?;
    println!("Uploading '{}'...", args.file.display());
    let document = client.upload(&args.file, &fields).await?;
    print_document(&document);
    if args.view {
        run_viewer(client, document).await?;
    }
    Ok(())
}

async fn handle_show(client: &ApiClient, args: ShowArgs) -> Result<()> {
    let document = client.get_document(&args.doc_id).await?;
    print_document(&document);
    Ok(())
}

async fn handle_reextract(client: &ApiClient, args: ReextractArgs) -> Result<()> {
    let fields = parse_field_list(&args.fields)?;
    let page = client.reextract_page(&args.doc_id, args.page, &fields).await?;
    print_page(&page);
    Ok(())
}

async fn handle_image(client: &ApiClient, args: ImageArgs) -> Result<()> {
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("page-{}.png", args.page)));
    let size = client
        .download_page_image(&args.doc_id, args.page, &output)
        .await?;
    println!("✅ Saved page {} to '{}' ({size} bytes).", args.page, output.display());
    Ok(())
}

async fn handle_view(client: &ApiClient, args: ShowArgs) -> Result<()> {
    let document = client.get_document(&args.doc_id).await?;
    run_viewer(client, document).await
}

// --- Output ---

fn print_document(document: &DocumentView) {
    println!(
        "Document {} '{}': {} pages, {} ({} ms)",
        document.doc_id,
        document.filename,
        document.total_pages,
        document.processing_status,
        document.total_processing_time_ms
    );
    println!("Requested fields: {}", document.key_fields.join(", "));
    for page in &document.pages {
        print_page(page);
    }
}

fn print_page(page: &PageResult) {
    println!("\nPage {} ({} ms)", page.page_number, page.processing_time_ms);
    for name in &page.key_fields {
        match page.field(name) {
            Some(field) => println!(
                "  {:<24} {:<32} {:.2} ({})",
                name,
                field.value,
                field.confidence,
                ConfidenceLevel::from(field.confidence).label()
            ),
            None => println!("  {name:<24} not found"),
        }
    }
}

// --- TUI ---

async fn run_viewer(client: &ApiClient, document: DocumentView) -> Result<()> {
    let mut app = App::new(client.clone(), ViewState::new(document));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    while app.running {
        terminal.draw(|frame| ui::ui(frame, app))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                KeyCode::Right | KeyCode::Char('l') => app.next_page(),
                KeyCode::Left | KeyCode::Char('h') => app.prev_page(),
                KeyCode::Char('r') => app.start_reextract(),
                _ => {}
            },
            InputMode::Editing => match key.code {
                KeyCode::Enter => {
                    app.status = "Extracting...".to_string();
                    terminal.draw(|frame| ui::ui(frame, app))?;
                    app.submit_reextract().await;
                }
                KeyCode::Esc => app.cancel_input(),
                KeyCode::Backspace => {
                    app.input_text.pop();
                }
                KeyCode::Char(c) => app.input_text.push(c),
                _ => {}
            },
        }
    }
    Ok(())
}
