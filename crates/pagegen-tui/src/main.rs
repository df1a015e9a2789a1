use anyhow::{bail, Context, Result};
use clap::Parser;
use pagegen_core::config::{self, Config, Settings};
use pagegen_core::{Category, GenerationState, GeneratorView, OpenRouterClient};

mod app;
mod clipboard;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use clipboard::SystemClipboard;
use logging::LogTarget;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "pagegen", version)]
#[command(about = "Turn a product idea into a Tailwind landing page with an LLM")]
struct Cli {
    /// Product idea (pre-fills the form, or is generated directly with --print)
    #[arg(short, long)]
    idea: Option<String>,

    /// Product category: "AI SaaS", "Productivity Tool" or "Startup"
    #[arg(short, long, value_parser = parse_category)]
    category: Option<Category>,

    /// Generate once and print the markup to stdout instead of opening the TUI
    #[arg(short, long)]
    print: bool,

    /// Override the completion model
    #[arg(long)]
    model: Option<String>,

    /// Override the API base URL (e.g. a local proxy)
    #[arg(long)]
    base_url: Option<String>,

    /// Persist --model and --base-url to the config file and exit
    #[arg(long, conflicts_with = "print")]
    save_config: bool,
}

impl Cli {
    /// `config` with this invocation's overrides folded in.
    fn overridden(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = Some(base_url.clone());
        }
        config
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::from_label(s).ok_or_else(|| {
        let options: Vec<&str> = Category::all().iter().map(|c| c.label()).collect();
        format!("unknown category '{}', expected one of: {}", s, options.join(", "))
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_file = config::load_env_file();
    let log_path = logging::init(if cli.print || cli.save_config { LogTarget::Stderr } else { LogTarget::File });
    if let Some(path) = env_file {
        log::info!("loaded environment from {}", path.display());
    }
    if let Some(path) = log_path {
        log::info!("logging to {}", path.display());
    }

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("ignoring unreadable config: {:#}", e);
        Config::new()
    });

    if cli.save_config {
        let path = cli.overridden(&config).save().context("saving config")?;
        println!("Saved config to {}", path.display());
        return Ok(());
    }

    let mut settings = Settings::resolve(&config);
    if let Some(model) = cli.model.clone() {
        settings.model = model;
    }
    if let Some(base_url) = cli.base_url.clone() {
        settings.base_url = base_url;
    }
    log::debug!("resolved {:?}", settings);

    let key_source = settings.key_source(&config);
    let client = OpenRouterClient::new(settings).context("building HTTP client")?;

    let idea = cli.idea.unwrap_or_default();
    let category = cli.category.unwrap_or_default();

    if cli.print {
        return generate_once(&client, idea, category).await;
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(client, key_source, Box::new(SystemClipboard), events.sender());
    app.set_idea(idea);
    app.set_category(category);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn generate_once(client: &OpenRouterClient, idea: String, category: Category) -> Result<()> {
    let mut view = GeneratorView::new();
    view.set_idea(idea);
    view.set_category(category);

    match view.generate(client).await {
        GenerationState::Completed(markup) => {
            println!("{}", markup);
            Ok(())
        }
        GenerationState::Failed(reason) => bail!("generation failed: {}", reason),
        other => bail!("generation ended in unexpected state {:?}", other),
    }
}
