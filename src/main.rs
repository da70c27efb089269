use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use conflict_atlas::app::App;
use conflict_atlas::config::AtlasConfig;
use conflict_atlas::data;
use conflict_atlas::map::{MapRenderer, Projection};
use conflict_atlas::pipeline::{write_outputs, ArticleContext, Pipeline};
use conflict_atlas::ui;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conflict-atlas")]
#[command(version, about = "Tile-aligned basemaps and conflict charts rendered to SVG", long_about = None)]
struct Cli {
    /// JSON config file; unset fields keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every chart to SVG files
    Render {
        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Explore the basemap in the terminal
    Preview,
}

fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AtlasConfig> {
    match path {
        Some(path) => AtlasConfig::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(AtlasConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Render { out } => {
            setup_logging(cli.verbose);
            render(config, out)
        }
        // No stderr subscriber: log lines would tear the raw-mode screen
        Commands::Preview => preview(config),
    }
}

fn render(mut config: AtlasConfig, out: Option<PathBuf>) -> Result<()> {
    if let Some(out) = out {
        config.output_dir = out;
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting runtime")?;

    runtime.block_on(async {
        let mut ctx = ArticleContext::new(config);
        let run = Pipeline::article().run(&mut ctx).await;
        write_outputs(&ctx.config.output_dir, &run.outputs)
            .await
            .context("writing charts")?;
        info!(
            charts = run.outputs.len(),
            failed_stages = run.failed().count(),
            dir = %ctx.config.output_dir.display(),
            "article rendered"
        );
        Ok(())
    })
}

fn preview(config: AtlasConfig) -> Result<()> {
    let regions = data::read_boundaries(&config.datasets.boundaries, &config.name_property)
        .with_context(|| format!("loading boundaries {}", config.datasets.boundaries.display()))?;
    let projection = Projection::fit(&regions, config.viewport)?;
    let renderer = MapRenderer::new(regions, &config.tiles);

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut app = App::new(
        renderer,
        projection,
        config.viewport,
        size.width as usize,
        size.height as usize,
    );
    let result = run(&mut terminal, &mut app);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Hover, pan and zoom with the mouse
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => app.pan(15, 0),
        MouseEventKind::ScrollRight => app.pan(-15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(-10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, 6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, -6),

                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_regions(),
                    KeyCode::Char('t') | KeyCode::Char('T') => app.map_renderer.toggle_tiles(),

                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset(),
                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
