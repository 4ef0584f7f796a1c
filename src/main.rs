use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use env_logger::{Env, Target};
use placemap::app::App;
use placemap::config::Config;
use placemap::controls::{ControlId, Subscriptions};
use placemap::data::Source;
use placemap::map::{Basemap, LatLng, TerminalMap};
use placemap::rain::MatrixRain;
use placemap::ui;
use placemap::view;
use ratatui::layout::{Position, Rect};
use ratatui::DefaultTerminal;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "placemap")]
#[command(version)]
#[command(about = "Browse a list of places on a terminal map", long_about = None)]
struct Cli {
    /// Place document: a file path or an http(s) URL
    source: Option<String>,

    /// Config file (default: <config dir>/placemap/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Initial map center as LAT,LNG
    #[arg(long, value_parser = parse_center, allow_hyphen_values = true)]
    center: Option<LatLng>,

    /// Initial zoom level
    #[arg(short, long)]
    zoom: Option<f64>,

    /// GeoJSON file drawn under the markers
    #[arg(short, long)]
    basemap: Option<PathBuf>,

    /// Disable the background animation
    #[arg(long)]
    no_rain: bool,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Hold a successful load back this many milliseconds
    #[arg(long)]
    min_latency_ms: Option<u64>,
}

fn parse_center(s: &str) -> Result<LatLng, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got {s:?}"))?;
    let lat: f64 = lat.trim().parse().map_err(|e| format!("latitude: {e}"))?;
    let lng: f64 = lng.trim().parse().map_err(|e| format!("longitude: {e}"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("{lat},{lng} is out of range"));
    }
    Ok(LatLng::new(lat, lng))
}

impl Cli {
    /// Command line flags win over the config file
    fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(center) = self.center {
            config.map.center = [center.lat, center.lng];
        }
        if let Some(zoom) = self.zoom {
            config.map.zoom = zoom;
        }
        if let Some(basemap) = &self.basemap {
            config.map.basemap = Some(basemap.clone());
        }
        if self.no_rain {
            config.rain.enabled = false;
        }
        if let Some(file) = &self.log_file {
            config.log.file = Some(file.clone());
        }
        if let Some(ms) = self.min_latency_ms {
            config.loader.min_latency_ms = ms;
        }
    }
}

/// stdout belongs to the terminal UI, so logs go to a file
fn init_logging(config: &Config) {
    let path = config.log_path();
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(&path));

    match file {
        Ok(file) => env_logger::Builder::from_env(
            Env::default().default_filter_or(config.log.level.as_str()),
        )
        .target(Target::Pipe(Box::new(file)))
        .init(),
        Err(e) => eprintln!("Warning: logging disabled, cannot open {}: {}", path.display(), e),
    }
}

fn load_basemap(config: &Config) -> Basemap {
    match &config.map.basemap {
        Some(path) => Basemap::load(path).unwrap_or_else(|e| {
            log::warn!("Basemap {} unavailable, using outline: {e:#}", path.display());
            Basemap::fallback()
        }),
        None => Basemap::fallback(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("loading config")?;
    cli.apply(&mut config);

    init_logging(&config);
    log::info!("placemap {} starting", env!("CARGO_PKG_VERSION"));
    let basemap = load_basemap(&config);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config, basemap);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        log::error!("exiting with error: {e:#}");
    }
    result
}

/// What the event loop needs to restart a load
struct Reload {
    source: Source,
    min_latency: Duration,
}

fn handle_key(app: &mut App, subs: &Subscriptions<TerminalMap>, reload: &Reload, key: KeyEvent) {
    app.status = None;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Filters
        KeyCode::Char('t') => subs.cycle(app, ControlId::Category, true),
        KeyCode::Char('T') => subs.cycle(app, ControlId::Category, false),
        KeyCode::Char('m') => subs.cycle(app, ControlId::MinRating, true),
        KeyCode::Char('M') => subs.cycle(app, ControlId::MinRating, false),

        // List
        KeyCode::Up => app.select_prev(),
        KeyCode::Down => app.select_next(),
        KeyCode::Enter => app.select_card(app.selected),
        KeyCode::Char('o') => app.open_selected_website(),
        KeyCode::Char('p') => app.map.close_popup(),
        KeyCode::Char('R') => {
            if !app.is_loading() {
                app.begin_load(reload.source.clone(), reload.min_latency);
            }
        }

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.map.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.map.pan(10, 0),
        KeyCode::Char('k') => app.map.pan(0, -6),
        KeyCode::Char('j') => app.map.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.map.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.map.zoom_out(),

        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

/// Clicks on cards and markers, drag to pan, wheel to zoom or scroll
fn handle_mouse(app: &mut App, mouse: MouseEvent, screen: Rect) {
    let panes = ui::layout(screen);
    let map = ui::inner(panes.map);
    let list = ui::inner(panes.list);
    let at = Position::new(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp if map.contains(at) => {
            app.map.zoom_in_at(mouse.column - map.x, mouse.row - map.y);
        }
        MouseEventKind::ScrollDown if map.contains(at) => {
            app.map.zoom_out_at(mouse.column - map.x, mouse.row - map.y);
        }
        MouseEventKind::ScrollUp if list.contains(at) => app.select_prev(),
        MouseEventKind::ScrollDown if list.contains(at) => app.select_next(),
        MouseEventKind::Down(MouseButton::Left) if list.contains(at) => {
            let scroll = ui::list_offset(view::list_scroll(
                app.cards(),
                app.selected,
                list.height as usize,
            )) as usize;
            let row = (mouse.row - list.y) as usize;
            if let Some(action) = view::hit_test(app.cards(), scroll, row) {
                app.status = None;
                app.activate(action);
            }
        }
        MouseEventKind::Down(MouseButton::Left) if map.contains(at) => {
            match app.map.marker_at(mouse.column - map.x, mouse.row - map.y) {
                Some(index) => app.show_marker(index),
                None => app.last_mouse = Some((mouse.column, mouse.row)),
            }
        }
        MouseEventKind::Drag(MouseButton::Left) if app.last_mouse.is_some() => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &Config, basemap: Basemap) -> Result<()> {
    let size = terminal.size()?;
    let map_pane = ui::inner(ui::layout(Rect::new(0, 0, size.width, size.height)).map);
    let map = TerminalMap::new(map_pane.width, map_pane.height, basemap)
        .with_fit_padding(config.map.fit_padding);
    let center = LatLng::new(config.map.center[0], config.map.center[1]);

    let mut app = App::new(map, center, config.map.zoom);
    if config.rain.enabled {
        app = app.with_rain(MatrixRain::new(
            size.width,
            size.height,
            Duration::from_millis(config.rain.tick_ms),
            config.rain.seed,
        ));
    }

    let subs = Subscriptions::setup();
    let reload = Reload {
        source: Source::parse(&config.source),
        min_latency: Duration::from_millis(config.loader.min_latency_ms),
    };
    app.begin_load(reload.source.clone(), reload.min_latency);

    // Main loop
    while !app.should_quit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, &subs, &reload, key);
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    handle_mouse(&mut app, mouse, Rect::new(0, 0, size.width, size.height));
                }
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        app.poll_load();
        app.tick(Instant::now());
    }

    log::info!("shutting down");
    Ok(())
}
