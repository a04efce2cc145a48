use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use quake_map::app::App;
use quake_map::config::MapConfig;
use quake_map::feed::{self, FeedUpdate};
use quake_map::map::Overlay;
use quake_map::{data, logging, ui};
use ratatui::DefaultTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::UnboundedReceiver;

fn main() -> Result<()> {
    // Config and logging come first so errors still reach a normal terminal
    let config = Arc::new(MapConfig::load()?);
    let _log_guard = logging::init(&config)?;
    tracing::info!(events = %config.event_feed, plates = %config.plate_feed, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &runtime, config);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

/// Build a fresh app: basemap, credential check, then both feed fetches
fn start(
    terminal: &DefaultTerminal,
    runtime: &Runtime,
    config: &Arc<MapConfig>,
) -> Result<(App, UnboundedReceiver<FeedUpdate>)> {
    let size = terminal.size()?;
    let mut app = App::new(Arc::clone(config), size.width as usize, size.height as usize);

    if config.data_dir.exists() {
        data::load_basemap(&mut app.map_renderer, &config.data_dir);
    }
    // Fall back to simple world if no data loaded
    if !app.map_renderer.has_data() {
        data::generate_simple_world(&mut app.map_renderer);
    }

    app.check_credential();

    let client = feed::build_client(config)?;
    let updates = feed::spawn_fetches(runtime.handle(), client, Arc::clone(config));
    Ok((app, updates))
}

/// Handle mouse events for panning, zooming and marker selection
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Press, then either drag to pan or release in place to select
        MouseEventKind::Down(MouseButton::Left) => app.begin_press(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_press(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, runtime: &Runtime, config: Arc<MapConfig>) -> Result<()> {
    let (mut app, mut updates) = start(terminal, runtime, &config)?;

    loop {
        // Apply whatever fetches finished since the last frame
        while let Ok(update) = updates.try_recv() {
            app.apply_update(update);
        }

        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Esc => app.escape(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    // Zoom
                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    // Layer control
                    KeyCode::Char(c @ '1'..='7') => {
                        if let Some(overlay) = Overlay::from_digit(c) {
                            app.toggle_overlay(overlay);
                        }
                    }
                    KeyCode::Char('t') => app.toggle_overlay(Overlay::TectonicPlates),
                    KeyCode::Char('b') => app.cycle_base_layer(),
                    KeyCode::Char('o') => app.toggle_layer_control(),
                    KeyCode::Char('g') => app.toggle_legend(),

                    // Reset view and refetch; a stale fetch sends into a dropped receiver
                    KeyCode::Char('r') | KeyCode::Char('0') => {
                        tracing::info!("reset requested");
                        (app, updates) = start(terminal, runtime, &config)?;
                    }

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
