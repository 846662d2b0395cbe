// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based camera frontend
//!
//! Renders the session view to the terminal using Unicode half-block
//! characters for improved vertical resolution. Keys map onto session
//! actions; the controller decides whether they are allowed.

use crate::backends::camera::{self, CameraFrame};
use crate::config::Config;
use crate::constants::timing;
use crate::media::PhotoLibrary;
use crate::permissions;
use crate::session::{Action, CaptureSessionController, Notice, NoticeKind, SessionView};
use crate::storage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Run the terminal camera frontend
pub fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = rt.block_on(run_app(&mut terminal, config));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Session(Action),
    OpenLibrary,
    ToggleHelp,
    Dismiss,
    Quit,
}

fn key_command(key: KeyEvent) -> Option<Command> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }
    let command = match key.code {
        KeyCode::Char(' ') | KeyCode::Char('p') => Command::Session(Action::Capture),
        KeyCode::Char('r') => Command::Session(Action::Retake),
        KeyCode::Char('s') => Command::Session(Action::Save),
        KeyCode::Char('f') => Command::Session(Action::ToggleFacing),
        KeyCode::Char('l') => Command::Session(Action::ToggleFlash),
        KeyCode::Char('g') => Command::OpenLibrary,
        KeyCode::Char('h') => Command::ToggleHelp,
        KeyCode::Enter | KeyCode::Esc => Command::Dismiss,
        KeyCode::Char('q') => Command::Quit,
        _ => return None,
    };
    Some(command)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let library_dir = storage::photo_directory(&config);
    let device = camera::open_camera(&config);
    info!(backend = %device.backend_type(), library = %library_dir.display(), "Starting session");

    let mut session = CaptureSessionController::new(
        permissions::gateway_for(&config),
        device,
        Arc::new(PhotoLibrary::new(library_dir.clone())),
    )
    .with_quality(camera::CaptureQuality::new(config.capture_quality));

    let mut frame_widget = FrameWidget::new();
    let mut show_help = false;
    let mut status_override: Option<String> = None;

    // Show the pending screen while the permission prompts are out
    draw(terminal, &session, &frame_widget, show_help, None)?;
    if let Err(e) = session.initialize().await {
        warn!(error = %e, "Session did not start");
    }

    loop {
        match session.view() {
            SessionView::LivePreview { .. } => {
                if let Some(frame) = session.preview_frame() {
                    frame_widget.update_frame(frame);
                }
            }
            SessionView::CapturedPreview { image, .. } => {
                frame_widget.update_frame(image.preview().clone());
            }
            SessionView::PermissionPending | SessionView::Blocked { .. } => frame_widget.clear(),
        }

        draw(
            terminal,
            &session,
            &frame_widget,
            show_help,
            status_override.as_deref(),
        )?;

        // Handle input with timeout for frame updates
        let Some(command) = poll_command()? else {
            continue;
        };

        // An open alert swallows every key except quit
        if session.notice().is_some() {
            match command {
                Command::Quit => break,
                _ => {
                    session.take_notice();
                    continue;
                }
            }
        }

        status_override = None;
        match command {
            Command::Quit => break,
            Command::ToggleHelp => show_help = !show_help,
            Command::Dismiss => {}
            Command::OpenLibrary => {
                if let Err(e) = open_library(library_dir.clone()).await {
                    error!("Failed to open photo library: {}", e);
                    status_override = Some(format!("Error: {}", e));
                }
            }
            Command::Session(action) => {
                show_help = false;
                if action == Action::Capture {
                    status_override = Some("Capturing...".to_string());
                    draw(
                        terminal,
                        &session,
                        &frame_widget,
                        show_help,
                        status_override.as_deref(),
                    )?;
                }
                match session.perform(action).await {
                    Ok(()) => status_override = None,
                    // Capture and save failures raise their own alert
                    Err(e) if session.notice().is_some() => {
                        status_override = None;
                        info!(error = %e, "Action failed");
                    }
                    Err(e) => status_override = Some(e.to_string()),
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn poll_command() -> io::Result<Option<Command>> {
    if event::poll(timing::UI_TICK)?
        && let Event::Key(key) = event::read()?
        && key.kind == KeyEventKind::Press
    {
        return Ok(key_command(key));
    }
    Ok(None)
}

fn draw(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &CaptureSessionController,
    frame_widget: &FrameWidget,
    show_help: bool,
    status_override: Option<&str>,
) -> io::Result<()> {
    let view = session.view();
    let status_message = match status_override {
        Some(message) => message.to_string(),
        None if show_help => build_help_message(),
        None => build_status_message(&view, &session.available_actions()),
    };

    terminal.draw(|f| {
        let area = f.area();

        // Reserve bottom line for status
        let camera_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height: area.height.saturating_sub(1),
        };

        match &view {
            SessionView::PermissionPending => f.render_widget(
                Placeholder {
                    message: "Waiting for camera and photo library access...",
                },
                camera_area,
            ),
            SessionView::Blocked { .. } => f.render_widget(
                Placeholder {
                    message: "Camera access denied. Grant access to the camera and restart.",
                },
                camera_area,
            ),
            SessionView::LivePreview { .. } | SessionView::CapturedPreview { .. } => {
                f.render_widget(frame_widget, camera_area)
            }
        }

        // Render status bar
        let status_area = Rect {
            x: area.x,
            y: area.height.saturating_sub(1),
            width: area.width,
            height: 1,
        };
        f.render_widget(
            StatusBar {
                message: &status_message,
            },
            status_area,
        );

        if let Some(notice) = session.notice() {
            f.render_widget(AlertPopup { notice }, camera_area);
        }
    })?;
    Ok(())
}

/// Open the most recent photo, or the library folder if there is none
async fn open_library(dir: PathBuf) -> io::Result<()> {
    let target = storage::latest_photo(dir.clone()).await.unwrap_or(dir);
    info!(path = %target.display(), "Opening photo library");
    open::that_detached(&target)
}

fn action_hint(action: Action) -> &'static str {
    match action {
        Action::Capture => "'space' capture",
        Action::Retake => "'r' retake",
        Action::Save => "'s' save",
        Action::ToggleFacing => "'f' switch camera",
        Action::ToggleFlash => "'l' flash",
    }
}

fn build_status_message(view: &SessionView, actions: &[Action]) -> String {
    let mut parts: Vec<String> = Vec::new();
    match view {
        SessionView::LivePreview {
            facing,
            flash,
            can_save,
        } => {
            parts.push(format!("{} camera, flash {}", facing, flash));
            if !can_save {
                parts.push("saving disabled".to_string());
            }
        }
        SessionView::CapturedPreview { image, .. } => {
            parts.push(format!("Captured {}x{}", image.width(), image.height()));
        }
        SessionView::Blocked { .. } => parts.push("Camera blocked".to_string()),
        SessionView::PermissionPending => parts.push("Requesting access".to_string()),
    }
    parts.extend(actions.iter().map(|action| action_hint(*action).to_string()));
    parts.push("'g' gallery".to_string());
    parts.push("'h' help".to_string());
    parts.push("'q' quit".to_string());
    parts.join(" | ")
}

fn build_help_message() -> String {
    String::from(
        "space/p: Capture | r: Retake | s: Save | f: Switch camera | l: Flash | \
         g: Open gallery | Enter/Esc: Dismiss | h: Toggle help | q/Ctrl+C: Quit",
    )
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget {
    frame: Option<CameraFrame>,
}

impl FrameWidget {
    fn new() -> Self {
        Self { frame: None }
    }

    fn update_frame(&mut self, frame: CameraFrame) {
        self.frame = Some(frame);
    }

    fn clear(&mut self) {
        self.frame = None;
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = &self.frame else {
            Placeholder {
                message: "Waiting for camera...",
            }
            .render(area, buf);
            return;
        };
        if area.width == 0 || area.height == 0 || frame.width == 0 || frame.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            // Terminal is taller - fit to width
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        // Upper half (▀) colored with fg, lower half with bg
        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(sample_pixel(frame, src_x, src_y_top));
                    cell.set_bg(sample_pixel(frame, src_x, src_y_bottom));
                }
            }
        }
    }
}

fn sample_pixel(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let (r, g, b) = frame.pixel(x, y);
    Color::Rgb(r, g, b)
}

/// Centered one-line message
struct Placeholder<'a> {
    message: &'a str,
}

impl Widget for Placeholder<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let width = (self.message.chars().count() as u16).min(area.width);
        let x = area.x + (area.width - width) / 2;
        let y = area.y + area.height / 2;
        buf.set_stringn(x, y, self.message, area.width as usize, Style::default());
    }
}

/// Modal alert for session notices
struct AlertPopup<'a> {
    notice: &'a Notice,
}

impl Widget for AlertPopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width.min(50);
        let height = area.height.min(6);
        if width < 4 || height < 3 {
            return;
        }
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };

        let border = match self.notice.kind {
            NoticeKind::Info => Color::Green,
            NoticeKind::Error => Color::Red,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(self.notice.title.as_str());
        let text = format!("{}\n\n[Enter] OK", self.notice.message);

        Clear.render(popup, buf);
        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(popup, buf);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        buf.set_stringn(
            area.x,
            area.y,
            self.message,
            area.width as usize,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
