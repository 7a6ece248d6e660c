use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use wcl_deaths::config::{Settings, Source};
use wcl_deaths::detail::{DetailLine, detail_lines};
use wcl_deaths::error::AnalysisError;
use wcl_deaths::provider::spawn_provider;
use wcl_deaths::rank::{SortDirection, SortKey, SortState};
use wcl_deaths::state::{
    self, AppState, Delta, FormField, FormMode, ProviderCommand, ResultsView, View, apply_delta,
};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    source: Source,
}

impl App {
    fn new(cmd_tx: Option<mpsc::Sender<ProviderCommand>>, settings: &Settings) -> Self {
        Self {
            state: AppState::new(settings.aggregate.clone()),
            should_quit: false,
            cmd_tx,
            source: settings.source,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::F(1) => {
                self.state.help_overlay = !self.state.help_overlay;
                return;
            }
            KeyCode::F(12) => {
                self.state.console_open = !self.state.console_open;
                return;
            }
            _ => {}
        }

        match self.state.view {
            View::Form => self.on_form_key(key),
            View::Loading { .. } => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('b') | KeyCode::Esc => {
                    self.state.go_back();
                    self.state.push_log("[INFO] Left loading screen; response will be ignored");
                }
                _ => {}
            },
            View::Results(_) => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
                KeyCode::Char('b') | KeyCode::Esc | KeyCode::Backspace => self.state.go_back(),
                KeyCode::Char('j') | KeyCode::Down => self.state.move_cursor(1),
                KeyCode::Char('k') | KeyCode::Up => self.state.move_cursor(-1),
                KeyCode::PageDown => self.state.move_cursor(10),
                KeyCode::PageUp => self.state.move_cursor(-10),
                KeyCode::Enter | KeyCode::Char(' ') => self.state.toggle_selected(),
                KeyCode::Char('1') => self.state.sort_results(SortKey::Name),
                KeyCode::Char('2') => self.state.sort_results(SortKey::BadDeaths),
                KeyCode::Char('3') => self.state.sort_results(SortKey::AvgDeathOrder),
                KeyCode::Char('4') => self.state.sort_results(SortKey::EarlyDeaths),
                _ => {}
            },
            View::Error { .. } => match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('b') | KeyCode::Esc | KeyCode::Enter => self.state.go_back(),
                _ => {}
            },
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Enter => {
                self.submit();
                return;
            }
            KeyCode::F(5) => {
                self.request_encounters();
                return;
            }
            _ => {}
        }

        let encounter_count = self.state.encounters.len();
        let form = &mut self.state.form;
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
            KeyCode::Left if form.focus == FormField::Encounter => {
                form.cycle_encounter(encounter_count, false)
            }
            KeyCode::Right if form.focus == FormField::Encounter => {
                form.cycle_encounter(encounter_count, true)
            }
            KeyCode::F(2) => form.toggle_mode(),
            KeyCode::F(3) => form.add_report(),
            KeyCode::F(4) => form.remove_report(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.input_char(c),
            _ => {}
        }
    }

    fn submit(&mut self) {
        let Some((request, body)) = self.state.begin_request() else {
            return;
        };
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[WARN] Analysis unavailable");
            return;
        };
        if tx.send(ProviderCommand::Analyze { request, body }).is_err() {
            self.state.push_log("[WARN] Analysis request failed");
            // Nothing will answer, so settle the request ourselves.
            apply_delta(
                &mut self.state,
                Delta::AnalysisSettled {
                    request,
                    outcome: Err(AnalysisError::Transport(
                        "Analysis worker is not running".to_string(),
                    )),
                },
            );
        } else {
            self.state.push_log(format!("[INFO] Request #{request} sent"));
        }
    }

    fn request_encounters(&mut self) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Encounter fetch unavailable");
            return;
        };
        if tx.send(ProviderCommand::FetchEncounters).is_err() {
            self.state.push_log("[WARN] Encounter request failed");
        } else {
            self.state.encounters_loading = true;
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let settings = Settings::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(tx, cmd_rx, settings.clone());

    let mut app = App::new(Some(cmd_tx), &settings);
    app.state.push_log(match settings.source {
        Source::Http => format!("[INFO] Using analysis service at {}", settings.api_url),
        Source::Demo => "[INFO] Using offline demo data".to_string(),
    });
    app.request_encounters();
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let console_height = if app.state.console_open { 8 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(console_height),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match &app.state.view {
        View::Form => render_form(frame, chunks[1], &app.state),
        View::Loading { request } => render_loading(frame, chunks[1], *request),
        View::Results(results) => render_results(frame, chunks[1], results),
        View::Error { message } => render_error(frame, chunks[1], message),
    }

    if app.state.console_open {
        let console = Paragraph::new(console_text(&app.state, console_height.saturating_sub(2)))
            .block(Block::default().title("Console").borders(Borders::ALL));
        frame.render_widget(console, chunks[2]);
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let source = match app.source {
        Source::Http => "LIVE",
        Source::Demo => "DEMO",
    };
    let encounter = app
        .state
        .selected_encounter()
        .map(|e| e.name.as_str())
        .unwrap_or("no encounter");
    format!("WCL DEATHS | {source} | {encounter}")
}

fn footer_text(state: &AppState) -> String {
    match state.view {
        View::Form => concat!(
            "Tab/↑/↓ Field | ←/→ Encounter | F2 Mode | F3/F4 Add/Remove report | ",
            "F5 Reload | Enter Analyze | F1 Help | Esc Quit"
        )
        .to_string(),
        View::Loading { .. } => "b/Esc Back | F12 Console | q Quit".to_string(),
        View::Results(_) => concat!(
            "j/k Move | Enter Expand | 1 Name 2 Bad 3 Avg 4 Top-N sort | ",
            "b Back | F12 Console | q Quit"
        )
        .to_string(),
        View::Error { .. } => "b/Esc/Enter Back | F12 Console | q Quit".to_string(),
    }
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState) {
    let form = &state.form;
    let focus_style = Style::default().fg(Color::Black).bg(Color::Cyan);
    let label_style = Style::default().add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    let encounter = if state.encounters_loading && state.encounters.is_empty() {
        "loading…".to_string()
    } else {
        state
            .selected_encounter()
            .map(|e| format!("◂ {} ▸", e.name))
            .unwrap_or_else(|| "none available (F5 to reload)".to_string())
    };
    lines.push(field_line(
        "Encounter",
        &encounter,
        form.focus == FormField::Encounter,
        label_style,
        focus_style,
    ));
    lines.push(Line::from(""));

    match form.mode {
        FormMode::Reports => {
            lines.push(Line::from(Span::styled("Report codes  (F2: guild lookup)", label_style)));
            for (idx, code) in form.reports.iter().enumerate() {
                let label = format!("  #{}", idx + 1);
                let value = if code.is_empty() { "e.g. AbVphwHqgLJ7ZQ3Y" } else { code.as_str() };
                lines.push(field_line(
                    &label,
                    value,
                    form.focus == FormField::Report(idx),
                    label_style,
                    focus_style,
                ));
            }
        }
        FormMode::Guild => {
            lines.push(Line::from(Span::styled("Guild lookup  (F2: report codes)", label_style)));
            let fields = [
                ("  Guild", form.guild_name.as_str(), FormField::GuildName),
                ("  Server", form.server_slug.as_str(), FormField::ServerSlug),
                ("  Region", form.server_region.as_str(), FormField::ServerRegion),
                ("  From", form.start_date.as_str(), FormField::StartDate),
                ("  To", form.end_date.as_str(), FormField::EndDate),
            ];
            for (label, value, field) in fields {
                lines.push(field_line(label, value, form.focus == field, label_style, focus_style));
            }
        }
    }

    lines.push(Line::from(""));
    let submit = if state.can_submit() {
        Span::styled("[ Analyze ]  Enter", Style::default().fg(Color::Green))
    } else {
        Span::styled("[ Analyzing… ]", Style::default().fg(Color::DarkGray))
    };
    lines.push(Line::from(submit));

    let panel =
        Paragraph::new(lines).block(Block::default().title("Analyze").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn field_line<'a>(
    label: &str,
    value: &str,
    focused: bool,
    label_style: Style,
    focus_style: Style,
) -> Line<'a> {
    let value_style = if focused { focus_style } else { Style::default() };
    Line::from(vec![
        Span::styled(format!("{label:<12}"), label_style),
        Span::styled(format!(" {value} "), value_style),
    ])
}

fn render_loading(frame: &mut Frame, area: Rect, request: state::RequestId) {
    let text = format!(
        "Analyzing… (request #{request})\n\n\
         b/Esc returns to the form; this response will then be ignored."
    );
    let panel = Paragraph::new(text)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let panel = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .block(Block::default().title("Error").borders(Borders::ALL));
    frame.render_widget(panel, area);
}

const NAME_WIDTH: usize = 24;

fn render_results(frame: &mut Frame, area: Rect, results: &ResultsView) {
    let block = Block::default().title("Bad Deaths Summary").borders(Borders::ALL);
    if results.is_empty() {
        let empty = Paragraph::new("No bad deaths found.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let sort = results.sort();
    let header = Line::from(Span::styled(
        format!(
            "{:<width$} {:>12} {:>18} {:>14}",
            column_title("Player", SortKey::Name, sort),
            column_title("Bad Deaths", SortKey::BadDeaths, sort),
            column_title("Avg Death Order", SortKey::AvgDeathOrder, sort),
            column_title("Top-N Deaths", SortKey::EarlyDeaths, sort),
            width = NAME_WIDTH,
        ),
        Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ));

    let mut lines = vec![header];
    let mut cursor_line = 0;
    for (idx, player) in results.rows().into_iter().enumerate() {
        let selected = idx == results.cursor();
        if selected {
            cursor_line = lines.len();
        }
        let expanded = results.is_expanded(&player.name);
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{:<width$} {:>12} {:>18.1} {:>14}  {}",
                player.name,
                player.bad_deaths,
                player.avg_death_order,
                player.early_deaths,
                if expanded { "▲" } else { "▼" },
                width = NAME_WIDTH,
            ),
            row_style,
        )));
        if expanded {
            for line in detail_lines(&player.details) {
                lines.push(match line {
                    DetailLine::DateHeader(date) => Line::from(Span::styled(
                        format!("    {date}"),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )),
                    DetailLine::Death(text) => Line::from(format!("      {text}")),
                });
            }
        }
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let scroll = cursor_line.saturating_sub(inner_height / 2);
    let scroll = scroll.min(u16::MAX as usize) as u16;
    let table = Paragraph::new(lines).block(block).scroll((scroll, 0));
    frame.render_widget(table, area);
}

fn column_title(title: &str, key: SortKey, sort: SortState) -> String {
    if sort.key != key {
        return title.to_string();
    }
    let arrow = match sort.direction {
        SortDirection::Ascending => "↑",
        SortDirection::Descending => "↓",
    };
    format!("{title} {arrow}")
}

fn console_text(state: &AppState, rows: u16) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(rows as usize)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "WCL Deaths - Help",
        "",
        "Global:",
        "  F1           Toggle help",
        "  F12          Toggle console",
        "  Ctrl+C       Quit",
        "",
        "Form:",
        "  Tab / ↑ / ↓  Next / previous field",
        "  ← / →        Change encounter",
        "  F2           Report codes / guild lookup",
        "  F3 / F4      Add / remove report row",
        "  F5           Reload encounters",
        "  Enter        Analyze",
        "",
        "Results:",
        "  j/k or ↑/↓   Move",
        "  Enter/Space  Expand player",
        "  1-4          Sort by column (again to flip)",
        "  b / Esc      Back to form",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
