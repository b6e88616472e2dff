use anyhow::Result;
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::api::HttpApi;
use crate::card::{CardView, JobCard, Logo, LogoState};
use crate::config::Ui;
use crate::format;
use crate::models::SavedJobRecord;
use crate::view::{BannerKind, SavedJobsView, NOTES_PLACEHOLDER};

const TICK: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Search,
    EditNotes,
}

struct App {
    view: SavedJobsView<HttpApi>,
    cursor: usize,
    scroll_offset: u16,
    mode: Mode,
    card: Option<JobCard>,
    probe_logos: bool,
    show_match_score: bool,
    probed_for: Option<String>,
}

impl App {
    fn new(view: SavedJobsView<HttpApi>, ui: &Ui) -> Self {
        Self {
            view,
            cursor: 0,
            scroll_offset: 0,
            mode: Mode::Normal,
            card: None,
            probe_logos: ui.probe_logos,
            show_match_score: ui.show_match_score,
            probed_for: None,
        }
    }

    fn current_record(&self) -> Option<&SavedJobRecord> {
        self.view.state().filtered().get(self.cursor).copied()
    }

    fn filtered_len(&self) -> usize {
        self.view.state().filtered().len()
    }

    fn next(&mut self) {
        if self.cursor + 1 < self.filtered_len() {
            self.cursor += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    /// Keeps the cursor inside the filtered list and the card pointed at the
    /// record under it.
    fn sync(&mut self) {
        let len = self.filtered_len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }

        let job = self.current_record().map(|r| r.job_data.clone());
        match (job, self.card.as_mut()) {
            (Some(job), Some(card)) => card.sync(&job),
            (Some(job), None) => {
                self.card = Some(
                    JobCard::new(job)
                        .saved(true)
                        .show_match_score(self.show_match_score),
                )
            }
            (None, _) => self.card = None,
        }
    }

    async fn probe_logo(&mut self) {
        if !self.probe_logos {
            return;
        }
        let Some(record_id) = self.current_record().map(|r| r.id.clone()) else {
            return;
        };
        if self.probed_for.as_deref() == Some(record_id.as_str()) {
            return;
        }
        self.probed_for = Some(record_id);

        let Some(card) = self.card.as_mut() else { return };
        if card.logo_state() == LogoState::Errored {
            return;
        }
        if let Some(url) = card.logo_url() {
            if !self.view.api().probe_image(&url).await {
                debug!(url = %url, "logo unavailable, using glyph");
                card.mark_image_error();
            }
        }
    }
}

/// Runs the browser over an already loaded view.
pub async fn run_browse(view: SavedJobsView<HttpApi>, ui: &Ui) -> Result<()> {
    let mut app = App::new(view, ui);
    app.sync();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        app.probe_logo().await;
        list_state.select((app.filtered_len() > 0).then_some(app.cursor));
        terminal.draw(|frame| draw(frame, app, &mut list_state))?;

        if !event::poll(TICK)? {
            app.view.tick(Instant::now());
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let keep_going = match app.mode {
                Mode::Normal => handle_normal_key(app, key).await,
                Mode::Search => {
                    handle_search_key(app, key);
                    true
                }
                Mode::EditNotes => {
                    handle_notes_key(app, key).await;
                    true
                }
            };
            if !keep_going {
                break;
            }
            app.sync();
        }
    }
    Ok(())
}

async fn handle_normal_key(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.prev(),
        KeyCode::Char('J') | KeyCode::PageDown => app.scroll_down(),
        KeyCode::Char('K') | KeyCode::PageUp => app.scroll_up(),
        KeyCode::Char('/') => app.mode = Mode::Search,
        KeyCode::Char('s') => {
            let sort = app.view.state().sort().next();
            app.view.set_sort(sort);
        }
        KeyCode::Char(' ') => {
            if let Some(id) = app.current_record().map(|r| r.id.clone()) {
                app.view.toggle_selection(&id);
            }
        }
        KeyCode::Char('a') => app.view.select_all(),
        KeyCode::Char('D') => {
            app.view.bulk_delete().await;
        }
        KeyCode::Char('u') => {
            // The card raises the intent; the delete is keyed on the record's
            // job id, not the snapshot's.
            let target = app.current_record().map(|r| r.job_id.clone());
            let mut requested = false;
            if let Some(card) = app.card.as_ref() {
                card.save(Some(&mut |_: &str| requested = true));
            }
            if let (true, Some(job_id)) = (requested, target) {
                app.view.unsave(&job_id).await;
            }
        }
        KeyCode::Char('o') => {
            if let Some(card) = app.card.as_ref() {
                if let Err(e) = card.apply(None) {
                    warn!(error = %e, "apply failed");
                    app.view.show_error(e.to_string());
                }
            }
        }
        KeyCode::Char('e') => {
            if let Some(id) = app.current_record().map(|r| r.id.clone()) {
                app.view.begin_edit(&id);
                app.mode = Mode::EditNotes;
            }
        }
        KeyCode::Char('r') => {
            app.view.load().await;
            app.probed_for = None;
        }
        _ => {}
    }
    true
}

fn handle_search_key(app: &mut App, key: KeyEvent) {
    let mut query = app.view.state().query().to_string();
    match key.code {
        KeyCode::Enter => app.mode = Mode::Normal,
        KeyCode::Esc => {
            query.clear();
            app.mode = Mode::Normal;
        }
        KeyCode::Backspace => {
            query.pop();
        }
        KeyCode::Char(c) => query.push(c),
        _ => return,
    }
    app.view.set_query(query);
    app.cursor = 0;
}

async fn handle_notes_key(app: &mut App, key: KeyEvent) {
    let Some(mut text) = app.view.editing().map(|d| d.text.clone()) else {
        app.mode = Mode::Normal;
        return;
    };
    match key.code {
        KeyCode::Esc => {
            app.view.cancel_edit();
            app.mode = Mode::Normal;
        }
        KeyCode::Enter => {
            // Failed saves stay in edit mode so the draft is not lost
            if app.view.save_notes().await {
                app.mode = Mode::Normal;
            }
        }
        KeyCode::Backspace => {
            text.pop();
            app.view.set_draft(text);
        }
        KeyCode::Char(c) => {
            text.push(c);
            app.view.set_draft(text);
        }
        _ => {}
    }
}

fn draw(frame: &mut Frame, app: &App, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(build_header(app), rows[0]);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[1]);

    // Left panel: saved jobs
    let filtered = app.view.state().filtered();
    let items: Vec<ListItem> = if let Some(empty) = app.view.empty_state() {
        vec![
            ListItem::new(Span::styled(empty.title, Style::default().add_modifier(Modifier::BOLD))),
            ListItem::new(Span::styled(empty.hint, Style::default().fg(Color::DarkGray))),
        ]
    } else {
        filtered
            .iter()
            .map(|record| {
                let mark = if app.view.state().is_selected(&record.id) { "[x]" } else { "[ ]" };
                ListItem::new(format!(
                    "{} {} | {}",
                    mark,
                    format::truncate(record.job_data.title(), 32),
                    record.job_data.employer()
                ))
            })
            .collect()
    };

    let list_title = if app.view.bulk_bar_visible() {
        format!(" {} · {} ", app.view.selection_summary(), app.view.select_all_label())
    } else {
        format!(" {} · {} ", app.view.header(), app.view.select_all_label())
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: job card
    let detail = build_detail(app);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Job "))
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    let help = match app.mode {
        Mode::Normal => {
            " j/k:move J/K:scroll /:search s:sort space:select a:all D:delete selected u:unsave e:notes o:apply r:reload q:quit"
        }
        Mode::Search => " type to filter  Enter:done  Esc:clear",
        Mode::EditNotes => " type notes  Enter:save  Esc:cancel",
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        rows[2],
    );
}

fn build_header(app: &App) -> Paragraph<'static> {
    let mut lines: Vec<Line> = Vec::new();

    let search = if app.mode == Mode::Search {
        format!("Search: {}_", app.view.state().query())
    } else if app.view.state().query().is_empty() {
        "Search saved jobs... (/)".to_string()
    } else {
        format!("Search: {}", app.view.state().query())
    };
    lines.push(Line::from(vec![
        Span::styled(app.view.header(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   "),
        Span::raw(search),
        Span::raw("   "),
        Span::styled(
            format!("Sort by: {}", app.view.state().sort().label()),
            Style::default().fg(Color::Cyan),
        ),
    ]));

    if app.view.is_loading() {
        lines.push(Line::from(Span::styled("Loading...", Style::default().fg(Color::Yellow))));
    } else if let Some(banner) = app.view.banner(Instant::now()) {
        let style = match banner.kind {
            BannerKind::Success => Style::default().fg(Color::Green),
            BannerKind::Error => Style::default().fg(Color::Red),
        };
        lines.push(Line::from(Span::styled(banner.text.clone(), style)));
    }

    Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::BOTTOM))
}

fn build_detail(app: &App) -> Text<'static> {
    let (Some(record), Some(card)) = (app.current_record(), app.card.as_ref()) else {
        return Text::raw("No job selected");
    };

    let mut lines = card_lines(&card.view(Utc::now()));

    // Notes
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Notes", Style::default().add_modifier(Modifier::BOLD))));
    match app.view.editing() {
        Some(draft) if draft.record_id == record.id => {
            lines.push(Line::from(Span::styled(
                format!("{}_", draft.text),
                Style::default().fg(Color::Yellow),
            )));
        }
        _ => {
            let notes = record.notes.as_deref().filter(|n| !n.is_empty());
            for line in textwrap::fill(notes.unwrap_or(NOTES_PLACEHOLDER), 70).lines() {
                lines.push(Line::from(format!("  {}", line)));
            }
        }
    }
    lines.push(Line::from(Span::styled(
        format::saved_at(record.saved_at),
        Style::default().fg(Color::DarkGray),
    )));

    Text::from(lines)
}

fn card_lines(view: &CardView) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    let mut top: Vec<Span> = Vec::new();
    if let Some(score) = view.match_score {
        top.push(Span::styled(
            format!("{}% Match", score),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
        top.push(Span::raw("   "));
    }
    top.push(Span::styled(
        format!("[{}]", view.save_label()),
        Style::default().fg(Color::Yellow),
    ));
    lines.push(Line::from(top));
    lines.push(Line::from(""));

    let logo = match &view.logo {
        Logo::Image(url) => format!("logo: {}", url),
        Logo::Glyph => "[briefcase]".to_string(),
    };
    lines.push(Line::from(Span::styled(logo, Style::default().fg(Color::DarkGray))));
    lines.push(Line::from(Span::styled(
        view.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(view.employer.clone()));

    let mut meta = vec![view.location.clone()];
    if let Some(kind) = &view.employment_type {
        meta.push(kind.clone());
    }
    if view.remote {
        meta.push("Remote".to_string());
    }
    lines.push(Line::from(Span::styled(meta.join("  ·  "), Style::default().fg(Color::Cyan))));
    lines.push(Line::from(""));

    for line in textwrap::fill(&view.description, 70).lines() {
        lines.push(Line::from(Span::styled(
            line.to_string(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::from(""));

    if let Some(salary) = &view.salary {
        lines.push(Line::from(Span::styled(
            salary.clone(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
    }

    if !view.skills.is_empty() {
        let mut skills = view.skills.join(", ");
        if let Some(more) = &view.skills_overflow {
            skills.push_str(&format!("  {}", more));
        }
        lines.push(Line::from(format!("Skills: {}", skills)));
    }
    if !view.benefits.is_empty() {
        let mut benefits = view.benefits.join(", ");
        if let Some(more) = &view.benefits_overflow {
            benefits.push_str(&format!("  {}", more));
        }
        lines.push(Line::from(format!("Benefits: {}", benefits)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Apply Now (o)",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        view.footer.clone(),
        Style::default().fg(Color::DarkGray),
    )));

    lines
}

/// Plain-text card for the `show` command.
pub fn card_text(view: &CardView) -> String {
    card_lines(view)
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
