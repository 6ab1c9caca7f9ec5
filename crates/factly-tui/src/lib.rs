// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use factly_app::{
    CATEGORIES, CategoryFilter, Controller, Fact, FactFormInput, FactId, FetchTicket, VoteKind,
    VoteRequest, category_color, filter_options,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DISPUTED_MARK: &str = "[DISPUTED]";

/// Backend access the view layer needs. Implementations run on a worker
/// thread, so the UI thread never blocks on the network.
pub trait AppRuntime {
    fn fetch_facts(&mut self, filter: CategoryFilter) -> Result<Vec<Fact>>;
    fn submit_fact(&mut self, form: &FactFormInput) -> Result<Fact>;
    fn cast_vote(&mut self, request: &VoteRequest) -> Result<Fact>;
}

enum RuntimeRequest {
    Fetch {
        ticket: FetchTicket,
        filter: CategoryFilter,
    },
    Insert {
        form: FactFormInput,
    },
    Vote {
        request: VoteRequest,
    },
}

enum RuntimeCompletion {
    Fetch {
        ticket: FetchTicket,
        result: Result<Vec<Fact>, String>,
    },
    Insert {
        result: Result<Fact, String>,
    },
    Vote {
        id: FactId,
        result: Result<Fact, String>,
    },
}

fn spawn_worker<R>(
    mut runtime: R,
    requests: Receiver<RuntimeRequest>,
    completions: Sender<RuntimeCompletion>,
) where
    R: AppRuntime + Send + 'static,
{
    thread::spawn(move || {
        while let Ok(request) = requests.recv() {
            let completion = match request {
                RuntimeRequest::Fetch { ticket, filter } => RuntimeCompletion::Fetch {
                    ticket,
                    result: runtime.fetch_facts(filter).map_err(|error| format!("{error:#}")),
                },
                RuntimeRequest::Insert { form } => RuntimeCompletion::Insert {
                    result: runtime.submit_fact(&form).map_err(|error| format!("{error:#}")),
                },
                RuntimeRequest::Vote { request } => RuntimeCompletion::Vote {
                    id: request.id,
                    result: runtime.cast_vote(&request).map_err(|error| format!("{error:#}")),
                },
            };
            if completions.send(completion).is_err() {
                break;
            }
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Text,
    Source,
    Category,
}

impl FormField {
    const fn next(self) -> Self {
        match self {
            Self::Text => Self::Source,
            Self::Source => Self::Category,
            Self::Category => Self::Text,
        }
    }

    const fn prev(self) -> Self {
        match self {
            Self::Text => Self::Category,
            Self::Source => Self::Text,
            Self::Category => Self::Source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct View {
    selected_fact: usize,
    selected_filter: usize,
    focus: FormField,
}

impl Default for View {
    fn default() -> Self {
        Self {
            selected_fact: 0,
            selected_filter: 0,
            focus: FormField::Text,
        }
    }
}

impl View {
    fn clamp_selection(&mut self, fact_count: usize) {
        if fact_count == 0 {
            self.selected_fact = 0;
        } else if self.selected_fact >= fact_count {
            self.selected_fact = fact_count - 1;
        }
    }
}

/// Runs the terminal UI until the user quits. The controller carries all
/// shared state; the runtime performs the remote calls.
pub fn run_app<R>(controller: &mut Controller, runtime: R) -> Result<()>
where
    R: AppRuntime + Send + 'static,
{
    let (request_tx, request_rx) = mpsc::channel();
    let (completion_tx, completion_rx) = mpsc::channel();
    spawn_worker(runtime, request_rx, completion_tx);

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = event_loop(&mut terminal, controller, &request_tx, &completion_rx);

    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut Controller,
    requests: &Sender<RuntimeRequest>,
    completions: &Receiver<RuntimeCompletion>,
) -> Result<()> {
    let mut view = View::default();

    let (ticket, _) = controller.begin_fetch();
    send_fetch(requests, ticket, controller.filter())?;

    loop {
        while let Ok(completion) = completions.try_recv() {
            apply_completion(controller, &mut view, completion);
        }

        terminal
            .draw(|frame| draw(frame, controller, &view))
            .context("draw frame")?;

        if !event::poll(POLL_INTERVAL).context("poll input")? {
            continue;
        }
        let Event::Key(key) = event::read().context("read input")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        controller.clear_status();
        if handle_key(key, controller, &mut view, requests)? {
            return Ok(());
        }
    }
}

fn apply_completion(controller: &mut Controller, view: &mut View, completion: RuntimeCompletion) {
    match completion {
        RuntimeCompletion::Fetch { ticket, result } => {
            controller.complete_fetch(ticket, result);
            view.clamp_selection(controller.facts().len());
        }
        RuntimeCompletion::Insert { result } => {
            controller.complete_submit(result);
            view.selected_fact = 0;
        }
        RuntimeCompletion::Vote { id, result } => {
            controller.complete_vote(id, result);
        }
    }
}

fn send_fetch(
    requests: &Sender<RuntimeRequest>,
    ticket: FetchTicket,
    filter: CategoryFilter,
) -> Result<()> {
    requests
        .send(RuntimeRequest::Fetch { ticket, filter })
        .context("runtime worker is gone")
}

fn handle_key(
    key: KeyEvent,
    controller: &mut Controller,
    view: &mut View,
    requests: &Sender<RuntimeRequest>,
) -> Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Ok(true);
    }

    if controller.form_visible() {
        handle_form_key(key, controller, view, requests)?;
        return Ok(false);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('s') => {
            controller.toggle_form();
            view.focus = FormField::Text;
        }
        KeyCode::Tab => select_filter_offset(controller, view, requests, 1)?,
        KeyCode::BackTab => select_filter_offset(controller, view, requests, -1)?,
        KeyCode::Char('r') => {
            let (ticket, _) = controller.begin_fetch();
            send_fetch(requests, ticket, controller.filter())?;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view.selected_fact + 1 < controller.facts().len() {
                view.selected_fact += 1;
            }
        }
        KeyCode::Up | KeyCode::Char('k') => {
            view.selected_fact = view.selected_fact.saturating_sub(1);
        }
        KeyCode::Char('1') => vote_on_selected(controller, view, requests, VoteKind::Interesting)?,
        KeyCode::Char('2') => vote_on_selected(controller, view, requests, VoteKind::Mindblowing)?,
        KeyCode::Char('3') => vote_on_selected(controller, view, requests, VoteKind::False)?,
        _ => {}
    }
    Ok(false)
}

fn select_filter_offset(
    controller: &mut Controller,
    view: &mut View,
    requests: &Sender<RuntimeRequest>,
    delta: isize,
) -> Result<()> {
    let options = filter_options();
    let len = options.len() as isize;
    let next = (view.selected_filter as isize + delta).rem_euclid(len) as usize;
    view.selected_filter = next;
    view.selected_fact = 0;

    let (ticket, _) = controller.select_filter(options[next]);
    send_fetch(requests, ticket, controller.filter())
}

fn vote_on_selected(
    controller: &mut Controller,
    view: &View,
    requests: &Sender<RuntimeRequest>,
    kind: VoteKind,
) -> Result<()> {
    let Some(fact) = controller.facts().get(view.selected_fact) else {
        return Ok(());
    };
    let id = fact.id;

    let (request, _) = controller.begin_vote(id, kind);
    if let Some(request) = request {
        requests
            .send(RuntimeRequest::Vote { request })
            .context("runtime worker is gone")?;
    }
    Ok(())
}

fn handle_form_key(
    key: KeyEvent,
    controller: &mut Controller,
    view: &mut View,
    requests: &Sender<RuntimeRequest>,
) -> Result<()> {
    // Inputs stay disabled for the duration of an upload.
    if controller.is_uploading() {
        return Ok(());
    }

    match key.code {
        KeyCode::Esc => {
            controller.toggle_form();
        }
        KeyCode::Tab | KeyCode::Down => view.focus = view.focus.next(),
        KeyCode::BackTab | KeyCode::Up => view.focus = view.focus.prev(),
        KeyCode::Enter => {
            let (form, _) = controller.begin_submit();
            if let Some(form) = form {
                requests
                    .send(RuntimeRequest::Insert { form })
                    .context("runtime worker is gone")?;
            }
        }
        KeyCode::Left if view.focus == FormField::Category => {
            cycle_category(controller.form_mut(), -1);
        }
        KeyCode::Right if view.focus == FormField::Category => {
            cycle_category(controller.form_mut(), 1);
        }
        KeyCode::Backspace => {
            let form = controller.form_mut();
            match view.focus {
                FormField::Text => {
                    form.text.pop();
                }
                FormField::Source => {
                    form.source.pop();
                }
                FormField::Category => form.category.clear(),
            }
        }
        KeyCode::Char(ch) => {
            let form = controller.form_mut();
            match view.focus {
                FormField::Text => form.text.push(ch),
                FormField::Source => form.source.push(ch),
                FormField::Category => {}
            }
        }
        _ => {}
    }
    Ok(())
}

fn cycle_category(form: &mut FactFormInput, delta: isize) {
    let len = CATEGORIES.len() as isize;
    let next = match CATEGORIES
        .iter()
        .position(|category| category.name == form.category)
    {
        Some(current) => (current as isize + delta).rem_euclid(len) as usize,
        None => {
            if delta >= 0 {
                0
            } else {
                CATEGORIES.len() - 1
            }
        }
    };
    form.category = CATEGORIES[next].name.to_owned();
}

fn draw(frame: &mut ratatui::Frame<'_>, controller: &Controller, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], controller);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(18), Constraint::Min(20)])
        .split(chunks[1]);
    draw_filter_sidebar(frame, body[0], view);
    draw_fact_list(frame, body[1], controller, view);

    draw_footer(frame, chunks[2], controller);

    if controller.form_visible() {
        draw_form(frame, controller, view);
    }
}

fn draw_header(frame: &mut ratatui::Frame<'_>, area: Rect, controller: &Controller) {
    let hint = if controller.form_visible() {
        "tab field · ←/→ category · enter post · esc close"
    } else {
        "s share a fact · tab filter · 1/2/3 vote · r reload · q quit"
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled("factly", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_filter_sidebar(frame: &mut ratatui::Frame<'_>, area: Rect, view: &View) {
    let items: Vec<ListItem> = filter_options()
        .into_iter()
        .map(|filter| {
            let style = match filter {
                CategoryFilter::All => Style::default(),
                CategoryFilter::Only(name) => category_style(name),
            };
            ListItem::new(Span::styled(filter.label(), style))
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(view.selected_filter));
    let list = List::new(items)
        .block(Block::default().borders(Borders::RIGHT).title("categories"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_fact_list(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    controller: &Controller,
    view: &View,
) {
    if controller.is_loading() {
        frame.render_widget(Paragraph::new("Loading..."), area);
        return;
    }
    if controller.facts().is_empty() {
        frame.render_widget(
            Paragraph::new("No facts for this category yet! Share the first one."),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = controller
        .facts()
        .iter()
        .map(|fact| ListItem::new(fact_line(fact, controller.is_vote_pending(fact.id))))
        .collect();

    let mut state = ListState::default();
    state.select(Some(view.selected_fact));
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut ratatui::Frame<'_>, area: Rect, controller: &Controller) {
    let summary = fact_count_summary(controller.facts().len());
    let status = controller.status_line().unwrap_or_default();
    let footer = Paragraph::new(vec![
        Line::from(Span::styled(summary, Style::default().fg(Color::DarkGray))),
        Line::from(Span::styled(
            status.to_owned(),
            Style::default().fg(Color::Red),
        )),
    ]);
    frame.render_widget(footer, area);
}

fn draw_form(frame: &mut ratatui::Frame<'_>, controller: &Controller, view: &View) {
    let area = centered_rect(frame.area(), 60, 9);
    frame.render_widget(Clear, area);

    let form = controller.form();
    let title = if controller.is_uploading() {
        "share a fact (posting...)"
    } else {
        "share a fact"
    };

    let lines = vec![
        form_line("fact", &form.text, view.focus == FormField::Text),
        Line::from(Span::styled(
            format!("{} characters left", form.remaining_chars()),
            Style::default().fg(Color::DarkGray),
        )),
        form_line("source", &form.source, view.focus == FormField::Source),
        form_line(
            "category",
            if form.category.is_empty() {
                "(choose with ←/→)"
            } else {
                &form.category
            },
            view.focus == FormField::Category,
        ),
    ];

    let widget = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(widget, area);
}

fn form_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let marker = if focused { "> " } else { "  " };
    let style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_owned(), style),
    ])
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn category_style(name: &str) -> Style {
    match category_color(name).and_then(hex_color) {
        Some(color) => Style::default().fg(color),
        None => Style::default(),
    }
}

fn hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    Some(Color::Rgb(
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
    ))
}

fn fact_line(fact: &Fact, vote_pending: bool) -> Line<'static> {
    let mut spans = Vec::new();
    if fact.is_disputed() {
        spans.push(Span::styled(
            format!("{DISPUTED_MARK} "),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::raw(fact.text.clone()));
    spans.push(Span::styled(
        format!(" ({})", fact.source),
        Style::default().fg(Color::DarkGray),
    ));
    spans.push(Span::styled(
        format!(" [{}]", fact.category),
        category_style(&fact.category),
    ));
    spans.push(Span::styled(
        format!(" {}", vote_summary(fact, vote_pending)),
        Style::default().fg(Color::DarkGray),
    ));
    Line::from(spans)
}

fn vote_summary(fact: &Fact, vote_pending: bool) -> String {
    let mut summary = VoteKind::ALL
        .into_iter()
        .map(|kind| format!("{} {}", kind.label(), fact.vote_count(kind)))
        .collect::<Vec<_>>()
        .join(" · ");
    if vote_pending {
        summary.push_str(" (voting...)");
    }
    summary
}

fn fact_count_summary(count: usize) -> String {
    match count {
        0 => "There are no facts in the database yet.".to_owned(),
        1 => "There is 1 fact in the database.".to_owned(),
        count => format!("There are {count} facts in the database."),
    }
}
