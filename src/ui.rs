use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, AppState};
use crate::celebration::FinishCelebration;
use crate::clock::ClockStatus;
use crate::util::{fmt_clock, fmt_finish};
use crate::workout::TimerMode;

const HORIZONTAL_MARGIN: u16 = 5;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Workout => render_workout(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }

        // Celebration overlays whatever screen is up
        if self.celebration.is_active {
            render_celebration_particles(&self.celebration, area, buf);
        }
    }
}

fn status_style(status: ClockStatus) -> Style {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match status {
        ClockStatus::Idle => Style::default().fg(Color::Gray),
        ClockStatus::Preparing => bold.fg(Color::Yellow),
        ClockStatus::Running => bold.fg(Color::Green),
        ClockStatus::Resting => bold.fg(Color::Cyan),
        ClockStatus::Paused => bold.fg(Color::DarkGray),
        ClockStatus::Finished => bold.fg(Color::Magenta),
    }
}

fn render_workout(app: &App, area: Rect, buf: &mut Buffer) {
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let state = app.clock.state();
    let settings = &app.clock.plan().settings;

    let mut body: Vec<Line> = Vec::new();

    // "Interval · Resting"
    body.push(Line::from(vec![
        Span::styled(
            settings.mode.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" · "),
        Span::styled(state.status.to_string(), status_style(state.status)),
    ]));
    body.push(Line::default());

    let time_text = if settings.mode == TimerMode::NoTimer {
        String::from("--:--")
    } else {
        fmt_clock(state.current_time)
    };
    body.push(Line::from(Span::styled(
        time_text,
        status_style(state.status).add_modifier(Modifier::BOLD),
    )));
    body.push(Line::default());

    if settings.mode.is_rounds_based() && state.status != ClockStatus::Idle {
        body.push(Line::from(Span::raw(format!(
            "round {}/{} · lap {}",
            state.current_round + 1,
            settings.rounds,
            state.laps_completed + 1,
        ))));
    }

    if !app.clock.plan().exercises.is_empty() {
        body.push(exercise_strip(app, state.current_exercise));
    }

    if let Some(race) = &app.race {
        body.push(Line::default());
        body.extend(race_board(app, race));
    }

    if let Some(notice) = &app.notice {
        body.push(Line::default());
        body.push(Line::from(Span::styled(
            notice.clone(),
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )));
    }

    let legend_text = if app.is_race() {
        "(space) start/pause · (s)top · (↑/↓) select · (f)inish · (u)ndo · (r)eset · (esc)ape"
    } else {
        "(space) start/pause · (s)top · (r)eset · (esc)ape"
    };

    let body_height = body.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(area.height.saturating_sub(body_height + 2) / 2),
                Constraint::Length(body_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(legend_text, italic_style))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);
}

fn exercise_strip(app: &App, current: usize) -> Line<'static> {
    let exercises = &app.clock.plan().exercises;
    let started = app.clock.status() != ClockStatus::Idle;
    let mut spans: Vec<Span> = Vec::new();
    for (idx, name) in exercises.iter().enumerate() {
        if idx > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if started && idx == current {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(name.clone(), style));
    }
    Line::from(spans)
}

fn race_board(app: &App, race: &crate::app::RaceState) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut participant_idx = 0usize;

    // Display width, not byte length: names can hold wide glyphs
    let name_col = race
        .scheduler
        .participants()
        .map(|(_, name)| name.width())
        .max()
        .unwrap_or(0);

    for group in race.scheduler.groups() {
        let group_header = match group.start_offset_secs {
            Some(offset) => format!("{} — started at {}", group.name, fmt_clock(f64::from(offset))),
            None => {
                let due = group.id as u32 * race.scheduler.start_interval_secs();
                format!("{} — starts at {}", group.name, fmt_clock(f64::from(due)))
            }
        };
        let header_style = if group.start_offset_secs.is_some() {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        lines.push(Line::from(Span::styled(group_header, header_style)));

        for name in &group.participants {
            let selected = participant_idx == app.selected_participant;
            let marker = if selected { "> " } else { "  " };
            let padding = " ".repeat(name_col.saturating_sub(name.width()));
            let line = match race.scheduler.finish_for(name) {
                Some(finish) => Line::from(Span::styled(
                    format!(
                        "{}{}{}  {} ({})",
                        marker,
                        name,
                        padding,
                        fmt_finish(finish.finish_secs),
                        ordinal(finish.placement),
                    ),
                    Style::default().fg(Color::Green),
                )),
                None => Line::from(Span::styled(
                    format!("{}{}", marker, name),
                    if selected {
                        Style::default().add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    },
                )),
            };
            lines.push(line);
            participant_idx += 1;
        }
    }
    lines
}

fn ordinal(placement: u32) -> String {
    let suffix = match (placement % 10, placement % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", placement, suffix)
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let state = app.clock.state();
    let settings = &app.clock.plan().settings;
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let mut body: Vec<Line> = vec![
        Line::from(Span::styled(
            "WORKOUT COMPLETE",
            bold.fg(Color::Magenta),
        )),
        Line::default(),
        Line::from(Span::raw(format!(
            "{} · {} in {}",
            settings.mode,
            if settings.mode.is_rounds_based() {
                format!("{} rounds", settings.rounds)
            } else {
                String::from("1 round")
            },
            fmt_clock(state.total_elapsed),
        ))),
    ];

    if !app.recent.is_empty() {
        body.push(Line::default());
        body.push(Line::from(Span::styled("recent results", bold)));
        for result in app.recent.iter().take(5) {
            body.push(Line::from(Span::styled(
                format!(
                    "{}  {}  {}",
                    result.finished_at.format("%b %d %H:%M"),
                    result.mode,
                    fmt_clock(result.elapsed_secs),
                ),
                Style::default().add_modifier(Modifier::DIM),
            )));
        }
    }

    let legend = "(r)estart · (esc)ape";
    let body_height = body.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints(
            [
                Constraint::Length(area.height.saturating_sub(body_height + 2) / 2),
                Constraint::Length(body_height),
                Constraint::Min(0),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(area);

    Paragraph::new(body)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false })
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);
}

/// Render celebration particles on top of the current screen
fn render_celebration_particles(celebration: &FinishCelebration, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];

            // Fade with age
            let alpha = 1.0 - (particle.age / particle.max_age);

            let style = if particle.is_text {
                if alpha > 0.4 {
                    Style::default().fg(color).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(color)
                }
            } else if alpha > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if alpha > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}
