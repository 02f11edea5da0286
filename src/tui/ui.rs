//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::binary::decode_signed;
use crate::io::serial::format_value;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: code, registers and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(app.cpu.regs.count().div_ceil(2) as u16 + 3),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory, serial output and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(4),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_output(frame, right_chunks[1], app);
    draw_help(frame, right_chunks[2]);
}

/// Draw disassembly around the next fetch.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_next)| {
            let prefix = if *is_next { "▶ " } else { "  " };
            let bp = if app.breakpoints.contains(addr) { "●" } else { " " };
            let text = format!("{}{:>6}: {}", prefix, addr.to_string(), instr);

            let style = if *is_next {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if app.breakpoints.contains(addr) {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            ListItem::new(format!("{} {}", bp, text)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw the register file, two registers per line.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let cells: Vec<Vec<Span>> = app.cpu.regs.iter()
        .enumerate()
        .map(|(i, value)| match value {
            Some(bits) => {
                let decoded = decode_signed(bits.as_str())
                    .map(|v| v.to_string())
                    .unwrap_or_else(|_| "?".into());
                vec![
                    Span::raw(format!("reg{}: ", i)),
                    Span::styled(format!("{:>12}", bits.as_str()), Style::default().fg(Color::White)),
                    Span::raw(format!(" = {:<8}", decoded)),
                ]
            }
            None => vec![
                Span::raw(format!("reg{}: ", i)),
                Span::styled(format!("{:>12}", "-"), Style::default().fg(Color::DarkGray)),
                Span::raw(format!("   {:<8}", "")),
            ],
        })
        .collect();

    let mut content: Vec<Line> = cells
        .chunks(2)
        .map(|pair| Line::from(pair.concat()))
        .collect();

    content.push(Line::from(vec![
        Span::raw("Cycle: "),
        Span::styled(format!("{}", app.cpu.cycle), Style::default().fg(Color::Cyan)),
        Span::raw("   Next: "),
        Span::styled(format!("{}", app.cpu.next_address()), Style::default().fg(Color::Yellow)),
        Span::raw("   State: "),
        Span::styled(app.describe_state(),
            if app.cpu.is_running() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            }),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw occupied memory slots.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let next = app.cpu.next_address();

    let items: Vec<ListItem> = app.cpu.mem.iter()
        .skip(app.mem_scroll)
        .take(visible_rows)
        .map(|(addr, word)| {
            let text = format!("{:>6}: {}", addr.to_string(), word);
            let style = if addr == next {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" Memory ({} words) ", app.cpu.mem.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw the most recent serial output.
fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let visible_rows = (area.height as usize).saturating_sub(2);
    let values = app.cpu.serial().values();
    let skip = values.len().saturating_sub(visible_rows);

    let lines: Vec<Line> = values[skip..]
        .iter()
        .map(|v| Line::from(format_value(*v)))
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Serial ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s: Step  r: Run  p: Pause  b: Breakpoint"),
        Line::from("x: Reset  ↑↓: Scroll memory  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}
