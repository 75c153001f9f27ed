//! Charts screen: births per month by gender and the eligibility split.

use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Style},
  text::Line,
  widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
};

use crate::app::App;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let Some(summary) = &app.summary else {
    f.render_widget(
      Paragraph::new("No statistics loaded.")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL)),
      area,
    );
    return;
  };

  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(3),
      Constraint::Percentage(60),
      Constraint::Min(0),
    ])
    .split(area);

  let totals = format!(
    " {} records  {} valid  {} invalid  {} duplicate sightings",
    summary.total, summary.valid, summary.invalid, summary.duplicates
  );
  f.render_widget(
    Paragraph::new(totals).block(Block::default().borders(Borders::ALL).title(" Totals ")),
    rows[0],
  );

  let female = Style::default().fg(Color::Magenta);
  let male = Style::default().fg(Color::Cyan);
  let mut months = BarChart::default()
    .block(
      Block::default()
        .borders(Borders::ALL)
        .title(" Births by month (%)  female / male "),
    )
    .bar_width(3)
    .bar_gap(0)
    .group_gap(2);
  for share in &summary.birth_months {
    let label = share.month.get(..3).unwrap_or(&share.month);
    months = months.data(
      BarGroup::default()
        .label(Line::from(label.to_string()))
        .bars(&[
          Bar::default()
            .value(share.female_pct.round() as u64)
            .style(female),
          Bar::default()
            .value(share.male_pct.round() as u64)
            .style(male),
        ]),
    );
  }
  f.render_widget(months, rows[1]);

  let eligibility: Vec<(&str, u64)> = summary
    .eligibility
    .iter()
    .map(|e| (e.category.as_str(), u64::from(e.count)))
    .collect();
  f.render_widget(
    BarChart::default()
      .block(
        Block::default()
          .borders(Borders::ALL)
          .title(" Voting eligibility (valid records) "),
      )
      .bar_width(12)
      .bar_gap(3)
      .bar_style(Style::default().fg(Color::Green))
      .data(eligibility.as_slice()),
    rows[2],
  );
}
