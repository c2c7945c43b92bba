//! Live terminal dashboard for a running simulation

use std::io::{self, stdout};
use std::ops::ControlFlow;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    prelude::*,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph},
};
use shared::{Location, Species, Terrain};
use sim::{Histogram, Simulation};

/// Upper bin edge and bin width of one histogram
#[derive(Debug, Clone, Copy)]
pub struct HistSpec {
    pub max: f64,
    pub delta: f64,
}

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Redraw every this many years
    pub vis_years: u32,
    /// Head count at which a heatmap cell is fully saturated
    pub cmax_herbivore: usize,
    pub cmax_carnivore: usize,
    pub age: HistSpec,
    pub weight: HistSpec,
    pub fitness: HistSpec,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            vis_years: 1,
            cmax_herbivore: 140,
            cmax_carnivore: 100,
            age: HistSpec { max: 60.0, delta: 5.0 },
            weight: HistSpec { max: 80.0, delta: 5.0 },
            fitness: HistSpec { max: 1.0, delta: 0.1 },
        }
    }
}

impl DashboardOptions {
    fn cmax(&self, species: Species) -> usize {
        match species {
            Species::Herbivore => self.cmax_herbivore,
            Species::Carnivore => self.cmax_carnivore,
        }
    }
}

fn species_color(species: Species) -> Color {
    match species {
        Species::Herbivore => Color::Green,
        Species::Carnivore => Color::Red,
    }
}

/// Background for a heatmap cell: dark at zero, bright at `cmax` and above
pub fn heat_color(count: usize, cmax: usize) -> Color {
    let ratio = if cmax == 0 {
        1.0
    } else {
        (count as f64 / cmax as f64).min(1.0)
    };
    let level = (40.0 + ratio * 215.0) as u8;
    Color::Rgb(level, level, (ratio * 80.0) as u8)
}

fn terrain_color(terrain: Terrain) -> Color {
    match terrain {
        Terrain::Water => Color::Blue,
        Terrain::Lowland => Color::Green,
        Terrain::Highland => Color::LightGreen,
        Terrain::Desert => Color::Yellow,
    }
}

/// Draw one frame of the dashboard
pub fn render(frame: &mut Frame, simulation: &Simulation, options: &DashboardOptions) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Percentage(55),
            Constraint::Min(8),
        ])
        .split(frame.size());

    render_header(frame, rows[0], simulation);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
        ])
        .split(rows[1]);

    render_population_chart(frame, middle[0], simulation);
    render_map(frame, middle[1], simulation);
    render_heatmap(frame, middle[2], simulation, Species::Herbivore, options);
    render_heatmap(frame, middle[3], simulation, Species::Carnivore, options);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(rows[2]);

    let stats = simulation.last_year();
    let fitness = |species| stats.samples(species).fitness.clone();
    let age = |species| {
        stats
            .samples(species)
            .age
            .iter()
            .map(|&age| age as f64)
            .collect::<Vec<_>>()
    };
    let weight = |species| stats.samples(species).weight.clone();

    render_histogram(
        frame,
        bottom[0],
        "Fitness",
        options.fitness,
        fitness(Species::Herbivore),
        fitness(Species::Carnivore),
    );
    render_histogram(
        frame,
        bottom[1],
        "Age",
        options.age,
        age(Species::Herbivore),
        age(Species::Carnivore),
    );
    render_histogram(
        frame,
        bottom[2],
        "Weight",
        options.weight,
        weight(Species::Herbivore),
        weight(Species::Carnivore),
    );
}

fn render_header(frame: &mut Frame, area: Rect, simulation: &Simulation) {
    let count = simulation.num_animals_per_species();
    let line = Line::from(vec![
        Span::styled(
            format!(" Year {} ", simulation.year()),
            Style::default().fg(Color::Black).bg(Color::White),
        ),
        Span::styled(
            format!("  Herbivores {}", count.herbivores),
            Style::default().fg(species_color(Species::Herbivore)),
        ),
        Span::styled(
            format!("  Carnivores {}", count.carnivores),
            Style::default().fg(species_color(Species::Carnivore)),
        ),
        Span::styled("  (q to quit)", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_population_chart(frame: &mut Frame, area: Rect, simulation: &Simulation) {
    let history = simulation.history();
    let series: Vec<(Species, Vec<(f64, f64)>)> = Species::ALL
        .iter()
        .map(|&species| {
            let points = history
                .series(species)
                .iter()
                .enumerate()
                .map(|(year, &count)| ((year + 1) as f64, count as f64))
                .collect();
            (species, points)
        })
        .collect();

    let x_max = (history.len() as f64).max(1.0);
    let y_max = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|&(_, y)| y))
        .fold(1.0_f64, f64::max);

    let datasets = series
        .iter()
        .map(|(species, points)| {
            Dataset::default()
                .name(species.name())
                .marker(ratatui::symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(species_color(*species)))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(Block::default().title(" Population ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec![Span::raw("0"), Span::raw(format!("{x_max:.0}"))]),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max * 1.1])
                .labels(vec![Span::raw("0"), Span::raw(format!("{y_max:.0}"))]),
        );
    frame.render_widget(chart, area);
}

fn grid_lines<F>(simulation: &Simulation, mut paint: F) -> Vec<Line<'static>>
where
    F: FnMut(Location) -> Color,
{
    let island = simulation.island();
    (1..=island.rows())
        .map(|row| {
            let spans: Vec<Span> = (1..=island.cols())
                .map(|col| Span::styled("  ", Style::default().bg(paint(Location::new(row, col)))))
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn render_map(frame: &mut Frame, area: Rect, simulation: &Simulation) {
    let island = simulation.island();
    let lines = grid_lines(simulation, |location| {
        island
            .cell(location)
            .map_or(Color::Reset, |cell| terrain_color(cell.terrain()))
    });
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title(" Island ").borders(Borders::ALL)),
        area,
    );
}

fn render_heatmap(
    frame: &mut Frame,
    area: Rect,
    simulation: &Simulation,
    species: Species,
    options: &DashboardOptions,
) {
    let island = simulation.island();
    let cmax = options.cmax(species);
    let lines = grid_lines(simulation, |location| match island.cell(location) {
        Some(cell) if cell.is_habitable() => heat_color(cell.count(species), cmax),
        Some(_) => Color::Blue,
        None => Color::Reset,
    });
    let title = format!(" {} (max {}) ", species.name(), cmax);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn render_histogram(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    spec: HistSpec,
    herbivores: Vec<f64>,
    carnivores: Vec<f64>,
) {
    let herbivores = Histogram::new(herbivores, spec.max, spec.delta);
    let carnivores = Histogram::new(carnivores, spec.max, spec.delta);

    let mut chart = BarChart::default()
        .block(Block::default().title(format!(" {title} ")).borders(Borders::ALL))
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1);

    for (bin, (&h, &c)) in herbivores.counts.iter().zip(&carnivores.counts).enumerate() {
        let bars = [
            Bar::default()
                .value(h)
                .text_value(String::new())
                .style(Style::default().fg(species_color(Species::Herbivore))),
            Bar::default()
                .value(c)
                .text_value(String::new())
                .style(Style::default().fg(species_color(Species::Carnivore))),
        ];
        let label = format!("{}", (herbivores.edge(bin) * 100.0).round() / 100.0);
        chart = chart.data(BarGroup::default().label(Line::from(label)).bars(&bars));
    }

    frame.render_widget(chart, area);
}

fn quit_requested(timeout: Duration) -> io::Result<bool> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(matches!(key.code, KeyCode::Char('q') | KeyCode::Esc));
            }
        }
    }
    Ok(false)
}

/// How a dashboard session ended
struct Outcome {
    simulated: Result<u32, sim::SimError>,
    ui_error: Option<io::Error>,
}

/// Simulate and redraw until the years run out or `quit` says so. Terminal
/// errors stop the run and are reported, never propagated, so the caller
/// can always restore the terminal.
fn drive<B, Q>(
    terminal: &mut Terminal<B>,
    simulation: &mut Simulation,
    years: u32,
    options: &DashboardOptions,
    mut quit: Q,
) -> Outcome
where
    B: Backend,
    Q: FnMut(Duration) -> io::Result<bool>,
{
    let vis_years = options.vis_years.max(1);
    let mut ui_error = terminal
        .draw(|f| render(f, simulation, options))
        .err();
    let mut stopped = false;

    let simulated = if ui_error.is_some() {
        Ok(0)
    } else {
        simulation.simulate_with(years, |simulation| {
            if simulation.year() % vis_years == 0 {
                if let Err(err) = terminal.draw(|f| render(f, simulation, options)) {
                    ui_error = Some(err);
                    return ControlFlow::Break(());
                }
            }
            match quit(Duration::ZERO) {
                Ok(true) => {
                    stopped = true;
                    ControlFlow::Break(())
                }
                Ok(false) => ControlFlow::Continue(()),
                Err(err) => {
                    ui_error = Some(err);
                    ControlFlow::Break(())
                }
            }
        })
    };

    // Keep the final frame up until the user leaves
    if ui_error.is_none() && !stopped {
        if let Err(err) = terminal.draw(|f| render(f, simulation, options)) {
            ui_error = Some(err);
        }
        while ui_error.is_none() {
            match quit(Duration::from_millis(100)) {
                Ok(true) => break,
                Ok(false) => {}
                Err(err) => ui_error = Some(err),
            }
        }
    }

    Outcome {
        simulated,
        ui_error,
    }
}

/// Run `years` years with the dashboard on screen. Returns the number of
/// years simulated, which is smaller when the user quits early.
pub fn run(
    simulation: &mut Simulation,
    years: u32,
    options: &DashboardOptions,
) -> anyhow::Result<u32> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen) {
        terminal::disable_raw_mode()?;
        return Err(err.into());
    }

    let outcome = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(mut terminal) => {
            let outcome = drive(&mut terminal, simulation, years, options, quit_requested);
            let _ = terminal.show_cursor();
            outcome
        }
        Err(err) => Outcome {
            simulated: Ok(0),
            ui_error: Some(err),
        },
    };

    // Cleanup
    terminal::disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    if let Some(err) = outcome.ui_error {
        return Err(err.into());
    }
    Ok(outcome.simulated?)
}
