use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;

use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::config::Config;
use crate::error::Result;
use crate::plot::{contour_levels, level_color};
use crate::relax::{PlateCondition, UpdatePolicy};
use crate::simulation::{Simulation, Solution};

#[derive(Debug)]
struct ContourLevel {
    value: f64,
    points: Vec<[f64; 2]>,
}

pub struct PlateFlowViewer {
    config: Config,
    solution: Option<Solution>,
    error: Option<String>,
    show_numerical: bool,
    show_theory: bool,
    show_contours: bool,
    contour_levels: usize,
    contours: Vec<ContourLevel>,
    min_psi: f64,
    max_psi: f64,
    pending: Option<Receiver<Result<Solution>>>,
}

/// Runs one solve on a worker thread so the UI keeps repainting.
fn spawn_solve(config: Config) -> Receiver<Result<Solution>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        // the viewer may have closed; nothing to report then
        let _ = tx.send(Simulation::run(&config));
    });
    rx
}

impl PlateFlowViewer {
    fn new(_cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        let mut viewer = Self::with_config(config);
        viewer.run_simulation();
        viewer
    }

    fn with_config(config: Config) -> Self {
        Self {
            config,
            solution: None,
            error: None,
            show_numerical: true,
            show_theory: true,
            show_contours: true,
            contour_levels: 30,
            contours: Vec::new(),
            min_psi: 0.0,
            max_psi: 0.0,
            pending: None,
        }
    }

    fn is_solving(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a solve with the current settings unless one is in flight.
    fn run_simulation(&mut self) {
        if self.is_solving() {
            return;
        }
        self.pending = Some(spawn_solve(self.config.clone()));
    }

    fn poll_simulation(&mut self) {
        let received = match &self.pending {
            Some(rx) => rx.try_recv(),
            None => return,
        };
        match received {
            Ok(result) => {
                self.pending = None;
                self.apply_result(result);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                log::error!("solver thread exited without a result");
                self.pending = None;
                self.error = Some("solver thread exited without a result".to_string());
            }
        }
    }

    fn apply_result(&mut self, result: Result<Solution>) {
        match result {
            Ok(solution) => {
                self.solution = Some(solution);
                self.error = None;
                self.calculate_contours();
            }
            Err(e) => {
                log::error!("simulation failed: {e}");
                self.solution = None;
                self.contours.clear();
                self.error = Some(e.to_string());
            }
        }
    }

    fn calculate_contours(&mut self) {
        self.contours.clear();
        let Some(solution) = &self.solution else {
            return;
        };

        let field = &solution.outcome.field;
        self.min_psi = field.min();
        self.max_psi = field.max();
        self.contours = contour_levels(field, &solution.grid, self.contour_levels)
            .into_iter()
            .map(|(value, points)| ContourLevel { value, points })
            .collect();
    }

    fn level_to_color(&self, value: f64) -> egui::Color32 {
        let span = self.max_psi - self.min_psi;
        let t = if span > 0.0 { (value - self.min_psi) / span } else { 0.5 };
        let [r, g, b] = level_color(t);
        egui::Color32::from_rgb(r, g, b)
    }

    fn plot_pressure(&self, plot_ui: &mut egui_plot::PlotUi) {
        let Some(solution) = &self.solution else {
            return;
        };

        if self.show_numerical {
            let numerical = Line::new(PlotPoints::new(solution.numerical.points()))
                .color(egui::Color32::from_rgb(255, 100, 100))
                .width(2.0)
                .name("Cp numerical");
            plot_ui.line(numerical);
            plot_ui.points(
                Points::new(PlotPoints::new(solution.numerical.points()))
                    .color(egui::Color32::from_rgb(255, 100, 100))
                    .radius(2.5),
            );
        }

        if self.show_theory {
            let theory = Line::new(PlotPoints::new(solution.theoretical.points()))
                .color(egui::Color32::from_rgb(100, 100, 255))
                .width(2.0)
                .name("Cp theory");
            plot_ui.line(theory);
        }
    }

    fn plot_stream_function(&self, plot_ui: &mut egui_plot::PlotUi) {
        let Some(solution) = &self.solution else {
            return;
        };

        if self.show_contours {
            for level in &self.contours {
                plot_ui.points(
                    Points::new(PlotPoints::new(level.points.clone()))
                        .color(self.level_to_color(level.value))
                        .radius(1.0),
                );
            }
        }

        let grid = &solution.grid;
        let plate = &solution.plate;
        let x = grid.x_at(plate.px);
        let plate_line = Line::new(vec![
            [x, grid.y_at(plate.py)],
            [x, grid.y_at(plate.py + plate.points - 1)],
        ])
        .color(egui::Color32::DARK_RED)
        .width(3.0)
        .name("Plate");
        plot_ui.line(plate_line);
    }

    fn plot_residuals(&self, plot_ui: &mut egui_plot::PlotUi) {
        let Some(solution) = &self.solution else {
            return;
        };

        // log10 of the max-norm change; zero deltas have no logarithm
        let points: Vec<[f64; 2]> = solution
            .outcome
            .residuals
            .iter()
            .enumerate()
            .filter(|&(_, &d)| d > 0.0)
            .map(|(i, &d)| [(i + 1) as f64, d.log10()])
            .collect();

        plot_ui.line(
            Line::new(PlotPoints::new(points))
                .color(egui::Color32::from_rgb(80, 160, 80))
                .width(1.5)
                .name("log10 delta"),
        );

        let eps = self.config.flow.eps;
        if eps > 0.0 {
            let n = solution.outcome.iterations.max(1) as f64;
            plot_ui.line(
                Line::new(vec![[1.0, eps.log10()], [n, eps.log10()]])
                    .color(egui::Color32::from_rgba_premultiplied(100, 100, 100, 100))
                    .width(1.0)
                    .name("log10 eps"),
            );
        }
    }

    fn show_status(&self, ui: &mut egui::Ui) {
        if self.is_solving() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Solving...");
            });
        }
        if let Some(error) = &self.error {
            ui.colored_label(egui::Color32::RED, error);
            return;
        }
        let Some(solution) = &self.solution else {
            ui.label("Run simulation to see results");
            return;
        };

        ui.heading("Result");
        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    let outcome = &solution.outcome;
                    ui.label(format!("Status: {}", outcome.status));
                    ui.label(format!("Iterations: {}", outcome.iterations));
                    ui.label(format!("Last delta: {:.3e}", outcome.delta));
                    ui.label(format!("Time: {:.2} s", solution.elapsed.as_secs_f64()));
                    ui.label(format!(
                        "Plate: column {}, rows {}..{}",
                        solution.plate.px,
                        solution.plate.py,
                        solution.plate.py + solution.plate.points
                    ));
                });
            });
    }
}

impl eframe::App for PlateFlowViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_simulation();
        if self.is_solving() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        egui::SidePanel::left("controls").show(ctx, |ui| {
            ui.heading("Simulation Controls");

            let flow = &mut self.config.flow;
            ui.add(egui::Slider::new(&mut flow.alpha, -90.0..=90.0).text("Angle of Attack (°)"));
            ui.add(
                egui::Slider::new(&mut flow.eps, 1e-8..=1e-1)
                    .logarithmic(true)
                    .text("Tolerance"),
            );
            ui.add(egui::Slider::new(&mut flow.nx, 3..=200).text("NX"));
            ui.add(egui::Slider::new(&mut flow.ny, 3..=200).text("NY"));
            ui.add(egui::Slider::new(&mut flow.x_extent, 0.1..=5.0).text("X"));
            ui.add(egui::Slider::new(&mut flow.y_extent, 0.1..=5.0).text("Y"));

            let solver = &mut self.config.solver;
            egui::ComboBox::from_label("Update policy")
                .selected_text(format!("{:?}", solver.policy))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut solver.policy, UpdatePolicy::Jacobi, "Jacobi");
                    ui.selectable_value(&mut solver.policy, UpdatePolicy::GaussSeidel, "GaussSeidel");
                });
            egui::ComboBox::from_label("Plate condition")
                .selected_text(format!("{:?}", solver.plate))
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut solver.plate, PlateCondition::Initial, "Initial");
                    ui.selectable_value(&mut solver.plate, PlateCondition::Streamline, "Streamline");
                });

            let idle = !self.is_solving();
            if ui.add_enabled(idle, egui::Button::new("Run Simulation")).clicked() {
                self.run_simulation();
            }

            ui.separator();
            ui.checkbox(&mut self.show_numerical, "Show numerical Cp");
            ui.checkbox(&mut self.show_theory, "Show theoretical Cp");
            ui.checkbox(&mut self.show_contours, "Show streamlines");
            if ui
                .add(egui::Slider::new(&mut self.contour_levels, 5..=80).text("Levels"))
                .changed()
            {
                self.calculate_contours();
            }

            ui.separator();
            self.show_status(ui);

            ui.vertical(|ui| {
                ui.label("Stream function range:");
                ui.label(format!("Max: {:.3}", self.max_psi));
                ui.label(format!("Min: {:.3}", self.min_psi));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Pressure Coefficient");
            let half = ui.available_height() * 0.5;
            Plot::new("cp_plot")
                .legend(Legend::default())
                .height(half)
                .show(ui, |plot_ui| self.plot_pressure(plot_ui));

            ui.columns(2, |columns| {
                columns[0].label("Stream function");
                Plot::new("psi_plot")
                    .data_aspect(1.0)
                    .show(&mut columns[0], |plot_ui| self.plot_stream_function(plot_ui));

                columns[1].label("Convergence");
                Plot::new("residual_plot")
                    .legend(Legend::default())
                    .show(&mut columns[1], |plot_ui| self.plot_residuals(plot_ui));
            });
        });
    }
}

pub fn run(config: Config) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Plate Flow",
        options,
        Box::new(|cc| Box::new(PlateFlowViewer::new(cc, config))),
    )
}
