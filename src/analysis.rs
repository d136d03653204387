use crate::grid::Grid;
use crate::state::SimulationState;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FluidMetrics {
    pub frame: usize,
    /// Sum of the RGB dye channels over the whole grid
    pub total_dye: f64,
    pub max_dye: f32,
    pub total_kinetic_energy: f64,
    pub max_velocity: f32,
    pub avg_velocity: f32,
    /// Largest |∇·v| over interior cells
    pub max_divergence: f32,
    pub avg_divergence: f32,
    pub avg_vorticity: f32,
}

impl FluidMetrics {
    pub fn analyze(state: &SimulationState, frame: usize) -> Self {
        let velocity = state.velocity.front();
        let dye = state.dye.front();
        let grid_scale = state.config().grid_scale;

        let [r, g, b, _] = dye.sum();
        let max_dye = dye
            .cells()
            .iter()
            .map(|c| c.x.max(c.y).max(c.z))
            .fold(0.0, f32::max);

        let mut total_kinetic_energy = 0.0;
        let mut max_velocity: f32 = 0.0;
        let mut velocity_sum = 0.0;
        for cell in velocity.cells() {
            let speed_sq = cell.x * cell.x + cell.y * cell.y;
            total_kinetic_energy += 0.5 * f64::from(speed_sq);
            max_velocity = max_velocity.max(speed_sq.sqrt());
            velocity_sum += f64::from(speed_sq.sqrt());
        }
        let cells = (velocity.width() * velocity.height()) as f64;

        let divergence = interior_divergence(velocity, grid_scale);
        let vorticity = interior_vorticity(velocity, grid_scale);
        let mean_abs = |values: &[f32]| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().map(|v| v.abs()).sum::<f32>() / values.len() as f32
            }
        };

        Self {
            frame,
            total_dye: r + g + b,
            max_dye,
            total_kinetic_energy,
            max_velocity,
            avg_velocity: (velocity_sum / cells) as f32,
            max_divergence: divergence.iter().map(|v| v.abs()).fold(0.0, f32::max),
            avg_divergence: mean_abs(&divergence),
            avg_vorticity: mean_abs(&vorticity),
        }
    }

    pub fn print_summary(&self) {
        println!("Frame {} Metrics:", self.frame);
        println!("  Total Dye: {:.6}", self.total_dye);
        println!("  Max Dye: {:.6}", self.max_dye);
        println!("  Kinetic Energy: {:.6}", self.total_kinetic_energy);
        println!("  Max Velocity: {:.6}", self.max_velocity);
        println!("  Avg Velocity: {:.6}", self.avg_velocity);
        println!("  Max Divergence: {:.6}", self.max_divergence);
        println!("  Avg Divergence: {:.6}", self.avg_divergence);
        println!("  Avg Vorticity: {:.6}", self.avg_vorticity);
        println!();
    }
}

/// Central-difference divergence at every interior cell of a velocity grid,
/// in row-major order
pub fn interior_divergence(velocity: &Grid, grid_scale: f32) -> Vec<f32> {
    interior_stencil(velocity, |v, x, y| {
        (v.fetch(x + 1, y).x - v.fetch(x - 1, y).x + v.fetch(x, y + 1).y - v.fetch(x, y - 1).y)
            / (2.0 * grid_scale)
    })
}

/// Central-difference curl at every interior cell of a velocity grid
pub fn interior_vorticity(velocity: &Grid, grid_scale: f32) -> Vec<f32> {
    interior_stencil(velocity, |v, x, y| {
        (v.fetch(x + 1, y).y - v.fetch(x - 1, y).y - v.fetch(x, y + 1).x + v.fetch(x, y - 1).x)
            / (2.0 * grid_scale)
    })
}

fn interior_stencil(velocity: &Grid, stencil: impl Fn(&Grid, i32, i32) -> f32) -> Vec<f32> {
    let (width, height) = (velocity.width() as i32, velocity.height() as i32);
    let mut values = Vec::new();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            values.push(stencil(velocity, x, y));
        }
    }
    values
}

pub struct AnalysisRecorder {
    pub metrics_history: Vec<FluidMetrics>,
}

impl Default for AnalysisRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisRecorder {
    pub fn new() -> Self {
        Self {
            metrics_history: Vec::new(),
        }
    }

    pub fn record_frame(&mut self, state: &SimulationState, frame: usize) -> &FluidMetrics {
        let metrics = FluidMetrics::analyze(state, frame);
        self.metrics_history.push(metrics);
        &self.metrics_history[self.metrics_history.len() - 1]
    }

    /// Whole history as a JSON array
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.metrics_history)
    }

    pub fn print_trends(&self) {
        let (Some(first), Some(last)) = (self.metrics_history.first(), self.metrics_history.last())
        else {
            return;
        };
        if self.metrics_history.len() < 2 {
            return;
        }

        println!("=== TREND ANALYSIS ===");
        println!(
            "Dye change: {:.6} -> {:.6} ({:+.3}%)",
            first.total_dye,
            last.total_dye,
            (last.total_dye - first.total_dye) / first.total_dye.max(1e-9) * 100.0
        );
        println!(
            "Kinetic Energy change: {:.6} -> {:.6} ({:+.3}%)",
            first.total_kinetic_energy,
            last.total_kinetic_energy,
            (last.total_kinetic_energy - first.total_kinetic_energy)
                / first.total_kinetic_energy.max(0.001)
                * 100.0
        );
        println!(
            "Max divergence: {:.6} -> {:.6}",
            first.max_divergence, last.max_divergence
        );
    }
}
