use crate::grid::Grid;
use crate::render::Renderer;
use crate::simulation::Simulation;
use crate::executor::PassExecutor;
use std::path::Path;

pub struct ImageExporter {
    renderer: Renderer,
}

impl ImageExporter {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            renderer: Renderer::new(width, height),
        }
    }

    pub fn export_dye_png(&self, dye: &Grid, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let img = self.renderer.render_dye(dye);
        img.save(path)?;
        Ok(())
    }

    pub fn export_velocity_png(
        &self,
        velocity: &Grid,
        max_speed: f32,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let img = self.renderer.render_velocity(velocity, max_speed);
        img.save(path)?;
        Ok(())
    }

    /// Dump a grid as raw little-endian f32 RGBA cells
    pub fn export_raw(&self, grid: &Grid, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, grid.as_bytes())?;
        Ok(())
    }

    /// Step a simulation `steps` times at a fixed timestep, saving the dye
    /// after every step
    pub fn export_frame_sequence<E: PassExecutor>(
        &self,
        simulation: &mut Simulation<E>,
        steps: usize,
        dt: f32,
        output_dir: &Path,
        prefix: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        for i in 0..steps {
            simulation.advance(dt)?;

            let filename = format!("{}_frame_{:04}.png", prefix, i);
            let path = output_dir.join(filename);

            self.export_dye_png(simulation.current_dye(), &path)?;
        }
        Ok(())
    }
}
