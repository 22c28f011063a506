//! Per-channel PID engine.
//!
//! Operates on a normalized error (setpoint and process variable divided by
//! the channel's full-scale thermocouple voltage) and produces a duty-cycle
//! output in [0, 1] for the burst-firing scheduler.
//!
//! - Derivative term is computed only when `kd > 0`, optionally through a
//!   single-pole low-pass filter with time constant `derivative_tau`.
//! - Integral term is computed only when `ki > 0`, with back-calculation
//!   anti-windup: the integrator absorbs the difference between the saturated
//!   and unconstrained outputs, so it cannot drift while the output is
//!   pinned at a limit.

/// Anti-windup back-calculation gain.
const KB: f32 = 1.0;

/// Samples closer together than this (seconds) are ignored. Guards the
/// derivative against division by a degenerate dt when a sample is retaken
/// within the same loop pass.
const MIN_DT_S: f32 = 0.001;

/// PID controller state for one channel.
#[derive(Debug, Clone)]
pub struct Pid {
    /// Proportional gain.
    pub kp: f32,
    /// Integral gain (1/Ti).
    pub ki: f32,
    /// Derivative gain (Td).
    pub kd: f32,
    /// Derivative low-pass filter time constant in seconds. Zero disables
    /// the filter.
    pub derivative_tau: f32,

    integral: f32,
    derivative_prev: f32,
    output: f32,
    output_min: f32,
    output_max: f32,
}

impl Pid {
    /// A controller with zero gains and output limits [0, 1].
    pub fn new() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            derivative_tau: 0.0,
            integral: 0.0,
            derivative_prev: 0.0,
            output: 0.0,
            output_min: 0.0,
            output_max: 1.0,
        }
    }

    /// The last saturated output.
    pub fn output(&self) -> f32 {
        self.output
    }

    /// Reset controller state.
    ///
    /// `derivative_seed` becomes the previous-error memory so the first
    /// derivative after re-enable does not see an artificial step.
    pub fn reset(&mut self, derivative_seed: f32) {
        self.integral = 0.0;
        self.derivative_prev = derivative_seed;
        self.output = 0.0;
    }

    /// Run one PID step on a fresh normalized error.
    ///
    /// Returns the new output, or `None` when `dt` fails the oversampling
    /// guard (state is untouched in that case).
    pub fn update(&mut self, error: f32, dt: f32) -> Option<f32> {
        if dt < MIN_DT_S {
            return None;
        }

        let p_term = self.kp * error;

        let mut d_term = 0.0;
        if self.kd > 0.0 {
            let derivative = if self.derivative_tau > 0.0 {
                let alpha = dt / (self.derivative_tau + dt);
                let filtered = alpha * error + (1.0 - alpha) * self.derivative_prev;
                let derivative = (filtered - self.derivative_prev) / dt;
                self.derivative_prev = filtered;
                derivative
            } else {
                let derivative = (error - self.derivative_prev) / dt;
                self.derivative_prev = error;
                derivative
            };
            d_term = self.kd * derivative;
        }

        let mut i_term = 0.0;
        if self.ki > 0.0 {
            // Unconstrained control signal with the current integrator.
            let unconstrained = p_term + self.ki * self.integral + d_term;
            // Back-calculate from the previous saturated output.
            let aw_correction = self.output - unconstrained;

            self.integral += (error + KB * aw_correction) * dt;
            self.integral = self
                .integral
                .clamp(self.output_min / self.ki, self.output_max / self.ki);

            i_term = self.ki * self.integral;
        }

        self.output = (p_term + i_term + d_term).clamp(self.output_min, self.output_max);
        Some(self.output)
    }
}

impl Default for Pid {
    fn default() -> Self {
        Self::new()
    }
}
