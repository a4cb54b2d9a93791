//! NASA 7-coefficient ideal-gas thermodynamics.
//!
//! Each piece holds `a1..a7` such that
//! `cp/R = a1 + a2 T + a3 T^2 + a4 T^3 + a5 T^4`,
//! `h/RT = a1 + a2 T/2 + a3 T^2/3 + a4 T^3/4 + a5 T^4/5 + a6/T` and
//! `s/R = a1 ln T + a2 T + a3 T^2/2 + a4 T^3/3 + a5 T^4/4 + a7`.

use crate::error::{ChemError, ChemResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Nasa7 {
    /// `[t_min, t_mid, t_max]` for a two-piece fit.
    temperature_ranges: Vec<f64>,
    pieces: Vec<[f64; 7]>,
}

impl Nasa7 {
    pub fn new(temperature_ranges: Vec<f64>, pieces: Vec<[f64; 7]>) -> ChemResult<Self> {
        if pieces.is_empty() {
            return Err(ChemError::mechanism("NASA7 fit needs at least one piece"));
        }
        if temperature_ranges.len() != pieces.len() + 1 {
            return Err(ChemError::mechanism(format!(
                "NASA7 fit with {} pieces needs {} temperature bounds, got {}",
                pieces.len(),
                pieces.len() + 1,
                temperature_ranges.len()
            )));
        }
        if temperature_ranges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ChemError::mechanism(
                "NASA7 temperature bounds must be strictly increasing",
            ));
        }
        if pieces.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ChemError::mechanism("NASA7 coefficients must be finite"));
        }
        Ok(Self {
            temperature_ranges,
            pieces,
        })
    }

    /// Piece covering `t`. Temperatures outside the fitted range use the
    /// nearest piece.
    fn piece(&self, t: f64) -> &[f64; 7] {
        let interior = &self.temperature_ranges[1..self.temperature_ranges.len() - 1];
        let idx = interior.iter().take_while(|bound| t >= **bound).count();
        &self.pieces[idx]
    }

    pub fn cp_r(&self, t: f64) -> f64 {
        let a = self.piece(t);
        a[0] + t * (a[1] + t * (a[2] + t * (a[3] + t * a[4])))
    }

    pub fn h_rt(&self, t: f64) -> f64 {
        let a = self.piece(t);
        a[0] + t * (a[1] / 2.0 + t * (a[2] / 3.0 + t * (a[3] / 4.0 + t * a[4] / 5.0))) + a[5] / t
    }

    pub fn s_r(&self, t: f64) -> f64 {
        let a = self.piece(t);
        a[0] * t.ln() + t * (a[1] + t * (a[2] / 2.0 + t * (a[3] / 3.0 + t * a[4] / 4.0))) + a[6]
    }

    /// Standard-state Gibbs energy `g°/RT`.
    pub fn g_rt(&self, t: f64) -> f64 {
        self.h_rt(t) - self.s_r(t)
    }

    pub fn temperature_range(&self) -> (f64, f64) {
        (
            self.temperature_ranges[0],
            self.temperature_ranges[self.temperature_ranges.len() - 1],
        )
    }
}
