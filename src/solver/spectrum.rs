//! Response-spectrum analysis
//!
//! Evaluates per-mode displacement responses u_i = Γ_i φ_i Sa(T_i) / ω_i²
//! against a tabulated acceleration spectrum and combines them with SRSS or
//! CQC.

use log::warn;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::results::{ModalResult, ModeStatus, SpectrumResult};

/// Modes with circular frequency below this are skipped rather than divided
/// by a vanishing ω².
const OMEGA_FLOOR: f64 = 1e-6;

/// Modal combination rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinationMethod {
    /// Square root of the sum of squares; appropriate for well-separated
    /// modes.
    Srss,
    /// Complete quadratic combination; accounts for correlation between
    /// closely spaced modes.
    Cqc,
}

/// A tabulated design spectrum: spectral acceleration against period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumTable {
    periods: Vec<f64>,
    accelerations: Vec<f64>,
}

impl SpectrumTable {
    /// Periods must be strictly ascending and paired one-to-one with
    /// acceleration ordinates.
    pub fn new(periods: Vec<f64>, accelerations: Vec<f64>) -> KernelResult<Self> {
        if periods.is_empty() {
            return Err(KernelError::InvalidSpectrum(
                "spectrum table is empty".to_string(),
            ));
        }
        if periods.len() != accelerations.len() {
            return Err(KernelError::InvalidSpectrum(format!(
                "{} periods but {} accelerations",
                periods.len(),
                accelerations.len()
            )));
        }
        if periods.windows(2).any(|w| w[1] <= w[0]) {
            return Err(KernelError::InvalidSpectrum(
                "periods must be strictly ascending".to_string(),
            ));
        }
        if periods
            .iter()
            .chain(accelerations.iter())
            .any(|v| !v.is_finite())
        {
            return Err(KernelError::InvalidSpectrum(
                "spectrum ordinates must be finite".to_string(),
            ));
        }
        Ok(Self {
            periods,
            accelerations,
        })
    }

    /// Linear interpolation on period, clamped to the endpoint ordinates
    /// outside the tabulated range.
    pub fn interpolate(&self, period: f64) -> f64 {
        let first = self.periods[0];
        let last = self.periods[self.periods.len() - 1];
        if period <= first {
            return self.accelerations[0];
        }
        if period >= last {
            return self.accelerations[self.accelerations.len() - 1];
        }

        let upper = self.periods.partition_point(|&t| t < period);
        let (t0, t1) = (self.periods[upper - 1], self.periods[upper]);
        let (a0, a1) = (self.accelerations[upper - 1], self.accelerations[upper]);
        a0 + (a1 - a0) * (period - t0) / (t1 - t0)
    }
}

/// Combine modal responses against a spectrum.
///
/// Modes whose ω is effectively zero are skipped and flagged in the
/// per-mode status array; the remaining modes participate in the
/// combination. Damping enters only the CQC correlation coefficients.
pub fn response_spectrum(
    modal: &ModalResult,
    table: &SpectrumTable,
    damping_ratio: f64,
    method: CombinationMethod,
) -> SpectrumResult {
    let n = modal.mode_shapes.nrows();
    let num_modes = modal.frequencies_hz.len();

    let mut per_mode = DMatrix::zeros(n, num_modes);
    let mut mode_status = Vec::with_capacity(num_modes);
    let mut omegas = Vec::with_capacity(num_modes);

    for i in 0..num_modes {
        let omega = 2.0 * std::f64::consts::PI * modal.frequencies_hz[i];
        omegas.push(omega);
        if !omega.is_finite() || omega < OMEGA_FLOOR {
            warn!("mode {} has near-zero frequency; skipped in spectrum combination", i + 1);
            mode_status.push(ModeStatus::SkippedZeroFrequency);
            continue;
        }
        mode_status.push(ModeStatus::Included);

        let acceleration = table.interpolate(modal.periods_s[i]);
        let scale = modal.participation[i] * acceleration / (omega * omega);
        let shape = modal.mode_shapes.column(i);
        for k in 0..n {
            per_mode[(k, i)] = scale * shape[k];
        }
    }

    let combined = match method {
        CombinationMethod::Srss => combine_srss(&per_mode, &mode_status),
        CombinationMethod::Cqc => combine_cqc(&per_mode, &mode_status, &omegas, damping_ratio),
    };

    SpectrumResult {
        combined_displacement: combined,
        per_mode_displacement: per_mode,
        mode_status,
        method,
        damping_ratio,
    }
}

fn combine_srss(per_mode: &DMatrix<f64>, status: &[ModeStatus]) -> DVector<f64> {
    let n = per_mode.nrows();
    let mut combined = DVector::zeros(n);
    for k in 0..n {
        let mut sum = 0.0;
        for (i, s) in status.iter().enumerate() {
            if *s == ModeStatus::Included {
                let u = per_mode[(k, i)];
                sum += u * u;
            }
        }
        combined[k] = sum.sqrt();
    }
    combined
}

fn combine_cqc(
    per_mode: &DMatrix<f64>,
    status: &[ModeStatus],
    omegas: &[f64],
    damping_ratio: f64,
) -> DVector<f64> {
    let n = per_mode.nrows();
    let num_modes = status.len();
    let included: Vec<usize> = (0..num_modes)
        .filter(|&i| status[i] == ModeStatus::Included)
        .collect();

    // Correlation coefficients depend only on the frequency ratios.
    let mut rho = DMatrix::zeros(num_modes, num_modes);
    for &i in &included {
        for &j in &included {
            rho[(i, j)] = cqc_correlation(omegas[i], omegas[j], damping_ratio);
        }
    }

    let mut negative_seen = false;
    let mut combined = DVector::zeros(n);
    for k in 0..n {
        let mut total = 0.0;
        for &i in &included {
            for &j in &included {
                total += rho[(i, j)] * per_mode[(k, i)] * per_mode[(k, j)];
            }
        }
        if total < 0.0 {
            negative_seen = true;
        }
        // The double sum is non-negative in theory; the absolute value
        // guards against floating-point loss.
        combined[k] = total.abs().sqrt();
    }
    if negative_seen {
        warn!("CQC inner sum went negative; result magnitudes may have lost precision");
    }
    combined
}

/// CQC cross-correlation ρ_ij with β = ω_j / ω_i; β = 1 on the diagonal
/// gives ρ = 1.
fn cqc_correlation(omega_i: f64, omega_j: f64, zeta: f64) -> f64 {
    let beta = omega_j / omega_i;
    let numerator = 8.0 * zeta * zeta * (1.0 + beta) * beta.powf(1.5);
    let denominator =
        (1.0 - beta * beta).powi(2) + 4.0 * zeta * zeta * beta * (1.0 + beta).powi(2);
    numerator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ModalStatus;
    use approx::assert_relative_eq;

    fn synthetic_modal(omegas: &[f64], n: usize) -> ModalResult {
        let num_modes = omegas.len();
        let two_pi = 2.0 * std::f64::consts::PI;
        let mut mode_shapes = DMatrix::zeros(n, num_modes);
        for i in 0..num_modes.min(n) {
            mode_shapes[(i, i)] = 1.0;
        }
        ModalResult {
            status: ModalStatus::Converged,
            node_ids: Vec::new(),
            frequencies_hz: omegas.iter().map(|w| w / two_pi).collect(),
            periods_s: omegas.iter().map(|w| two_pi / w).collect(),
            mode_shapes,
            participation: vec![1.0; num_modes],
            effective_mass: vec![1.0; num_modes],
            mass_ratio: vec![0.0; num_modes],
            cumulative_ratio: vec![0.0; num_modes],
            total_mass: num_modes as f64,
        }
    }

    #[test]
    fn interpolation_clamps_to_endpoints() {
        let table = SpectrumTable::new(vec![0.1, 0.5, 1.0], vec![2.0, 5.0, 3.0]).unwrap();
        assert_relative_eq!(table.interpolate(0.01), 2.0);
        assert_relative_eq!(table.interpolate(4.0), 3.0);
        assert_relative_eq!(table.interpolate(0.3), 3.5, epsilon = 1e-12);
        assert_relative_eq!(table.interpolate(0.75), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn table_rejects_unsorted_periods() {
        assert!(SpectrumTable::new(vec![0.5, 0.1], vec![1.0, 1.0]).is_err());
        assert!(SpectrumTable::new(vec![0.1], vec![1.0, 2.0]).is_err());
        assert!(SpectrumTable::new(vec![], vec![]).is_err());
    }

    #[test]
    fn srss_and_cqc_agree_for_well_separated_modes() {
        // Two-mode diagonal problem: K = diag(1, 100), M = I, so ω = [1, 10]
        // and the frequency ratio is 0.1.
        let modal = synthetic_modal(&[1.0, 10.0], 2);
        let table = SpectrumTable::new(vec![0.1, 10.0], vec![9.81, 9.81]).unwrap();

        let srss = response_spectrum(&modal, &table, 0.05, CombinationMethod::Srss);
        let cqc = response_spectrum(&modal, &table, 0.05, CombinationMethod::Cqc);

        assert_relative_eq!(srss.combined_displacement[0], 9.81, epsilon = 1e-9);
        assert_relative_eq!(srss.combined_displacement[1], 0.0981, epsilon = 1e-9);
        for k in 0..2 {
            let a = srss.combined_displacement[k];
            let b = cqc.combined_displacement[k];
            assert!((a - b).abs() <= 0.01 * a.abs().max(b.abs()));
        }
    }

    #[test]
    fn cqc_diagonal_correlation_is_one() {
        assert_relative_eq!(cqc_correlation(3.0, 3.0, 0.05), 1.0, epsilon = 1e-12);
        // Correlation decays for separated frequencies
        assert!(cqc_correlation(1.0, 10.0, 0.05) < 0.01);
    }

    #[test]
    fn zero_frequency_mode_is_skipped() {
        let modal = synthetic_modal(&[0.0, 5.0], 2);
        let table = SpectrumTable::new(vec![0.1, 10.0], vec![9.81, 9.81]).unwrap();
        let result = response_spectrum(&modal, &table, 0.05, CombinationMethod::Srss);

        assert_eq!(result.mode_status[0], ModeStatus::SkippedZeroFrequency);
        assert_eq!(result.mode_status[1], ModeStatus::Included);
        // The skipped mode contributes nothing anywhere
        assert_relative_eq!(result.combined_displacement[0], 0.0);
        assert!(result.combined_displacement[1] > 0.0);
    }
}
