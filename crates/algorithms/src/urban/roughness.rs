//! Roughness lengths and displacement heights
//!
//! Three families are provided:
//! - Grimmond & Oke (1999) rule of thumb: `z0 = 0.1 h`, `d = 0.67 h`
//! - Raupach (1994), driven by the frontal area index
//! - Macdonald et al. (1998), driven by plan area fraction and frontal area index

use naturf_core::Settings;

/// A roughness length with its displacement height
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoughnessPair {
    pub roughness_length: f64,
    pub displacement_height: f64,
}

/// Grimmond & Oke rule-of-thumb values
pub fn grimmond_oke(height: f64) -> RoughnessPair {
    RoughnessPair {
        roughness_length: 0.1 * height,
        displacement_height: 0.67 * height,
    }
}

/// Raupach displacement height and roughness length for one frontal area index.
///
/// ```text
/// x     = sqrt(c_d1 * 2 * λf)
/// d / h = 1 - (1 - exp(-x)) / x
/// u*/U  = min(sqrt(C_S + C_R * λf), (u*/U)max)
/// z0    = h * (1 - d/h) * exp(-κ / (u*/U) + ψ_h)
/// ```
///
/// A direction without walls (`λf = 0`) yields zeros.
pub fn raupach(height: f64, frontal_area_index: f64, settings: &Settings) -> RoughnessPair {
    if !(frontal_area_index > 0.0) {
        return RoughnessPair::default();
    }
    let x = (settings.raupach_displacement_constant * 2.0 * frontal_area_index).sqrt();
    let d_over_h = 1.0 - (1.0 - (-x).exp()) / x;

    let ustar_u = (settings.drag_coefficient_substrate
        + settings.drag_coefficient_roughness * frontal_area_index)
        .sqrt()
        .min(settings.max_friction_velocity_ratio);
    let z0 = height
        * (1.0 - d_over_h)
        * (-settings.von_karman_constant / ustar_u + settings.psi_k).exp();

    RoughnessPair {
        roughness_length: z0,
        displacement_height: height * d_over_h,
    }
}

/// Macdonald displacement height: `d / h = 1 + α^(-λp) (λp - 1)`
pub fn macdonald_displacement_height(height: f64, plan_area_fraction: f64, settings: &Settings) -> f64 {
    let d_over_h = 1.0
        + settings.alpha_coefficient.powf(-plan_area_fraction) * (plan_area_fraction - 1.0);
    height * d_over_h
}

/// Macdonald roughness length for one frontal area index.
///
/// ```text
/// z0 / h = (1 - d/h) * exp(-(0.5 β C_D / κ² (1 - d/h) λf)^(-1/2))
/// ```
///
/// A direction without walls (`λf = 0`) yields zero.
pub fn macdonald_roughness_length(
    height: f64,
    displacement_height: f64,
    frontal_area_index: f64,
    settings: &Settings,
) -> f64 {
    if !(frontal_area_index > 0.0) {
        return 0.0;
    }
    let one_minus = 1.0 - displacement_height / height;
    let kappa = settings.von_karman_constant;
    let drag = 0.5 * settings.beta_coefficient * settings.obstacle_drag_coefficient / (kappa * kappa);
    height * one_minus * (-(drag * one_minus * frontal_area_index).powf(-0.5)).exp()
}
