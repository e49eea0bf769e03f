//! Wavelength to display-color mapping for presentation layers.
//!
//! Pure presentation helper with no role in the physics: callers use it to
//! tint particle markers by wavelength. Piecewise-linear hue ramp with a
//! gamma correction, based on the approximation by Dan Bruton
//! (http://www.physics.sfasu.edu/astro/color/spectra.html).

/// Gamma correction exponent applied to each channel.
pub const GAMMA: f32 = 0.8;


/// Converts a wavelength in nm to an approximate normalized RGB triple.
///
/// Defined over 380 to 750 nm; wavelengths outside the band map to black.
/// The violet and deep-red ends are attenuated towards black.
pub fn wavelength_to_rgb(wavelength: f32) -> [f32; 3] {
    let (r, g, b) = if (380.0..=440.0).contains(&wavelength) {
        let attenuation = 0.3 + 0.7 * (wavelength - 380.0) / (440.0 - 380.0);
        (
            ((-(wavelength - 440.0) / (440.0 - 380.0)) * attenuation).powf(GAMMA),
            0.0,
            (1.0 * attenuation).powf(GAMMA),
        )
    } else if (440.0..=490.0).contains(&wavelength) {
        (
            0.0,
            ((wavelength - 440.0) / (490.0 - 440.0)).powf(GAMMA),
            1.0,
        )
    } else if (490.0..=510.0).contains(&wavelength) {
        (
            0.0,
            1.0,
            ((-(wavelength - 510.0)) / (510.0 - 490.0)).powf(GAMMA),
        )
    } else if (510.0..=580.0).contains(&wavelength) {
        (
            ((wavelength - 510.0) / (580.0 - 510.0)).powf(GAMMA),
            1.0,
            0.0,
        )
    } else if (580.0..=645.0).contains(&wavelength) {
        (
            1.0,
            ((-(wavelength - 645.0)) / (645.0 - 580.0)).powf(GAMMA),
            0.0,
        )
    } else if (645.0..=750.0).contains(&wavelength) {
        let attenuation = 0.3 + 0.7 * (750.0 - wavelength) / (750.0 - 645.0);
        ((1.0 * attenuation).powf(GAMMA), 0.0, 0.0)
    } else {
        (0.0, 0.0, 0.0)
    };
    [r, g, b]
}
