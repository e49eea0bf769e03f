//! The layered dielectric medium that particles travel through.
//!
//! A stack is an ordered list of horizontal slabs spanning the visible
//! domain. The interior layers partition a fixed vertical span evenly, one
//! cell per configured refractive index, and two vacuum layers cap the
//! extremes so that every reachable y coordinate belongs to exactly one
//! layer. Each layer also records the nominal indices of its neighbours,
//! which is what a boundary crossing needs to apply Snell's law.
//!
//! Stacks are immutable once built. Reconfiguration replaces the whole
//! stack atomically rather than editing layers in place.

use anyhow::Result;

use crate::settings::{DOMAIN, LAMBDA_0, STACK_BOTTOM, STACK_TOP};


/// A horizontal slab of dielectric medium.
///
/// `y0` is the upper boundary and `yf` the lower one, with `y0 > yf`. A
/// point belongs to the layer iff `yf <= y < y0`. The nominal indices of
/// the neighbouring layers are stored alongside so a crossing can be
/// resolved without a second lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub n: f32,
    pub n_prev: f32,
    pub n_next: f32,
    pub y0: f32,
    pub yf: f32,
    pub dn_dlambda: f32,
}

/// Dispersion-corrected indices of a layer and its neighbours at a given
/// wavelength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerIndices {
    pub n: f32,
    pub n_prev: f32,
    pub n_next: f32,
}

impl Layer {
    /// Half-open interval membership test.
    pub fn contains(&self, y: f32) -> bool {
        y >= self.yf && y < self.y0
    }

    /// Evaluates the dispersion-corrected index of this layer and of its
    /// stored neighbours at `wavelength` nm.
    ///
    /// Vacuum stays at exactly 1 regardless of wavelength, and every other
    /// index is clamped to at least 1 so that a steep negative slope cannot
    /// produce an optically invalid medium.
    pub fn indices_at(&self, wavelength: f32) -> LayerIndices {
        let effective = |n: f32| -> f32 {
            if n == 1.0 {
                1.0
            } else {
                (n + (wavelength - LAMBDA_0) * self.dn_dlambda).max(1.0)
            }
        };
        LayerIndices {
            n: effective(self.n),
            n_prev: effective(self.n_prev),
            n_next: effective(self.n_next),
        }
    }
}

/// An immutable stack of contiguous layers covering the visible domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    layers: Vec<Layer>,
}

impl Stack {
    /// Builds a stack from the configured interior indices and a shared
    /// dispersion coefficient.
    ///
    /// The interior layers split `[STACK_TOP, STACK_BOTTOM]` evenly, and two
    /// vacuum layers extend the stack to the visible bounds. Fails if the
    /// index list is empty or contains a non-positive value.
    pub fn build(indices: &[f32], dispersion: f32) -> Result<Self> {
        if indices.is_empty() {
            anyhow::bail!("Cannot build a stack from an empty index list");
        }
        if let Some(n) = indices.iter().find(|n| **n <= 0.0) {
            anyhow::bail!("Refractive index must be positive, got {}", n);
        }

        let cell = (STACK_BOTTOM - STACK_TOP) / indices.len() as f32;
        let mut layers = Vec::with_capacity(indices.len() + 2);

        layers.push(Layer {
            n: 1.0,
            n_prev: 1.0,
            n_next: indices[0],
            y0: DOMAIN,
            yf: STACK_TOP,
            dn_dlambda: dispersion,
        });

        for (i, &n) in indices.iter().enumerate() {
            let n_prev = if i == 0 { 1.0 } else { indices[i - 1] };
            let n_next = if i == indices.len() - 1 {
                1.0
            } else {
                indices[i + 1]
            };
            layers.push(Layer {
                n,
                n_prev,
                n_next,
                y0: STACK_TOP + cell * i as f32,
                yf: STACK_TOP + cell * (i + 1) as f32,
                dn_dlambda: dispersion,
            });
        }

        layers.push(Layer {
            n: 1.0,
            n_prev: indices[indices.len() - 1],
            n_next: 1.0,
            y0: STACK_BOTTOM,
            yf: -DOMAIN,
            dn_dlambda: dispersion,
        });

        Ok(Self { layers })
    }

    /// Returns the unique layer containing `y`, or `None` outside the
    /// stack's span. The outer vacuum layers cover the whole visible
    /// domain, so a live particle always locates successfully.
    pub fn locate(&self, y: f32) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.contains(y))
    }

    /// The layers in stack order, topmost first.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}
