/// Volumetric light transport along a primary ray.
///
/// Walks the recorded march history from the far end back to index 1,
/// merging micro-steps until they span at least one pixel footprint, then
/// folds each enabled effect into the running colour and opacity in a fixed
/// order: glow, visible lights, fake lights, shadowed light shafts, distance
/// fog, three-band fog, iteration fog.

use crate::engine::types::{MarchStep, RenderStats, Rgb, Rgba, Vec3D};
use crate::lighting::material::LightSource;
use crate::lighting::params::AoMode;
use crate::lighting::shadow::iter_opacity;
use crate::lighting::{Shader, ShaderInput};
use crate::math::{math3d, utils};

/// Number of shadowed light-shaft slots: the main light plus four aux lights.
pub const VOLUMETRIC_LIGHT_SLOTS: usize = 5;

/// Running result of the integration. `colour.a` starts from the seed pixel;
/// `opacity` only counts the fog layers and starts at 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VolumeState {
    pub colour: Rgba,
    pub opacity: f64,
}

impl VolumeState {
    pub fn new(seed: Rgba) -> Self {
        Self { colour: seed, opacity: 0.0 }
    }

    /// Blend toward `fog` with `density` and grow both opacities.
    fn blend_fog(self, fog: &Rgb, density: f64) -> Self {
        let c = self.colour.rgb().mix(fog, density);
        Self {
            colour: c.with_alpha(density + (1.0 - density) * self.colour.a),
            opacity: density + (1.0 - density) * self.opacity,
        }
    }

    fn add_light(mut self, light: &Rgb, density: f64) -> Self {
        self.colour.r += light.r;
        self.colour.g += light.g;
        self.colour.b += light.b;
        self.colour.a += density;
        self
    }

    fn clamped(mut self) -> Self {
        self.opacity = self.opacity.min(1.0);
        self.colour.a = self.colour.a.min(1.0);
        self
    }
}

/// One coalesced step of the walk.
#[derive(Clone, Copy, Debug)]
struct StepContext<'a> {
    /// Sample at the step point with its own threshold
    input: ShaderInput<'a>,
    record: &'a MarchStep,
    /// Merged step length
    step: f64,
}

impl<'a> Shader<'a> {
    /// Integrate the volume in front of a surface or background sample.
    pub fn volumetric_shader(&self, input: &ShaderInput, seed: Rgba, stats: &mut RenderStats) -> VolumeState {
        let mut state = VolumeState::new(seed);
        let steps = input.steps;
        let glow = self.glow_amount(input.step_count());

        let mut total_step = 0.0;
        for index in (1..steps.len()).rev() {
            let record = &steps[index];
            total_step += record.step;
            if total_step < self.calc_delta(&record.point) {
                continue;
            }
            let ctx = StepContext {
                input: ShaderInput { point: record.point, dist_thresh: record.dist_thresh, ..*input },
                record,
                step: total_step,
            };
            total_step = 0.0;

            state = self.glow_effect(state, glow, steps.len());
            state = self.visible_lights_effect(state, &ctx, &input.view_vector);
            state = self.fake_lights_effect(state, &ctx);
            state = self.light_shafts_effect(state, &ctx, stats);
            state = self.basic_fog_effect(state, &ctx);
            state = self.volumetric_fog_effect(state, &ctx);
            state = self.iter_fog_effect(state, &ctx, stats);
            state = state.clamped();
        }
        state
    }

    /// Glow strength and colour for a ray of `step_count` steps.
    fn glow_amount(&self, step_count: usize) -> (f64, Rgb) {
        let g = &self.params.glow;
        let glow = step_count as f64 * g.intensity / 512.0 * self.params.quality.de_factor;
        let glow_n = (1.0 - glow).max(0.0);
        let colour = g.colour_1.scale(glow_n).add(&g.colour_2.scale(glow));
        (glow, colour)
    }

    fn glow_effect(&self, mut state: VolumeState, glow: (f64, Rgb), step_count: usize) -> VolumeState {
        if !self.params.glow.enabled {
            return state;
        }
        let (amount, colour) = glow;
        let opacity = (amount / step_count as f64).min(1.0);
        let c = state.colour.rgb().mix(&colour, opacity);
        state.colour = c.with_alpha(state.colour.a + opacity);
        state
    }

    /// Visible spheres around enabled aux lights. Mini-steps shrink near a
    /// light so the bell profile is resolved.
    fn visible_lights_effect(&self, mut state: VolumeState, ctx: &StepContext, view: &Vec3D) -> VolumeState {
        let aux = &self.params.aux_lights;
        if aux.visibility <= 0.0 {
            return state;
        }
        let enabled: Vec<&LightSource> = (0..self.lights.effective_count())
            .map(|i| self.lights.get(i))
            .filter(|l| l.enabled)
            .collect();
        let light_size = |intensity: f64| intensity.max(0.0).sqrt() * aux.visibility_size;
        let step = ctx.step;
        let point = ctx.record.point;

        let mut mini_steps = 0.0;
        let mut last_mini_steps = -1.0;
        while mini_steps < step {
            let sample = point - *view * mini_steps;

            let mut lowest_size = 1e10;
            let mut lowest_dist = 1e10;
            for light in &enabled {
                let size = light_size(light.intensity);
                let to_surface = (math3d::vec3d_length(&(sample - light.position)) - size).max(0.0);
                if to_surface <= lowest_dist {
                    if size < lowest_size {
                        lowest_size = size;
                    }
                    lowest_dist = to_surface;
                }
            }
            let mini_step = (0.1 * (lowest_dist + 0.1 * lowest_size)).min(step - mini_steps);

            for light in &enabled {
                let size = light_size(light.intensity) + 1e-30;
                let r = math3d::vec3d_length(&(sample - light.position)) / size;
                let bell = 1.0 / (1.0 + r.powi(4));
                let density = mini_step * bell * aux.visibility / size;
                state = state.add_light(&light.colour.scale(density), density);
            }

            if mini_steps == last_mini_steps {
                log::debug!("visible light march stalled at {mini_steps} of {step}");
                break;
            }
            last_mini_steps = mini_steps;
            mini_steps += mini_step;
        }
        state
    }

    /// Glow around orbit-trap minima.
    fn fake_lights_effect(&self, state: VolumeState, ctx: &StepContext) -> VolumeState {
        let f = &self.params.fake_lights;
        if !f.enabled {
            return state;
        }
        let q = &self.params.quality;
        let r = self.orbits.orbit(&ctx.record.point, q.min_n, q.n).orbit_trap_r;
        let r = (1.0 / (r + 1e-30)).sqrt();
        let exponent = 10.0 / f.visibility_size;
        let fake_light = 1.0 / (r.powf(exponent) * 10f64.powf(exponent) + 1e-100);
        let density = fake_light * ctx.step * f.visibility;
        state.add_light(&Rgb::gray(density), density)
    }

    /// Light scattered toward the camera from shadowed main and aux lights.
    fn light_shafts_effect(&self, mut state: VolumeState, ctx: &StepContext, stats: &mut RenderStats) -> VolumeState {
        let p = self.params;
        let vl = &p.volumetric_light;
        if !vl.any_enabled() {
            return state;
        }
        if vl.enabled[0] {
            let shadow = self.main_shadow(&ctx.input, stats).rgb();
            let k = ctx.step * vl.intensity[0];
            state = state.add_light(&shadow.mul(&p.main_light.colour).scale(k), shadow.average() * k);
        }
        for slot in 1..VOLUMETRIC_LIGHT_SLOTS {
            let light = self.lights.get(slot - 1);
            if !(light.enabled && vl.enabled[slot]) {
                continue;
            }
            let d = light.position - ctx.record.point;
            let distance = math3d::vec3d_length(&d);
            let light_vector = math3d::vec3d_normalized(&d);
            let visibility = self.aux_shadow(&ctx.input, distance, &light_vector, stats);
            let k = visibility * vl.intensity[slot] * ctx.step / (distance * distance + 1e-30);
            state = state.add_light(&light.colour.scale(k), k);
        }
        state
    }

    fn basic_fog_effect(&self, state: VolumeState, ctx: &StepContext) -> VolumeState {
        let fog = &self.params.fog;
        if !fog.enabled {
            return state;
        }
        let density = (ctx.step / fog.visibility).min(1.0);
        state.blend_fog(&fog.colour, density)
    }

    /// Fog concentrated near surfaces, coloured by distance across three
    /// stops.
    fn volumetric_fog_effect(&self, state: VolumeState, ctx: &StepContext) -> VolumeState {
        let v = &self.params.vol_fog;
        if !(v.enabled && v.density > 0.0) {
            return state;
        }
        let distance = ctx.record.distance;
        let reduce = v.distance_factor;
        let density_temp = (ctx.step * reduce) / (distance * distance + reduce * reduce + 1e-30);

        let k = (distance / v.colour_1_distance).min(1.0);
        let colour = v.colour_1.mix(&v.colour_2, k);
        let k2 = (distance / v.colour_2_distance * k).min(1.0);
        let colour = colour.mix(&v.colour_3, k2);

        let density = (0.3 * v.density * density_temp / (1.0 + v.density * density_temp)).min(1.0);
        state.blend_fog(&colour, density)
    }

    /// Fog whose density follows the iteration count, lit by the main light,
    /// the first four aux lights, and multi-ray ambient occlusion.
    fn iter_fog_effect(&self, mut state: VolumeState, ctx: &StepContext, stats: &mut RenderStats) -> VolumeState {
        let p = self.params;
        let f = &p.iter_fog;
        if !f.enabled {
            return state;
        }
        let iters = ctx.record.iters as f64;
        let opacity = iter_opacity(ctx.step, iters, p.quality.n as f64, f.opacity_trim, f.opacity);
        if opacity <= 0.0 {
            return state;
        }

        let k = utils::blend_factor(iters - f.opacity_trim, f.colour_1_maxiter - f.opacity_trim);
        let fog_colour = f.colour_1.mix(&f.colour_2, k);
        let k2 = utils::blend_factor(iters - f.colour_1_maxiter, f.colour_2_maxiter - f.colour_1_maxiter);
        let fog_colour = fog_colour.mix(&f.colour_3, k2);

        let mut light = Rgb::BLACK;
        if p.main_light.enabled && p.main_light.intensity > 0.0 {
            let shadow = self.main_shadow(&ctx.input, stats).rgb();
            light = light.add(&shadow.mul(&p.main_light.colour).scale(p.main_light.intensity));
        }
        for slot in 0..VOLUMETRIC_LIGHT_SLOTS - 1 {
            let aux = self.lights.get(slot);
            if !aux.enabled {
                continue;
            }
            let d = aux.position - ctx.record.point;
            let distance = math3d::vec3d_length(&d);
            let light_vector = math3d::vec3d_normalized(&d);
            let visibility = self.aux_shadow(&ctx.input, distance, &light_vector, stats);
            let k = visibility * aux.intensity * 100.0 / (distance * distance + 1e-30);
            light = light.add(&aux.colour.scale(k));
        }
        let ao = &p.ambient_occlusion;
        if ao.enabled && ao.mode == AoMode::MultipleRays {
            light = light.add(&self.ambient_occlusion(&ctx.input, stats).rgb().scale(ao.intensity));
        }

        let lit = light.mul(&fog_colour).scale(opacity);
        let c = state.colour.rgb().scale(1.0 - opacity).add(&lit);
        state.colour = c.with_alpha(opacity + (1.0 - opacity) * state.colour.a);
        state.opacity = opacity + (1.0 - opacity) * state.opacity;
        state
    }
}
