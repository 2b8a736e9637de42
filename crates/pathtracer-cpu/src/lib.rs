//! CPU execution backend: builds the acceleration structures for a scene and
//! drives the light-transport estimator from a pool of worker threads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use pathtracer::accel::{BuildParams, BvhNode, LinearBvh};
use pathtracer::scene::{Camera, Scene};
use tracing::info;

mod accel;
mod geometry;
mod lights;
mod materials;
mod media;
mod ray;
mod sample;
mod tile;
mod tracer;


pub use media::RefractiveIndexTracker;
pub use sample::set_seed;
pub use tile::{Framebuffer, Pixel, Tile};

use ray::Ray;
use tracer::TraceContext;

#[derive(Debug, Clone, Copy)]
pub struct RaytracerSettings {
    /// Bounce budget per path; the estimator returns zero past it.
    pub max_bounces: i32,
    /// Indirect rays spawned per diffuse or glossy evaluation.
    pub scatter_rays: u32,
    /// Samples taken per pixel visit.
    pub samples_per_pixel: u32,
    /// A pixel is finished once it has accumulated this many samples.
    pub max_samples_per_pixel: u32,
    /// Far limit of every traced segment.
    pub max_trace_distance: f32,
    pub seed: u64,
}

impl Default for RaytracerSettings {
    fn default() -> Self {
        RaytracerSettings {
            max_bounces: 4,
            scatter_rays: 1,
            samples_per_pixel: 64,
            max_samples_per_pixel: 1024,
            max_trace_distance: 1000.0,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CpuBackendSettings {
    pub num_threads: usize,
}

impl Default for CpuBackendSettings {
    fn default() -> Self {
        CpuBackendSettings { num_threads: 16 }
    }
}

/// Render-wide telemetry. A handle is injected into the estimator rather
/// than living in a global so tests can observe one render in isolation.
#[derive(Debug, Default)]
pub struct RenderStats {
    rays_traced: AtomicU64,
}

impl RenderStats {
    pub(crate) fn count_ray(&self) {
        self.rays_traced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn rays_traced(&self) -> u64 {
        self.rays_traced.load(Ordering::Relaxed)
    }
}

fn generate_ray(camera: &Camera, width: usize, height: usize, x: u32, y: u32) -> Ray {
    // jitter within the pixel footprint
    let rx = (x as f32 + sample::sample_uniform()) / width as f32;
    let ry = (y as f32 + sample::sample_uniform()) / height as f32;

    let (origin, direction) = camera.primary_ray((rx - 0.5) * 2.0, (ry - 0.5) * 2.0);
    Ray::new(origin, direction)
}

fn render_worker(
    ctx: TraceContext<'_>,
    framebuffer: &Framebuffer,
    tile: &Tile,
    worker_index: usize,
    stop: &AtomicBool,
) {
    let settings = ctx.settings;
    sample::set_seed(settings.seed.wrapping_add(0x9e37_79b9 * worker_index as u64));

    loop {
        // the stop signal is observed between pixel visits, never mid-path;
        // in-flight estimator calls are short and bounded by the budget
        if stop.load(Ordering::Relaxed) {
            break;
        }

        let Some(index) = tile.noisiest_pixel(framebuffer, settings.max_samples_per_pixel) else {
            break;
        };
        let pixel = framebuffer.pixel(index);

        for _ in 0..settings.samples_per_pixel {
            let ray = generate_ray(
                &ctx.scene.camera,
                framebuffer.width,
                framebuffer.height,
                pixel.x,
                pixel.y,
            );
            let media = RefractiveIndexTracker::default();
            let color = tracer::radiance(
                &ctx,
                ray,
                settings.max_bounces,
                ray.direction,
                true,
                &media,
                1.0,
            );
            pixel.add_sample(color);
        }
    }
}

/// Renders `scene` into a fresh framebuffer. Builds the BVH, linearizes it,
/// and shares it read-only across `num_threads` workers, each owning one
/// tile of pixels and favoring its statistically noisiest ones. Raising
/// `stop` makes workers exit after their current pixel.
pub fn render(
    scene: &Scene,
    width: usize,
    height: usize,
    settings: RaytracerSettings,
    backend: CpuBackendSettings,
    stats: &RenderStats,
    stop: &AtomicBool,
) -> Framebuffer {
    let tree = BvhNode::build(&scene.geometry, &BuildParams::default());
    let bvh = LinearBvh::from_tree(&tree);
    info!(
        nodes = bvh.nodes.len(),
        triangles = bvh.triangles.len(),
        "acceleration structure ready"
    );

    let framebuffer = Framebuffer::new(width, height);
    let tiles = framebuffer.tiles(backend.num_threads);

    let ctx = TraceContext {
        scene,
        bvh: &bvh,
        settings: &settings,
        stats,
    };

    thread::scope(|scope| {
        for (worker_index, tile) in tiles.iter().enumerate() {
            let framebuffer = &framebuffer;
            scope.spawn(move || render_worker(ctx, framebuffer, tile, worker_index, stop));
        }
    });

    framebuffer
}
