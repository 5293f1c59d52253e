//! A headless frame loop: spawn, move, draw, despawn.
//!
//! Run with `RUST_LOG=drift=debug` (or `trace`) to see arena and slot
//! store activity:
//!
//! ```text
//! RUST_LOG=trace cargo run -p drift --example frame_loop
//! ```

use drift::prelude::*;
use drift_test_utils::fixtures::standard_table;
use drift_test_utils::RecordingVertexBuffers;
use glam::{Mat4, Vec2};
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAMES: u64 = 300;
const ASTEROIDS: usize = 40;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut platform = RecordingVertexBuffers::new();
    let renderables = standard_table(&mut platform)?;
    let mut memory = FrameMemory::new(FrameConfig::default())?;
    let projection = Mat4::orthographic_rh(-50.0, 50.0, -50.0, 50.0, -1.0, 1.0);

    let (ship, _) = memory.create_entity(RenderableKind::Ship)?;
    let mut asteroids: Vec<EntityId> = Vec::new();
    let mut lasers: Vec<(EntityId, u64)> = Vec::new();

    for _ in 0..FRAMES {
        let frame = memory.begin_frame();

        while asteroids.len() < ASTEROIDS {
            let (_, rock) = memory.create_entity(RenderableKind::Asteroid)?;
            let t = rock.id as f32;
            rock.position = Vec2::new(t.sin() * 40.0, t.cos() * 40.0);
            rock.velocity = -rock.position * 0.4;
            rock.angular_velocity = 0.3;
            rock.scale = 2.0;
            asteroids.push(rock.id);
        }

        // Fire every 10 frames; lasers live for 60.
        if frame % 10 == 0 {
            let heading = memory.entity(ship)?.rotation;
            let (_, laser) = memory.create_entity(RenderableKind::Laser)?;
            laser.velocity = Vec2::from_angle(heading).rotate(Vec2::Y) * 30.0;
            laser.scale = 0.2;
            lasers.push((laser.id, frame));
        }
        while let Some(&(id, born)) = lasers.first() {
            if frame - born < 60 {
                break;
            }
            memory.destroy_entity(id)?;
            lasers.remove(0);
        }
        // Asteroids that reach the centre are replaced next frame.
        let parts = memory.parts();
        let mut arrived = Vec::new();
        for &id in &asteroids {
            if parts.entities.get(parts.persistent, id)?.position.length() < 2.0 {
                arrived.push(id);
            }
        }
        for id in arrived {
            memory.destroy_entity(id)?;
            asteroids.retain(|&a| a != id);
        }

        memory.entity_mut(ship)?.rotate(0.02);
        memory.update(1.0 / 60.0)?;

        memory.push_command(SetOptions::new(FillMode::Fill))?;
        memory.set_view(projection)?;
        memory.draw_entities(&renderables, Some(ship.id()))?;
        memory.draw_bounds(&renderables)?;

        let mut vertices = 0;
        for node in memory.commands() {
            match node?.decode()? {
                RenderCommand::DrawTriangles(d) => vertices += d.vertex_count,
                RenderCommand::DrawPolyline(p) => vertices += p.vertex_count,
                _ => {}
            }
        }

        if frame % 60 == 0 {
            let stats = memory.stats();
            info!(
                frame,
                entities = stats.entities,
                commands = stats.commands,
                vertices,
                scratch_used = stats.scratch_used,
                persistent_used = stats.persistent_used,
                "frame"
            );
        }
    }

    let stats = memory.stats();
    info!(
        frames = stats.frame,
        scratch_high_water = stats.scratch_high_water,
        entity_pages = stats.entity_pages,
        vertex_buffers = platform.count(),
        "done"
    );
    Ok(())
}
