/// Main application entry point
/// Handles window creation, input, and render loop
use clap::Parser;
use glam::Vec3;
use mimalloc::MiMalloc;
use software_rasterizer::meshing::primitives;
use software_rasterizer::perf::FrameTimer;
use software_rasterizer::*;
use std::f32::consts::FRAC_PI_4;
use std::num::NonZeroU32;
use std::rc::Rc;
use winit::{
    event::*,
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowBuilder},
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const TITLE: &str = "Software Rasterizer";
/// Radians per second while rotation is enabled (45°/s).
const ROTATION_SPEED: f32 = FRAC_PI_4;
const MESH_POSITION: Vec3 = Vec3::new(0.0, 0.0, 50.0);
const SPHERE_RADIUS: f32 = 12.0;

type Surface = softbuffer::Surface<Rc<Window>, Rc<Window>>;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = AppConfig::parse();
    run(config).inspect_err(|err| log::error!("{err}"))
}

fn load_mesh(config: &AppConfig) -> Result<Mesh> {
    let mesh = match &config.obj {
        Some(path) => load_obj(path, config.obj_options())?,
        None => primitives::uv_sphere(SPHERE_RADIUS, 48, 24)?,
    };
    Ok(mesh.with_transform(MeshTransform {
        translation: MESH_POSITION,
        ..Default::default()
    }))
}

fn load_textures(config: &AppConfig) -> Result<MaterialTextures> {
    match &config.textures {
        Some(dir) => MaterialTextures::load(dir, &config.texture_prefix),
        None => {
            log::info!("No texture directory given, using a checkerboard");
            Ok(MaterialTextures::checker())
        }
    }
}

fn run(config: AppConfig) -> Result<()> {
    log::info!("Controls:");
    log::info!("  F2 rotation | F5 shading mode | F6 normal map | F7 depth view | F8 bounding boxes");
    log::info!("  F9 cull mode | F10 uniform background | F11 FPS in title");
    log::info!("  WASD move | Space/Shift up/down | left click + mouse look | Esc exit");

    let mut mesh = load_mesh(&config)?;
    let textures = load_textures(&config)?;

    let event_loop = EventLoop::new().map_err(RenderError::display)?;
    let window = Rc::new(
        WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .build(&event_loop)
            .map_err(RenderError::display)?,
    );

    let context = softbuffer::Context::new(window.clone()).map_err(RenderError::display)?;
    let mut surface = Surface::new(&context, window.clone()).map_err(RenderError::display)?;

    let window_size = window.inner_size();
    let mut framebuffer =
        Framebuffer::new(window_size.width as usize, window_size.height as usize);

    let aspect_ratio = window_size.width as f32 / window_size.height.max(1) as f32;
    let mut camera = Camera::new(Vec3::ZERO, aspect_ratio);
    let mut camera_controller = CameraController::new();

    let mut renderer = Renderer::default();
    let mut frame_config = config.frame_config();
    let mut rotating = config.rotate;
    let mut show_fps = true;
    let mut frame_timer = FrameTimer::new();
    let mut frames_rendered = 0u64;

    #[cfg(feature = "profiling")]
    let mut hardware_counters = software_rasterizer::perf::profiling::hardware::PerfCounters::new();
    #[cfg(feature = "profiling")]
    hardware_counters.enable_all();

    // Mouse state
    let mut mouse_captured = false;
    let mut last_mouse_pos: Option<(f64, f64)> = None;

    event_loop
        .run(move |event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        framebuffer.resize(new_size.width as usize, new_size.height as usize);
                        if new_size.height > 0 {
                            camera.set_aspect_ratio(new_size.width as f32 / new_size.height as f32);
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        let pressed = event.state == ElementState::Pressed;
                        let PhysicalKey::Code(keycode) = event.physical_key else {
                            return;
                        };
                        match keycode {
                            KeyCode::KeyW => camera_controller.forward_pressed = pressed,
                            KeyCode::KeyS => camera_controller.backward_pressed = pressed,
                            KeyCode::KeyA => camera_controller.left_pressed = pressed,
                            KeyCode::KeyD => camera_controller.right_pressed = pressed,
                            KeyCode::Space => camera_controller.up_pressed = pressed,
                            KeyCode::ShiftLeft => camera_controller.down_pressed = pressed,
                            _ if !pressed || event.repeat => {}
                            KeyCode::F2 => {
                                rotating = !rotating;
                                log::info!("Rotation: {}", on_off(rotating));
                            }
                            KeyCode::F5 => {
                                frame_config.shading_mode = frame_config.shading_mode.next();
                                log::info!("Shading mode: {}", frame_config.shading_mode.name());
                            }
                            KeyCode::F6 => {
                                frame_config.use_normal_map = !frame_config.use_normal_map;
                                log::info!("Normal map: {}", on_off(frame_config.use_normal_map));
                            }
                            KeyCode::F7 => {
                                frame_config.render_mode = frame_config.render_mode.toggle_depth_values();
                                log::info!("Render mode: {:?}", frame_config.render_mode);
                            }
                            KeyCode::F8 => {
                                frame_config.render_mode = frame_config.render_mode.toggle_bounding_box();
                                log::info!("Render mode: {:?}", frame_config.render_mode);
                            }
                            KeyCode::F9 => {
                                frame_config.cull_mode = frame_config.cull_mode.next();
                                log::info!("Cull mode: {:?}", frame_config.cull_mode);
                            }
                            KeyCode::F10 => {
                                frame_config.uniform_background = !frame_config.uniform_background;
                                log::info!("Uniform background: {}", on_off(frame_config.uniform_background));
                            }
                            KeyCode::F11 => {
                                show_fps = !show_fps;
                                if !show_fps {
                                    window.set_title(TITLE);
                                }
                            }
                            KeyCode::Escape => {
                                if mouse_captured {
                                    mouse_captured = false;
                                    last_mouse_pos = None;
                                    window.set_cursor_visible(true);
                                } else {
                                    elwt.exit();
                                }
                            }
                            _ => {}
                        }
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        if button == MouseButton::Left && state == ElementState::Pressed {
                            mouse_captured = true;
                            window.set_cursor_visible(false);
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        if mouse_captured {
                            if let Some(last_pos) = last_mouse_pos {
                                let delta_x = position.x - last_pos.0;
                                let delta_y = position.y - last_pos.1;
                                camera.rotate(delta_x as f32, delta_y as f32);
                            }
                            last_mouse_pos = Some((position.x, position.y));
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        let dt = frame_timer.tick();

                        camera_controller.update_camera(&mut camera, dt);
                        if rotating {
                            mesh.rotate_y(ROTATION_SPEED * dt);
                        }

                        renderer.render_frame(
                            &mut mesh,
                            &camera.matrices(),
                            &textures,
                            &frame_config,
                            &mut framebuffer,
                        );

                        if let Err(err) = present(&mut surface, &framebuffer) {
                            log::error!("{err}");
                            elwt.exit();
                            return;
                        }

                        if show_fps {
                            window.set_title(&format!("{TITLE} - {:.0} FPS", frame_timer.fps()));
                        }

                        frames_rendered += 1;
                        if config.max_frames.is_some_and(|max| frames_rendered >= max) {
                            log::info!("Rendered {frames_rendered} frames, exiting");
                            elwt.exit();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    window.request_redraw();
                }
                #[cfg(feature = "profiling")]
                Event::LoopExiting => {
                    hardware_counters.disable_all();
                    log::info!("Profile over {frames_rendered} frames:");
                    FUNCTION_COUNTERS.snapshot().log_report();
                    hardware_counters.read_all().log_report();
                }
                _ => {}
            }
        })
        .map_err(RenderError::display)
}

/// Copy the finished frame into the window surface. A minimized window
/// (zero-sized framebuffer) is skipped.
fn present(surface: &mut Surface, framebuffer: &Framebuffer) -> Result<()> {
    let (Some(width), Some(height)) = (
        NonZeroU32::new(framebuffer.width as u32),
        NonZeroU32::new(framebuffer.height as u32),
    ) else {
        return Ok(());
    };
    surface.resize(width, height).map_err(RenderError::display)?;

    let mut buffer = surface.buffer_mut().map_err(RenderError::display)?;
    buffer.copy_from_slice(framebuffer.color_buffer_slice());
    buffer.present().map_err(RenderError::display)
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "ON"
    } else {
        "OFF"
    }
}
