use std::sync::Arc;

use anyhow::{bail, Result};

use cinescroll_core::triggers::TriggerOutput;
use cinescroll_core::{
    Coordinator, FadeInOptions, Host, LinkedValueOptions, Options, Orientation, ParallaxOptions,
    Rect, ScrollInput, ScrollPosition, TriggerHandle,
};

use super::PageSetup;

pub async fn run(
    mut options: Options,
    page: &PageSetup,
    scroll: f64,
    frames: u32,
    every: u32,
) -> Result<()> {
    let (width, vh) = page.viewport;
    let content = vh * 6.0;
    let host = Arc::new(page.host(content));

    let body = host.add_element(None, Rect::new(0.0, 0.0, width, content));
    let hero = host.add_element(Some(body), Rect::new(0.0, vh * 1.5, width, vh * 0.5));
    let card = host.add_element(Some(body), Rect::new(0.0, vh * 2.2, width, vh * 0.4));
    let meter = host.add_element(Some(body), Rect::new(0.0, vh * 3.0, width, vh * 0.2));
    let panel = host.add_element(Some(body), Rect::new(0.0, vh * 0.5, width * 0.3, vh * 0.6));
    let panel_item = host.add_element(Some(panel), Rect::new(0.0, vh * 0.6, width * 0.3, 40.0));

    // Frames are pumped below so the run is deterministic
    options.smooth.get_or_insert_with(Default::default).auto_raf = Some(false);

    let coordinator = Coordinator::new(host.clone());
    let session = coordinator.initialize(options).await;
    let Some(config) = session.config() else {
        println!("Initialization failed, the page would run without animations");
        return Ok(());
    };
    let interval_ms = config.smooth.frame_interval_ms() as f64;

    println!("Session:");
    println!("  initialized:    {}", session.is_initialized);
    println!("  fully active:   {}", session.is_fully_active());
    println!("  smooth engine:  {}", session.engine.is_some());
    println!("  reduced motion: {}", config.motion_reduced());
    println!();

    let triggers: Vec<(&str, Option<TriggerHandle>)> = vec![
        ("parallax", coordinator.parallax(hero, ParallaxOptions::default())),
        ("fade-in", coordinator.fade_in(card, FadeInOptions::default())),
        (
            "linked",
            coordinator.linked_value(
                meter,
                LinkedValueOptions {
                    end_value: 100.0,
                    easing: "power2.inOut".to_string(),
                    ..Default::default()
                },
            ),
        ),
    ];
    for (name, handle) in &triggers {
        if handle.is_none() {
            println!("  {} trigger not registered (disabled)", name);
        }
    }

    if let Some(zone) = coordinator.register_zone(panel, Orientation::Vertical) {
        let inside = coordinator.handle_input(&ScrollInput::wheel(panel_item, 0.0, 120.0));
        println!(
            "Wheel inside nested zone {:?}: vertical {:?}",
            zone.id(),
            inside.vertical
        );
    }

    let disposition = coordinator.handle_input(&ScrollInput::wheel(body, 0.0, scroll));
    if !disposition.prevents_default() {
        // Nothing intercepted the wheel: the document scrolls natively
        let target = ScrollPosition {
            x: 0.0,
            y: scroll.clamp(0.0, content - vh),
        };
        host.set_scroll_position(target);
        coordinator.handle_native_scroll(target);
    }
    println!("Wheel {:+.0}px on the page: {:?}", scroll, disposition.vertical);
    println!();

    let every = every.max(1);
    for frame in 0..=frames {
        coordinator.tick(frame as f64 * interval_ms);
        if frame % every == 0 || frame == frames {
            print_frame(frame, host.scroll_position().y, &triggers);
        }
    }

    coordinator.destroy();
    let diagnostics = coordinator.diagnostics();
    let listeners = host.live_listeners();
    println!();
    println!("After destroy: {}", serde_json::to_string(&diagnostics)?);
    println!("  live listeners: {}", listeners);

    let leaked = diagnostics.smooth_engines
        + diagnostics.trigger_engines
        + diagnostics.frame_loops
        + diagnostics.triggers
        + diagnostics.zones
        + listeners;
    if leaked > 0 {
        bail!("Teardown left {} live resources behind", leaked);
    }
    for element in [hero, card, meter] {
        if host.has_inline_style(element) {
            bail!("Inline styles survived teardown on {:?}", element);
        }
    }

    Ok(())
}

fn print_frame(frame: u32, scroll_y: f64, triggers: &[(&str, Option<TriggerHandle>)]) {
    let mut line = format!("frame {:>4}  y={:>7.1}", frame, scroll_y);
    for (name, handle) in triggers {
        let Some(state) = handle.as_ref().and_then(TriggerHandle::state) else {
            continue;
        };
        let value = match state.output {
            TriggerOutput::Parallax { offset } => format!("offset={:.1}", offset),
            TriggerOutput::FadeIn {
                opacity,
                translate_y,
                ..
            } => format!("opacity={:.2} dy={:.1}", opacity, translate_y),
            TriggerOutput::LinkedValue { value, .. } => format!("value={:.1}", value),
        };
        line.push_str(&format!("  {}[{:.2}] {}", name, state.progress, value));
    }
    println!("{}", line);
}
