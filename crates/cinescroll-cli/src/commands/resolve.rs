use anyhow::Result;

use cinescroll_core::{resolve, Options};

use super::PageSetup;
use crate::Format;

pub fn run(options: &Options, page: &PageSetup, format: Format) -> Result<()> {
    let host = page.host(page.viewport.1 * 4.0);
    let config = resolve(options, &host);

    let rendered = match format {
        Format::Toml => toml::to_string_pretty(&config)?,
        Format::Json => serde_json::to_string_pretty(&config)?,
    };
    println!("{}", rendered);

    println!();
    println!("# smooth-scroll engine: {}", on_off(config.smooth_scroll_active()));
    println!("# scroll triggers:      {}", on_off(config.scroll_trigger_active()));
    println!("# reduced motion:       {}", on_off(config.motion_reduced()));

    Ok(())
}

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}
