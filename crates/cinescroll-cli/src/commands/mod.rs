pub mod easings;
pub mod resolve;
pub mod simulate;

use cinescroll_core::{HeadlessHost, Size};

/// Page geometry shared by the commands
pub struct PageSetup {
    pub viewport: (f64, f64),
    pub reduced_motion: bool,
}

impl PageSetup {
    /// Headless host with room for `content_height` pixels of content
    pub fn host(&self, content_height: f64) -> HeadlessHost {
        let (width, height) = self.viewport;
        HeadlessHost::new(
            Size::new(width, height),
            Size::new(width, content_height.max(height)),
        )
        .with_reduced_motion(self.reduced_motion)
    }
}

/// Parse `WIDTHxHEIGHT`
pub fn parse_size(value: &str) -> Result<(f64, f64), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid dimension '{}'", s))
    };
    Ok((parse(width)?, parse(height)?))
}
