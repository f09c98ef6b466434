pub const VOLUME_STEP: u8 = 10;
pub const MAX_VOLUME: u8 = 100;

/// Render a second count as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_time(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Move `volume` one step up or down, clamped to `0..=100`.
pub fn step_volume(volume: u8, up: bool) -> u8 {
    match up {
        true => volume.saturating_add(VOLUME_STEP).min(MAX_VOLUME),
        false => volume.saturating_sub(VOLUME_STEP),
    }
}
