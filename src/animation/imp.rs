//! Built-in animation catalog for the imp assistant sprite
//!
//! Frame offsets index a 124x93 cell grid on the `imp/map.png` sheet: one row
//! per animation, columns in play order.

use super::catalog::AnimationCatalog;
use super::types::{AnimationResult, Frame};

/// Sprite name the imp catalog is registered under
pub const IMP_SPRITE: &str = "Imp";
/// Sprite sheet reference handed to the asset resolver
pub const IMP_SHEET: &str = "imp/map.png";
pub const FRAME_WIDTH: u32 = 124;
pub const FRAME_HEIGHT: u32 = 93;

pub const REST_POSE: &str = "RestPose";
pub const GREETING: &str = "Greeting";
pub const GOODBYE: &str = "GoodBye";
pub const IDLE: &str = "Idle";
pub const IDLE_SIDE_TO_SIDE: &str = "IdleSideToSide";
pub const IDLE_FINGER_TAP: &str = "IdleFingerTap";
pub const IDLE_HEAD_SCRATCH: &str = "IdleHeadScratch";
pub const IDLE_EYEBROW_RAISE: &str = "IdleEyeBrowRaise";
pub const GET_TECHY: &str = "GetTechy";
pub const GET_ARTSY: &str = "GetArtsy";
pub const SEARCHING: &str = "Searching";
pub const CHECKING_SOMETHING: &str = "CheckingSomething";
pub const EXPLAIN: &str = "Explain";
pub const GET_ATTENTION: &str = "GetAttention";
pub const CONGRATULATE: &str = "Congratulate";
pub const ALERT: &str = "Alert";
pub const WRITING: &str = "Writing";
pub const THINKING: &str = "Thinking";

/// Animations cycled through while idle
pub const IDLE_VARIETY: [&str; 5] = [
    IDLE,
    IDLE_SIDE_TO_SIDE,
    IDLE_FINGER_TAP,
    IDLE_HEAD_SCRATCH,
    IDLE_EYEBROW_RAISE,
];

/// Animations played for mischief, in rotation
pub const MISCHIEF: [&str; 4] = [GET_TECHY, GET_ARTSY, SEARCHING, CHECKING_SOMETHING];

const fn cell(col: i32, row: i32, duration_ms: u32) -> Frame {
    Frame::new(col * FRAME_WIDTH as i32, row * FRAME_HEIGHT as i32, duration_ms)
}

const REST_POSE_FRAMES: &[Frame] = &[
    cell(0, 0, 100),
];

const GREETING_FRAMES: &[Frame] = &[
    cell(0, 1, 100),
    cell(1, 1, 100),
    cell(2, 1, 100),
    cell(3, 1, 100),
    cell(4, 1, 100),
    cell(5, 1, 150),
    cell(6, 1, 150),
    cell(7, 1, 200),
    cell(8, 1, 200),
    cell(9, 1, 300),
];

const GOODBYE_FRAMES: &[Frame] = &[
    cell(0, 2, 100),
    cell(1, 2, 100),
    cell(2, 2, 100),
    cell(3, 2, 100),
    cell(4, 2, 150),
    cell(5, 2, 150),
    cell(6, 2, 200),
    cell(7, 2, 300),
];

const IDLE_FRAMES: &[Frame] = &[
    cell(0, 3, 800),
    cell(1, 3, 100),
    cell(2, 3, 100),
    cell(3, 3, 100),
    cell(4, 3, 800),
];

const IDLE_SIDE_TO_SIDE_FRAMES: &[Frame] = &[
    cell(0, 4, 200),
    cell(1, 4, 200),
    cell(2, 4, 200),
    cell(3, 4, 200),
    cell(4, 4, 200),
    cell(5, 4, 200),
    cell(6, 4, 400),
];

const IDLE_FINGER_TAP_FRAMES: &[Frame] = &[
    cell(0, 5, 150),
    cell(1, 5, 150),
    cell(2, 5, 150),
    cell(3, 5, 150),
    cell(4, 5, 150),
    cell(5, 5, 150),
    cell(6, 5, 150),
    cell(7, 5, 150),
    cell(8, 5, 600),
];

const IDLE_HEAD_SCRATCH_FRAMES: &[Frame] = &[
    cell(0, 6, 200),
    cell(1, 6, 120),
    cell(2, 6, 120),
    cell(3, 6, 120),
    cell(4, 6, 120),
    cell(5, 6, 120),
    cell(6, 6, 120),
    cell(7, 6, 400),
];

const IDLE_EYEBROW_RAISE_FRAMES: &[Frame] = &[
    cell(0, 7, 300),
    cell(1, 7, 100),
    cell(2, 7, 600),
    cell(3, 7, 100),
    cell(4, 7, 300),
];

const GET_TECHY_FRAMES: &[Frame] = &[
    cell(0, 8, 100),
    cell(1, 8, 100),
    cell(2, 8, 100),
    cell(3, 8, 100),
    cell(4, 8, 100),
    cell(5, 8, 100),
    cell(6, 8, 200),
    cell(7, 8, 200),
    cell(8, 8, 200),
    cell(9, 8, 200),
    cell(10, 8, 200),
    cell(11, 8, 200),
    cell(12, 8, 200),
    cell(13, 8, 200),
    cell(14, 8, 400),
    cell(15, 8, 100),
    cell(16, 8, 100),
    cell(17, 8, 600),
];

const GET_ARTSY_FRAMES: &[Frame] = &[
    cell(0, 9, 120),
    cell(1, 9, 120),
    cell(2, 9, 120),
    cell(3, 9, 120),
    cell(4, 9, 120),
    cell(5, 9, 120),
    cell(6, 9, 120),
    cell(7, 9, 120),
    cell(8, 9, 120),
    cell(9, 9, 120),
    cell(10, 9, 300),
    cell(11, 9, 300),
    cell(12, 9, 300),
    cell(13, 9, 300),
    cell(14, 9, 300),
    cell(15, 9, 500),
];

const SEARCHING_FRAMES: &[Frame] = &[
    cell(0, 10, 150),
    cell(1, 10, 150),
    cell(2, 10, 150),
    cell(3, 10, 150),
    cell(4, 10, 150),
    cell(5, 10, 150),
    cell(6, 10, 150),
    cell(7, 10, 150),
    cell(8, 10, 150),
    cell(9, 10, 150),
    cell(10, 10, 150),
    cell(11, 10, 150),
    cell(12, 10, 150),
    cell(13, 10, 150),
    cell(14, 10, 450),
];

const CHECKING_SOMETHING_FRAMES: &[Frame] = &[
    cell(0, 11, 200),
    cell(1, 11, 200),
    cell(2, 11, 200),
    cell(3, 11, 200),
    cell(4, 11, 200),
    cell(5, 11, 200),
    cell(6, 11, 200),
    cell(7, 11, 200),
    cell(8, 11, 200),
    cell(9, 11, 600),
    cell(10, 11, 600),
];

const EXPLAIN_FRAMES: &[Frame] = &[
    cell(0, 12, 100),
    cell(1, 12, 100),
    cell(2, 12, 150),
    cell(3, 12, 150),
    cell(4, 12, 200),
    cell(5, 12, 700),
];

const GET_ATTENTION_FRAMES: &[Frame] = &[
    cell(0, 13, 100),
    cell(1, 13, 100),
    cell(2, 13, 100),
    cell(3, 13, 100),
    cell(4, 13, 100),
    cell(5, 13, 100),
    cell(6, 13, 300),
];

const CONGRATULATE_FRAMES: &[Frame] = &[
    cell(0, 14, 100),
    cell(1, 14, 100),
    cell(2, 14, 100),
    cell(3, 14, 100),
    cell(4, 14, 200),
    cell(5, 14, 200),
    cell(6, 14, 200),
    cell(7, 14, 100),
    cell(8, 14, 100),
    cell(9, 14, 500),
];

const ALERT_FRAMES: &[Frame] = &[
    cell(0, 15, 100),
    cell(1, 15, 100),
    cell(2, 15, 100),
    cell(3, 15, 400),
];

const WRITING_FRAMES: &[Frame] = &[
    cell(0, 16, 150),
    cell(1, 16, 150),
    cell(2, 16, 150),
    cell(3, 16, 150),
    cell(4, 16, 150),
    cell(5, 16, 150),
];

const THINKING_FRAMES: &[Frame] = &[
    cell(0, 17, 250),
    cell(1, 17, 250),
    cell(2, 17, 250),
    cell(3, 17, 250),
];

/// Build the imp catalog
pub fn imp_catalog() -> AnimationResult<AnimationCatalog> {
    AnimationCatalog::builder(IMP_SPRITE, IMP_SHEET)
        .frame_size(FRAME_WIDTH, FRAME_HEIGHT)
        .default_animation(REST_POSE)
        .animation(REST_POSE, REST_POSE_FRAMES, false)
        .animation(GREETING, GREETING_FRAMES, false)
        .animation(GOODBYE, GOODBYE_FRAMES, false)
        .animation(IDLE, IDLE_FRAMES, false)
        .animation(IDLE_SIDE_TO_SIDE, IDLE_SIDE_TO_SIDE_FRAMES, false)
        .animation(IDLE_FINGER_TAP, IDLE_FINGER_TAP_FRAMES, false)
        .animation(IDLE_HEAD_SCRATCH, IDLE_HEAD_SCRATCH_FRAMES, false)
        .animation(IDLE_EYEBROW_RAISE, IDLE_EYEBROW_RAISE_FRAMES, false)
        .animation(GET_TECHY, GET_TECHY_FRAMES, false)
        .animation(GET_ARTSY, GET_ARTSY_FRAMES, false)
        .animation(SEARCHING, SEARCHING_FRAMES, false)
        .animation(CHECKING_SOMETHING, CHECKING_SOMETHING_FRAMES, false)
        .animation(EXPLAIN, EXPLAIN_FRAMES, false)
        .animation(GET_ATTENTION, GET_ATTENTION_FRAMES, false)
        .animation(CONGRATULATE, CONGRATULATE_FRAMES, false)
        .animation(ALERT, ALERT_FRAMES, false)
        .animation(WRITING, WRITING_FRAMES, true)
        .animation(THINKING, THINKING_FRAMES, true)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_imp_catalog_builds() {
        let catalog = imp_catalog().unwrap();
        assert_eq!(catalog.sprite(), IMP_SPRITE);
        assert_eq!(catalog.default_animation(), REST_POSE);
        assert_eq!(catalog.len(), 18);
    }

    #[test]
    fn test_lifecycle_animations_present() {
        let catalog = imp_catalog().unwrap();
        for name in [REST_POSE, GREETING, GOODBYE]
            .iter()
            .chain(IDLE_VARIETY.iter())
            .chain(MISCHIEF.iter())
        {
            assert!(catalog.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_mischief_fits_inside_dormant_window() {
        // Mischief starts at 5s of inactivity and must be over before the
        // 15s departure check.
        let catalog = imp_catalog().unwrap();
        for name in MISCHIEF {
            assert!(catalog.get_duration(name) < Duration::from_secs(10));
        }
    }

    #[test]
    fn test_greeting_and_goodbye_durations() {
        let catalog = imp_catalog().unwrap();
        assert_eq!(catalog.get_duration(GREETING), Duration::from_millis(1500));
        assert_eq!(catalog.get_duration(GOODBYE), Duration::from_millis(1200));
    }
}
