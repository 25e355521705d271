use glam::Vec3;

bitflags::bitflags! {
    /// Held movement buttons, sampled once per outer iteration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u16 {
        const FORWARD = 1 << 0;
        const BACK = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const JUMP = 1 << 4;
        const SNEAK = 1 << 5;
    }
}

/// One frame's worth of input: held buttons plus the current view angles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    pub buttons: Buttons,
    pub yaw: f32,
    pub pitch: f32,
}

impl InputSample {
    /// Requested movement direction in the horizontal plane, unit length or
    /// zero. Forward follows the yaw angle; opposing buttons cancel.
    pub fn wish_direction(&self) -> Vec3 {
        let forward = Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin());
        let right = Vec3::new(-forward.z, 0.0, forward.x);

        let mut wish = Vec3::ZERO;
        if self.buttons.contains(Buttons::FORWARD) {
            wish += forward;
        }
        if self.buttons.contains(Buttons::BACK) {
            wish -= forward;
        }
        if self.buttons.contains(Buttons::RIGHT) {
            wish += right;
        }
        if self.buttons.contains(Buttons::LEFT) {
            wish -= right;
        }
        wish.normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wish_direction_is_unit_or_zero() {
        let mut sample = InputSample::default();
        assert_eq!(sample.wish_direction(), Vec3::ZERO);

        sample.buttons = Buttons::FORWARD | Buttons::RIGHT;
        let wish = sample.wish_direction();
        assert!((wish.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposing_buttons_cancel() {
        let sample = InputSample {
            buttons: Buttons::FORWARD | Buttons::BACK,
            ..Default::default()
        };
        assert_eq!(sample.wish_direction(), Vec3::ZERO);
    }

    #[test]
    fn forward_follows_yaw() {
        let sample = InputSample {
            buttons: Buttons::FORWARD,
            yaw: 0.0,
            pitch: 0.0,
        };
        let wish = sample.wish_direction();
        assert!((wish.x - 1.0).abs() < 1e-6);
        assert!(wish.z.abs() < 1e-6);
    }
}
