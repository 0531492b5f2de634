/// Autoplay policy applied by engines before starting playback

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoplayPolicy {
    /// Muted clips may start without a user gesture
    pub allow_muted: bool,
    /// Clips with sound may start without a user gesture
    pub allow_unmuted: bool,
}

impl AutoplayPolicy {
    /// Allow everything, as a page with prior user activation would
    pub fn permissive() -> Self {
        Self {
            allow_muted: true,
            allow_unmuted: true,
        }
    }

    /// Require a gesture for every start
    pub fn strict() -> Self {
        Self {
            allow_muted: false,
            allow_unmuted: false,
        }
    }

    pub fn permits(&self, muted: bool, user_gesture: bool) -> bool {
        if user_gesture {
            return true;
        }
        if muted {
            self.allow_muted
        } else {
            self.allow_unmuted
        }
    }
}

impl Default for AutoplayPolicy {
    fn default() -> Self {
        Self {
            allow_muted: true,
            allow_unmuted: false,
        }
    }
}
