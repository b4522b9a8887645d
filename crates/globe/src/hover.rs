//! Coalesced timezone hover resolution.
//!
//! Pointer moves only stage a request. A newer move cancels and replaces the
//! pending one, and the tick resolves at most one request per frame.

use foundation::math::GeoPoint;
use tracing::debug;

use crate::timezone::{TimezonePolygon, hover_zone_at};

/// Identifies one staged hover request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HoverToken(u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HoverOutcome {
    /// The hovered zone changed. `None` means the pointer left every zone.
    Changed { zone: Option<usize> },
    /// Same zone as the last resolution; nothing to redraw.
    Unchanged,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct PendingHover {
    token: HoverToken,
    point: Option<GeoPoint>,
}

#[derive(Debug)]
pub struct HoverResolver {
    enabled: bool,
    next_token: u64,
    pending: Option<PendingHover>,
    /// `None` until the first resolution after enable.
    last_zone: Option<Option<usize>>,
}

impl Default for HoverResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HoverResolver {
    pub fn new() -> Self {
        Self {
            enabled: true,
            next_token: 0,
            pending: None,
            last_zone: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stages a lookup for the next tick, replacing any pending one.
    ///
    /// `point` is `None` when the pointer is off the globe. Returns `None`
    /// while disabled.
    pub fn stage(&mut self, point: Option<GeoPoint>) -> Option<HoverToken> {
        if !self.enabled {
            return None;
        }
        let token = HoverToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.pending = Some(PendingHover { token, point });
        Some(token)
    }

    pub fn is_pending(&self, token: HoverToken) -> bool {
        self.pending.is_some_and(|p| p.token == token)
    }

    /// Resolves the pending request, if any.
    pub fn resolve(&mut self, polygons: &[TimezonePolygon]) -> Option<HoverOutcome> {
        let pending = self.pending.take()?;
        let zone = pending
            .point
            .and_then(|p| hover_zone_at(polygons, p.lat_deg, p.lon_deg));
        if self.last_zone == Some(zone) {
            return Some(HoverOutcome::Unchanged);
        }
        self.last_zone = Some(zone);
        debug!(zone = ?zone.map(|i| polygons[i].id.as_str()), "hover zone changed");
        Some(HoverOutcome::Changed { zone })
    }

    /// Last resolved zone.
    pub fn current(&self) -> Option<usize> {
        self.last_zone.flatten()
    }

    /// Clears the memo and cancels the pending request.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.pending = None;
        self.last_zone = None;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Forget the memo, e.g. after new boundary data is loaded.
    pub fn invalidate(&mut self) {
        self.last_zone = None;
    }
}
