use plaza_engine::Vec2;

pub(crate) const COUNTDOWN_START_SECONDS: f32 = 20.0;
pub(crate) const ZONE_CAPACITY: u32 = 20;

/// The ready area: standing inside it with anyone else starts the countdown.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PortalZone {
    pub(crate) origin: Vec2,
    pub(crate) size: Vec2,
    pub(crate) margin: f32,
    pub(crate) capacity: u32,
    occupants: u32,
    countdown_seconds: f32,
}

impl Default for PortalZone {
    fn default() -> Self {
        Self {
            origin: Vec2::new(100.0, 100.0),
            size: Vec2::new(150.0, 150.0),
            margin: 30.0,
            capacity: ZONE_CAPACITY,
            occupants: 0,
            countdown_seconds: COUNTDOWN_START_SECONDS,
        }
    }
}

impl PortalZone {
    pub(crate) fn occupants(&self) -> u32 {
        self.occupants
    }

    pub(crate) fn countdown_seconds(&self) -> f32 {
        self.countdown_seconds
    }

    /// Overlap between an entity box centered on `center` and the zone shrunk by its margin.
    pub(crate) fn contains(&self, center: Vec2, entity_size: Vec2) -> bool {
        let half = entity_size * 0.5;
        let min = self.origin + Vec2::new(self.margin, self.margin);
        let max = self.origin + self.size - Vec2::new(self.margin, self.margin);
        center.x + half.x > min.x
            && center.x - half.x < max.x
            && center.y + half.y > min.y
            && center.y - half.y < max.y
    }

    pub(crate) fn evaluate(
        &mut self,
        positions: impl IntoIterator<Item = Vec2>,
        entity_size: Vec2,
        dt_seconds: f32,
    ) {
        let occupants = positions
            .into_iter()
            .filter(|position| self.contains(*position, entity_size))
            .count();
        self.occupants = u32::try_from(occupants).unwrap_or(u32::MAX);
        if self.occupants > 0 {
            self.countdown_seconds = (self.countdown_seconds - dt_seconds).max(0.0);
        } else {
            self.countdown_seconds = COUNTDOWN_START_SECONDS;
        }
    }
}
