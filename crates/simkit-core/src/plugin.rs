//! Decision plugins.
//!
//! External decision producers (ToM, affect or goal engines) hook into the
//! tick through [`SimPlugin`]. Plugins are consulted in registration order
//! and the first one returning a non-empty list decides the tick. They see
//! the world read-only and change it only through the actions they return.

use simkit_events::{ActionOffer, SimAction, SimTickRecord};

use crate::rng::SimRng;
use crate::world::World;

pub trait SimPlugin {
    fn name(&self) -> &str;

    /// Actions for this tick, or `None` to defer to the next plugin.
    /// An empty list also defers.
    fn decide_actions(
        &mut self,
        _world: &World,
        _offers: &[ActionOffer],
        _rng: &mut SimRng,
        _tick: u64,
    ) -> Option<Vec<SimAction>> {
        None
    }

    /// Called with every finished tick record.
    fn after_snapshot(&mut self, _record: &SimTickRecord) {}
}
